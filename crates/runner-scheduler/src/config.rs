use clap::Parser;
use rtsp_core::config::{BusConfig, DbConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "runner-scheduler")]
pub struct RunnerSchedulerConfig {
    #[command(flatten)]
    pub db: DbConfig,

    #[command(flatten)]
    pub bus: BusConfig,

    /// `WorkerBatchSize` in spec §4.G, default 10.
    #[arg(long, env = "SCHEDULER_WORKER_BATCH_SIZE", default_value_t = 10)]
    pub worker_batch_size: i64,

    /// Scheduler tick interval, in milliseconds (default 1s per spec §4.G).
    #[arg(long, env = "SCHEDULER_TICK_MS", default_value_t = 1_000)]
    pub scheduler_tick_ms: u64,
}

impl RunnerSchedulerConfig {
    pub fn from_env() -> Self {
        Self::parse()
    }
}
