use clap::Parser;
use rtsp_core::config::{BusConfig, DbConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "scenario-api")]
pub struct ScenarioApiConfig {
    #[command(flatten)]
    pub db: DbConfig,

    #[command(flatten)]
    pub bus: BusConfig,

    #[arg(long, env = "API_PORT", default_value_t = 3000)]
    pub api_port: u16,

    /// Outbox drain tick interval, in milliseconds.
    #[arg(long, env = "OUTBOX_POLL_MS", default_value_t = 3_000)]
    pub outbox_poll_ms: u64,

    /// Max outbox rows claimed per tick (`B` in the fill-to-average spec).
    #[arg(long, env = "OUTBOX_BATCH_SIZE", default_value_t = 35)]
    pub outbox_batch_size: i64,

    /// How long a claimed-but-unpublished row stays locked before another
    /// publisher instance may reclaim it.
    #[arg(long, env = "OUTBOX_LEASE_SECS", default_value_t = 60)]
    pub outbox_lease_secs: i64,
}

impl ScenarioApiConfig {
    pub fn from_env() -> Self {
        Self::parse()
    }
}
