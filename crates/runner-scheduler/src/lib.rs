pub mod algorithm;
pub mod config;
pub mod inbox;
pub mod repo;
pub mod runner_client;
pub mod scheduler;

use anyhow::Context;
use rtsp_core::bus::KafkaBus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use config::RunnerSchedulerConfig;
use runner_client::GrpcRunnerClient;

pub async fn run(config: RunnerSchedulerConfig) -> anyhow::Result<()> {
    let pool = rtsp_core::db::connect(&config.db)
        .await
        .context("connect to database")?;

    let bus: Arc<dyn rtsp_core::bus::MessageBus> =
        Arc::new(KafkaBus::new(&config.bus.kafka_brokers).context("build kafka bus")?);
    let runner_client: Arc<dyn runner_client::RunnerClient> = Arc::new(GrpcRunnerClient);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let inbox_handle = tokio::spawn(inbox::inbox_consumer_loop(
        pool.clone(),
        bus.clone(),
        config.clone(),
        shutdown_rx.clone(),
    ));
    let scheduler_handle = tokio::spawn(scheduler::scheduler_loop(
        pool.clone(),
        runner_client,
        config.clone(),
        shutdown_rx.clone(),
    ));

    info!(event = "runner_scheduler.started");

    tokio::signal::ctrl_c().await.context("wait for ctrl_c")?;
    info!(event = "runner_scheduler.shutdown_signal");

    let _ = shutdown_tx.send(true);
    // §5: teardown runs against a bounded total deadline, 10s for consumers.
    if tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(inbox_handle, scheduler_handle) },
    )
    .await
    .is_err()
    {
        warn!(event = "runner_scheduler.shutdown_deadline_exceeded");
    }

    Ok(())
}
