pub mod config;
pub mod http;
pub mod outbox;
pub mod repo;

use anyhow::Context;
use rtsp_core::bus::KafkaBus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use config::ScenarioApiConfig;
use http::AppState;

pub async fn run(config: ScenarioApiConfig) -> anyhow::Result<()> {
    let pool = rtsp_core::db::connect(&config.db)
        .await
        .context("connect to database")?;

    let bus: Arc<dyn rtsp_core::bus::MessageBus> =
        Arc::new(KafkaBus::new(&config.bus.kafka_brokers).context("build kafka bus")?);

    let state = Arc::new(AppState { pool: pool.clone() });
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.api_port))
        .await
        .with_context(|| format!("bind api port {}", config.api_port))?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let outbox_handle = {
        let pool = pool.clone();
        let bus = bus.clone();
        let config = config.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            outbox::outbox_drain_loop(pool, bus, config, shutdown_rx).await;
        })
    };

    info!(event = "scenario_api.listening", port = config.api_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!(event = "scenario_api.shutdown_signal");
        })
        .await
        .context("serve http")?;

    let _ = shutdown_tx.send(true);
    // §5: teardown runs against a bounded total deadline, 30s for the API.
    if tokio::time::timeout(Duration::from_secs(30), outbox_handle)
        .await
        .is_err()
    {
        warn!(event = "scenario_api.shutdown_deadline_exceeded");
    }

    Ok(())
}
