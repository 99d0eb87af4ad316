use rtsp_core::bus::MessageBus;
use rtsp_core::error::Result;
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RunnerSchedulerConfig;
use crate::repo;

#[derive(Debug, Deserialize)]
struct ScenarioEventBody {
    camera_id: i32,
    scenario_uuid: Uuid,
    url: String,
}

/// Background loop implementing F: InboxConsumer.
pub async fn inbox_consumer_loop(
    pool: PgPool,
    bus: Arc<dyn MessageBus>,
    config: RunnerSchedulerConfig,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            info!(event = "runner_scheduler.inbox_stopped");
            return;
        }

        tokio::select! {
            result = bus.poll(&config.bus.kafka_outbox_topic, &config.bus.kafka_consumer_group, Duration::from_millis(500)) => {
                match result {
                    Ok(Some(message)) => {
                        if let Err(err) = handle_message(&pool, bus.as_ref(), &config, message).await {
                            warn!(event = "runner_scheduler.inbox_handle_failed", error = %err);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(event = "runner_scheduler.inbox_poll_failed", error = %err);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }
            }
            _ = shutdown.changed() => {}
        }
    }
}

pub async fn handle_message(
    pool: &PgPool,
    bus: &dyn MessageBus,
    config: &RunnerSchedulerConfig,
    message: rtsp_core::bus::BusMessage,
) -> Result<()> {
    let topic = &config.bus.kafka_outbox_topic;
    let group = &config.bus.kafka_consumer_group;

    // Step 3: missing `outbox_uuid` header -> commit and skip. We cannot
    // reprocess what we cannot identify.
    let Some(outbox_uuid_str) = message.headers.get("outbox_uuid") else {
        warn!(event = "runner_scheduler.inbox_missing_header");
        bus.commit(topic, group).await?;
        return Ok(());
    };

    let Ok(outbox_uuid) = Uuid::parse_str(outbox_uuid_str) else {
        warn!(event = "runner_scheduler.inbox_bad_header", raw = %outbox_uuid_str);
        bus.commit(topic, group).await?;
        return Ok(());
    };

    // Step 2: parse failure -> log, commit, skip poison; never block the
    // partition.
    let body: ScenarioEventBody = match serde_json::from_slice(&message.value) {
        Ok(body) => body,
        Err(err) => {
            warn!(event = "runner_scheduler.inbox_poison_message", error = %err);
            bus.commit(topic, group).await?;
            return Ok(());
        }
    };

    let mut conn = pool.acquire().await?;
    // Step 5: duplicate insert is success (already absorbed); step 6: any
    // other DB error propagates without committing the offset.
    repo::insert_inbox_row(
        &mut conn,
        outbox_uuid,
        body.scenario_uuid,
        body.camera_id,
        &body.url,
    )
    .await?;

    bus.commit(topic, group).await?;
    Ok(())
}
