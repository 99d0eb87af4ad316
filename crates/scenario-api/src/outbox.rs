use rtsp_core::bus::{MessageBus, OutboundMessage};
use rtsp_core::error::Result;
use rtsp_core::model::OutboxScenario;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ScenarioApiConfig;
use crate::repo;

/// Background loop implementing the claim -> publish -> finalize protocol.
/// Runs until `shutdown` fires.
pub async fn outbox_drain_loop(
    pool: PgPool,
    bus: Arc<dyn MessageBus>,
    config: ScenarioApiConfig,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(Duration::from_millis(config.outbox_poll_ms));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(err) = drain_outbox_once(&pool, bus.as_ref(), &config).await {
                    error!(event = "scenario_api.outbox_drain_failed", error = %err);
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!(event = "scenario_api.outbox_drain_stopped");
                    return;
                }
            }
        }
    }
}

async fn drain_outbox_once(
    pool: &PgPool,
    bus: &dyn MessageBus,
    config: &ScenarioApiConfig,
) -> Result<()> {
    let claimed = claim_and_publish(pool, bus, config).await?;
    if claimed.is_empty() {
        return Ok(());
    }
    finalize(pool, &claimed).await?;
    info!(
        event = "scenario_api.outbox_drained",
        batch_size = claimed.len()
    );
    Ok(())
}

/// T1 + bus write. Exposed separately from `finalize` so tests can exercise
/// the "process dies before T2" redelivery scenario (S2).
pub async fn claim_and_publish(
    pool: &PgPool,
    bus: &dyn MessageBus,
    config: &ScenarioApiConfig,
) -> Result<Vec<OutboxScenario>> {
    let mut claim_tx = pool.begin().await?;
    let claimed = repo::claim_outbox_batch(
        &mut claim_tx,
        config.outbox_batch_size,
        config.outbox_lease_secs,
    )
    .await?;
    claim_tx.commit().await?;

    if claimed.is_empty() {
        return Ok(claimed);
    }

    // Bus write: on any error, do not advance state — the lease expires and
    // the batch becomes eligible again on a later tick.
    let messages = claimed
        .iter()
        .map(|row| {
            let mut headers = HashMap::new();
            headers.insert("outbox_uuid".to_string(), row.outbox_uuid.to_string());
            OutboundMessage {
                topic: "outbox_scenario".to_string(),
                key: None,
                value: serde_json::to_vec(&row.payload).expect("payload is already valid JSON"),
                headers,
            }
        })
        .collect();

    if let Err(err) = bus.publish_batch(messages).await {
        warn!(
            event = "scenario_api.outbox_publish_failed",
            error = %err,
            batch_size = claimed.len(),
            "bus write failed; claimed rows remain locked until lease expiry"
        );
        return Err(err);
    }

    Ok(claimed)
}

/// T2: mark claimed rows sent and advance their scenarios.
pub async fn finalize(pool: &PgPool, claimed: &[OutboxScenario]) -> Result<()> {
    let outbox_uuids: Vec<Uuid> = claimed.iter().map(|row| row.outbox_uuid).collect();
    let scenario_uuids: Vec<Uuid> = claimed.iter().map(|row| row.scenario_uuid).collect();

    let mut finalize_tx = pool.begin().await?;
    repo::finalize_outbox_batch(&mut finalize_tx, &outbox_uuids, &scenario_uuids).await?;
    finalize_tx.commit().await?;
    Ok(())
}
