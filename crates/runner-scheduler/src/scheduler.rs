use rtsp_core::error::Result;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::algorithm::{fill_to_average, NodeLoad};
use crate::config::RunnerSchedulerConfig;
use crate::repo;
use crate::runner_client::RunnerClient;

/// Background loop implementing G: periodic scheduling tick.
pub async fn scheduler_loop(
    pool: PgPool,
    runner_client: Arc<dyn RunnerClient>,
    config: RunnerSchedulerConfig,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(Duration::from_millis(config.scheduler_tick_ms));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(err) = scheduler_tick_once(&pool, runner_client.as_ref(), &config).await {
                    warn!(event = "runner_scheduler.tick_failed", error = %err);
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!(event = "runner_scheduler.stopped");
                    return;
                }
            }
        }
    }
}

pub async fn scheduler_tick_once(
    pool: &PgPool,
    runner_client: &dyn RunnerClient,
    config: &RunnerSchedulerConfig,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let workers = repo::select_pending_workers(&mut tx, config.worker_batch_size).await?;
    if workers.is_empty() {
        tx.commit().await?;
        return Ok(());
    }

    let node_rows = repo::select_node_loads(&mut tx, config.worker_batch_size).await?;
    if node_rows.is_empty() {
        // Boundary: empty nodes -> no-op, rolls back cleanly (nothing was
        // mutated yet).
        tx.rollback().await?;
        return Ok(());
    }

    let node_loads: Vec<NodeLoad> = node_rows
        .iter()
        .enumerate()
        .map(|(i, row)| row.to_algorithm_load(i))
        .collect();

    let plan = fill_to_average(&node_loads, config.worker_batch_size);

    // Walk the plan in node order, consuming pending workers in the order
    // step 1 produced them (created_at ASC).
    let mut worker_iter = workers.iter();
    let mut assigned = 0usize;

    for (node_row, add) in node_rows.iter().zip(plan.iter()) {
        for _ in 0..*add {
            let Some(worker) = worker_iter.next() else {
                break;
            };

            runner_client
                .start_worker(&node_row.addr, worker.camera_id, &worker.url)
                .await?;
            repo::assign_worker(&mut tx, node_row.node_id, worker.id).await?;
            assigned += 1;
        }
    }

    tx.commit().await?;
    info!(
        event = "runner_scheduler.tick_assigned",
        assigned,
        pending = workers.len()
    );
    Ok(())
}
