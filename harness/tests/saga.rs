//! Integration tests covering spec scenarios S1/S2/S6 and invariants 1, 2,
//! 4, 6, plus the idempotence laws, against a real Postgres instance and
//! the in-process `FakeBus`.

use async_trait::async_trait;
use rtsp_core::error::Result as CoreResult;
use runner_scheduler::runner_client::RunnerClient;
use runner_scheduler::scheduler::scheduler_tick_once;
use runner_scheduler::{inbox, repo as scheduler_repo};
use rtsp_harness::fake_bus::FakeBus;
use rtsp_harness::test_pool;
use scenario_api::config::ScenarioApiConfig;
use scenario_api::outbox::{claim_and_publish, finalize};
use scenario_api::repo as api_repo;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

fn test_config() -> ScenarioApiConfig {
    use clap::Parser;
    ScenarioApiConfig::parse_from(["scenario-api"])
}

fn scheduler_config() -> runner_scheduler::config::RunnerSchedulerConfig {
    use clap::Parser;
    runner_scheduler::config::RunnerSchedulerConfig::parse_from(["runner-scheduler"])
}

/// Always-succeeds stand-in for a live RunnerRPC node; records every
/// `(camera_id, addr)` pair it was asked to start.
struct AlwaysSucceedsRunner {
    calls: std::sync::Mutex<Vec<(String, i32)>>,
}

impl AlwaysSucceedsRunner {
    fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RunnerClient for AlwaysSucceedsRunner {
    async fn start_worker(&self, addr: &str, camera_id: i32, _url: &str) -> CoreResult<()> {
        self.calls.lock().unwrap().push((addr.to_string(), camera_id));
        Ok(())
    }
}

async fn insert_node(pool: &PgPool, addr: &str) -> i64 {
    let row: (i64,) = sqlx::query_as("INSERT INTO node (addr) VALUES ($1) RETURNING node_id")
        .bind(addr)
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

/// S1 — happy path: InitScenario, one publisher tick, one consumer tick.
#[tokio::test]
async fn s1_happy_path_init_to_inbox() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let bus = Arc::new(FakeBus::new());
    let api_config = test_config();

    let mut tx = pool.begin().await?;
    let (scenario_uuid, outbox_uuid) =
        api_repo::insert_scenario_and_outbox(&mut tx, 42, "rtsp://h/s").await?;
    tx.commit().await?;

    let claimed = claim_and_publish(&pool, bus.as_ref(), &api_config).await?;
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].outbox_uuid, outbox_uuid);
    assert_eq!(bus.message_count("outbox_scenario"), 1);

    finalize(&pool, &claimed).await?;

    let status: (String,) = sqlx::query_as("SELECT status FROM scenario WHERE scenario_uuid = $1")
        .bind(scenario_uuid)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status.0, "in_startup_processing");

    let sched_config = scheduler_config();
    let message = bus
        .poll(
            &sched_config.bus.kafka_outbox_topic,
            &sched_config.bus.kafka_consumer_group,
            std::time::Duration::from_millis(10),
        )
        .await?
        .expect("one message published");

    inbox::handle_message(&pool, bus.as_ref(), &sched_config, message).await?;

    let inbox_row: (Uuid, i32) =
        sqlx::query_as("SELECT outbox_uuid, camera_id FROM inbox_start_scenario WHERE outbox_uuid = $1")
            .bind(outbox_uuid)
            .fetch_one(&pool)
            .await?;
    assert_eq!(inbox_row.0, outbox_uuid);
    assert_eq!(inbox_row.1, 42);

    Ok(())
}

/// S2 — redelivery: the publisher dies between bus write and T2. The lease
/// is forced to expire early (standing in for real wall-clock passage), the
/// row is reclaimed, and the bus receives a second copy. The inbox's
/// second insert must dedup via the unique-violation sentinel.
#[tokio::test]
async fn s2_redelivery_dedups_in_inbox() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let bus = Arc::new(FakeBus::new());
    let api_config = test_config();
    let sched_config = scheduler_config();

    let mut tx = pool.begin().await?;
    let (_scenario_uuid, outbox_uuid) =
        api_repo::insert_scenario_and_outbox(&mut tx, 7, "rtsp://h/s2").await?;
    tx.commit().await?;

    // First attempt: claim + publish, but "crash" before T2.
    let claimed = claim_and_publish(&pool, bus.as_ref(), &api_config).await?;
    assert_eq!(claimed.len(), 1);

    // Force the lease to look expired.
    sqlx::query("UPDATE outbox_scenario SET locked_until = now() - interval '1 second' WHERE outbox_uuid = $1")
        .bind(outbox_uuid)
        .execute(&pool)
        .await?;

    // Second publisher start reclaims the same row and republishes it.
    let reclaimed = claim_and_publish(&pool, bus.as_ref(), &api_config).await?;
    assert_eq!(reclaimed.len(), 1);
    assert_eq!(reclaimed[0].outbox_uuid, outbox_uuid);
    assert_eq!(bus.message_count("outbox_scenario"), 2);
    finalize(&pool, &reclaimed).await?;

    // Consumer absorbs both copies; only one inbox row survives.
    for _ in 0..2 {
        let message = bus
            .poll(
                &sched_config.bus.kafka_outbox_topic,
                &sched_config.bus.kafka_consumer_group,
                std::time::Duration::from_millis(10),
            )
            .await?
            .expect("message available");
        inbox::handle_message(&pool, bus.as_ref(), &sched_config, message).await?;
    }

    let count: (i64,) =
        sqlx::query_as("SELECT count(*) FROM inbox_start_scenario WHERE outbox_uuid = $1")
            .bind(outbox_uuid)
            .fetch_one(&pool)
            .await?;
    assert_eq!(count.0, 1);

    Ok(())
}

/// S6 — poison message: unparseable payload is logged, offset committed,
/// and the inbox is left unchanged.
#[tokio::test]
async fn s6_poison_message_is_skipped() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let bus = Arc::new(FakeBus::new());
    let sched_config = scheduler_config();

    bus.publish_batch(vec![rtsp_core::bus::OutboundMessage {
        topic: sched_config.bus.kafka_outbox_topic.clone(),
        key: None,
        value: b"not-json".to_vec(),
        headers: [("outbox_uuid".to_string(), Uuid::new_v4().to_string())]
            .into_iter()
            .collect(),
    }])
    .await?;

    let before: (i64,) = sqlx::query_as("SELECT count(*) FROM inbox_start_scenario")
        .fetch_one(&pool)
        .await?;

    let message = bus
        .poll(
            &sched_config.bus.kafka_outbox_topic,
            &sched_config.bus.kafka_consumer_group,
            std::time::Duration::from_millis(10),
        )
        .await?
        .expect("poison message queued");
    inbox::handle_message(&pool, bus.as_ref(), &sched_config, message).await?;

    let after: (i64,) = sqlx::query_as("SELECT count(*) FROM inbox_start_scenario")
        .fetch_one(&pool)
        .await?;
    assert_eq!(before.0, after.0);

    Ok(())
}

/// S3 — even distribution across three freshly-registered nodes.
#[tokio::test]
async fn s3_even_distribution_assigns_all_workers() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let runner = Arc::new(AlwaysSucceedsRunner::new());
    let mut config = scheduler_config();
    config.worker_batch_size = 6;

    let suffix = Uuid::new_v4();
    let n1 = insert_node(&pool, &format!("n1-{suffix}:50052")).await;
    let n2 = insert_node(&pool, &format!("n2-{suffix}:50052")).await;
    let n3 = insert_node(&pool, &format!("n3-{suffix}:50052")).await;

    let scenario_uuid = Uuid::new_v4();
    sqlx::query("INSERT INTO scenario (scenario_uuid, camera_id, status) VALUES ($1, $2, 'init_startup')")
        .bind(scenario_uuid)
        .bind(1)
        .execute(&pool)
        .await?;
    for _ in 0..6 {
        sqlx::query(
            "INSERT INTO worker (camera_id, scenario_uuid, url, status) VALUES ($1, $2, $3, 'pending')",
        )
        .bind(1)
        .bind(scenario_uuid)
        .bind("rtsp://h/s")
        .execute(&pool)
        .await?;
    }

    scheduler_tick_once(&pool, runner.as_ref(), &config).await?;

    let running: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM worker WHERE scenario_uuid = $1 AND status = 'running'",
    )
    .bind(scenario_uuid)
    .fetch_one(&pool)
    .await?;
    assert_eq!(running.0, 6);
    assert_eq!(runner.call_count(), 6);

    for node_id in [n1, n2, n3] {
        let count: (i64,) = sqlx::query_as("SELECT count(*) FROM node_worker WHERE node_id = $1")
            .bind(node_id)
            .fetch_one(&pool)
            .await?;
        assert_eq!(count.0, 2);
    }

    // Running the scheduler again on the same snapshot (no new pending
    // workers) must perform no new assignments.
    let calls_before = runner.call_count();
    scheduler_tick_once(&pool, runner.as_ref(), &config).await?;
    assert_eq!(runner.call_count(), calls_before);

    Ok(())
}

/// Invariant 5 boundary: an empty `nodes` table makes the scheduler a
/// strict no-op, it must not panic or touch `worker` rows.
#[tokio::test]
async fn empty_nodes_is_a_noop() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let runner = Arc::new(AlwaysSucceedsRunner::new());
    let config = scheduler_config();

    let scenario_uuid = Uuid::new_v4();
    sqlx::query("INSERT INTO scenario (scenario_uuid, camera_id, status) VALUES ($1, $2, 'init_startup')")
        .bind(scenario_uuid)
        .bind(1)
        .execute(&pool)
        .await?;
    sqlx::query(
        "INSERT INTO worker (camera_id, scenario_uuid, url, status) VALUES ($1, $2, $3, 'pending')",
    )
    .bind(1)
    .bind(scenario_uuid)
    .bind("rtsp://h/s")
    .execute(&pool)
    .await?;

    scheduler_tick_once(&pool, runner.as_ref(), &config).await?;

    assert_eq!(runner.call_count(), 0);
    let still_pending: (i64,) =
        sqlx::query_as("SELECT count(*) FROM worker WHERE status = 'pending'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(still_pending.0, 1);

    Ok(())
}

/// Invariant 1: redelivering the same inbox insert through the repository
/// helper directly never produces a second row.
#[tokio::test]
async fn inbox_insert_is_idempotent_under_direct_redelivery() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let mut conn = pool.acquire().await?;
    let outbox_uuid = Uuid::new_v4();
    let scenario_uuid = Uuid::new_v4();

    scheduler_repo::insert_inbox_row(&mut conn, outbox_uuid, scenario_uuid, 99, "rtsp://h/x")
        .await?;
    scheduler_repo::insert_inbox_row(&mut conn, outbox_uuid, scenario_uuid, 99, "rtsp://h/x")
        .await?;

    let count: (i64,) =
        sqlx::query_as("SELECT count(*) FROM inbox_start_scenario WHERE outbox_uuid = $1")
            .bind(outbox_uuid)
            .fetch_one(&pool)
            .await?;
    assert_eq!(count.0, 1);

    Ok(())
}
