use rtsp_core::error::{Error, Result};
use rtsp_core::model::Worker;
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::algorithm::NodeLoad;

/// F: idempotent inbox insert. A unique-violation on `outbox_uuid` is
/// classified by `From<sqlx::Error>` as `Error::DuplicateKey` and treated by
/// the caller as absorbed-already success.
pub async fn insert_inbox_row(
    conn: &mut PgConnection,
    outbox_uuid: Uuid,
    scenario_uuid: Uuid,
    camera_id: i32,
    url: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO inbox_start_scenario (outbox_uuid, scenario_uuid, camera_id, url)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(outbox_uuid)
    .bind(scenario_uuid)
    .bind(camera_id)
    .bind(url)
    .execute(conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) => match Error::from(err) {
            Error::DuplicateKey => Ok(()),
            other => Err(other),
        },
    }
}

pub async fn select_pending_workers(
    tx: &mut Transaction<'_, Postgres>,
    batch_size: i64,
) -> Result<Vec<Worker>> {
    let workers = sqlx::query_as::<_, Worker>(
        r#"
        SELECT id, camera_id, scenario_uuid, url, status, created_at, updated_at
        FROM worker
        WHERE status = 'pending'
        ORDER BY created_at ASC
        LIMIT $1
        "#,
    )
    .bind(batch_size)
    .fetch_all(&mut **tx)
    .await?;

    Ok(workers)
}

pub async fn select_node_loads(
    tx: &mut Transaction<'_, Postgres>,
    limit: i64,
) -> Result<Vec<NodeLoadRow>> {
    let rows = sqlx::query_as::<_, NodeLoadRow>(
        r#"
        SELECT n.node_id AS node_id, n.addr AS addr, count(nw.worker_id) AS worker_count
        FROM node n
        LEFT JOIN node_worker nw ON nw.node_id = n.node_id
        GROUP BY n.node_id, n.addr
        ORDER BY worker_count ASC, n.node_id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NodeLoadRow {
    pub node_id: i64,
    pub addr: String,
    pub worker_count: i64,
}

impl NodeLoadRow {
    pub fn to_algorithm_load(&self, node_index: usize) -> NodeLoad {
        NodeLoad {
            node_index,
            worker_count: self.worker_count,
        }
    }
}

pub async fn assign_worker(
    tx: &mut Transaction<'_, Postgres>,
    node_id: i64,
    worker_id: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO node_worker (node_id, worker_id, assigned_at)
        VALUES ($1, $2, now())
        "#,
    )
    .bind(node_id)
    .bind(worker_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE worker SET status = 'running', updated_at = now() WHERE id = $1
        "#,
    )
    .bind(worker_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
