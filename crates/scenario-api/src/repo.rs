use rtsp_core::error::Result;
use rtsp_core::model::{OutboxScenario, ScenarioEvent};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Inserts a `scenario` row and its paired `outbox_scenario` row within the
/// caller's transaction. Both rows commit together or not at all.
pub async fn insert_scenario_and_outbox(
    tx: &mut Transaction<'_, Postgres>,
    camera_id: i32,
    url: &str,
) -> Result<(Uuid, Uuid)> {
    let scenario_uuid = Uuid::now_v7();
    let outbox_uuid = Uuid::now_v7();

    sqlx::query(
        r#"
        INSERT INTO scenario (scenario_uuid, camera_id, status)
        VALUES ($1, $2, 'init_startup')
        "#,
    )
    .bind(scenario_uuid)
    .bind(camera_id)
    .execute(&mut **tx)
    .await?;

    let payload = serde_json::to_value(ScenarioEvent {
        scenario_uuid,
        camera_id,
        url: url.to_string(),
    })
    .expect("ScenarioEvent always serializes");

    sqlx::query(
        r#"
        INSERT INTO outbox_scenario (outbox_uuid, scenario_uuid, payload, state, locked_until)
        VALUES ($1, $2, $3, 'pending', NULL)
        "#,
    )
    .bind(outbox_uuid)
    .bind(scenario_uuid)
    .bind(payload)
    .execute(&mut **tx)
    .await?;

    Ok((scenario_uuid, outbox_uuid))
}

/// T1: claim up to `batch_size` eligible outbox rows under
/// `FOR UPDATE SKIP LOCKED` and extend their lease.
pub async fn claim_outbox_batch(
    tx: &mut Transaction<'_, Postgres>,
    batch_size: i64,
    lease_secs: i64,
) -> Result<Vec<OutboxScenario>> {
    let mut rows: Vec<OutboxScenario> = sqlx::query_as(
        r#"
        WITH claimed AS (
            SELECT outbox_uuid
            FROM outbox_scenario
            WHERE state = 'pending'
              AND (locked_until IS NULL OR locked_until < now())
            ORDER BY created_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE outbox_scenario AS o
        SET locked_until = now() + ($2 || ' seconds')::interval,
            updated_at = now()
        FROM claimed
        WHERE o.outbox_uuid = claimed.outbox_uuid
        RETURNING o.outbox_uuid, o.scenario_uuid, o.payload, o.state, o.locked_until,
                  o.created_at, o.updated_at
        "#,
    )
    .bind(batch_size)
    .bind(lease_secs.to_string())
    .fetch_all(&mut **tx)
    .await?;

    // Postgres's `UPDATE ... FROM ... RETURNING` has no `ORDER BY` clause, so
    // the CTE's claim order is not provably carried into the result set.
    // Re-sort explicitly: spec §4.E requires publish order within a tick to
    // follow claim order (by created_at).
    rows.sort_by_key(|row| row.created_at);

    Ok(rows)
}

/// T2: mark the claimed rows `sent` and advance their scenarios past
/// `init_startup`.
pub async fn finalize_outbox_batch(
    tx: &mut Transaction<'_, Postgres>,
    outbox_uuids: &[Uuid],
    scenario_uuids: &[Uuid],
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE outbox_scenario
        SET state = 'sent', locked_until = NULL, updated_at = now()
        WHERE outbox_uuid = ANY($1)
        "#,
    )
    .bind(outbox_uuids)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE scenario
        SET status = 'in_startup_processing', updated_at = now()
        WHERE scenario_uuid = ANY($1) AND status = 'init_startup'
        "#,
    )
    .bind(scenario_uuids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
