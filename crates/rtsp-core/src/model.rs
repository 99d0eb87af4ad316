use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioStatus {
    InitStartup,
    InStartupProcessing,
    Active,
    InitShutdown,
    InShutdownProcessing,
    Inactive,
}

impl ScenarioStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::InitStartup => "init_startup",
            ScenarioStatus::InStartupProcessing => "in_startup_processing",
            ScenarioStatus::Active => "active",
            ScenarioStatus::InitShutdown => "init_shutdown",
            ScenarioStatus::InShutdownProcessing => "in_shutdown_processing",
            ScenarioStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Scenario {
    pub scenario_uuid: Uuid,
    pub camera_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxState {
    Pending,
    Sent,
    Failed,
}

impl OutboxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxState::Pending => "pending",
            OutboxState::Sent => "sent",
            OutboxState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxScenario {
    pub outbox_uuid: Uuid,
    pub scenario_uuid: Uuid,
    pub payload: serde_json::Value,
    pub state: String,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire payload carried by an outbox row and published verbatim to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub scenario_uuid: Uuid,
    pub camera_id: i32,
    pub url: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InboxStartScenario {
    pub outbox_uuid: Uuid,
    pub scenario_uuid: Uuid,
    pub camera_id: i32,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    Pending,
    Running,
    Stopped,
    Failed,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Pending => "pending",
            WorkerStatus::Running => "running",
            WorkerStatus::Stopped => "stopped",
            WorkerStatus::Failed => "failed",
        }
    }
}

/// The spec's data model (§3) does not list a `url` column on `worker`,
/// but G must hand a stream URL to `RunnerRPC.StartWorker`; the component
/// that creates worker rows from an absorbed inbox row (out of scope here)
/// is expected to copy it forward from `inbox_start_scenario.url`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Worker {
    pub id: i64,
    pub camera_id: i32,
    pub scenario_uuid: Uuid,
    pub url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Node {
    pub node_id: i64,
    pub addr: String,
}

/// A node annotated with its current worker count, as returned by the
/// scheduler's node-load query.
#[derive(Debug, Clone)]
pub struct NodeLoad {
    pub node_id: i64,
    pub addr: String,
    pub worker_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NodeWorker {
    pub node_id: i64,
    pub worker_id: i64,
    pub assigned_at: DateTime<Utc>,
}
