use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::repo;

pub struct AppState {
    pub pool: PgPool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/scenario/init", post(init_scenario))
        .route("/api/v1/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct InitScenarioRequest {
    camera_id: i32,
    url: String,
}

#[derive(Debug, Serialize)]
struct InitScenarioResponse {
    scenario_uuid: Uuid,
    status: &'static str,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
            ApiError::Internal(err) => {
                error!(event = "scenario_api.internal_error", error = %err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "internal error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

async fn init_scenario(
    State(state): State<Arc<AppState>>,
    body: Result<Json<InitScenarioRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|err| ApiError::Validation(err.to_string()))?;

    if req.camera_id <= 0 {
        return Err(ApiError::Validation(
            "camera_id must be positive".to_string(),
        ));
    }

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;

    let (scenario_uuid, _outbox_uuid) = repo::insert_scenario_and_outbox(&mut tx, req.camera_id, &req.url)
        .await
        .map_err(|err| ApiError::Internal(anyhow::anyhow!(err)))?;

    tx.commit().await.map_err(|err| ApiError::Internal(err.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(InitScenarioResponse {
            scenario_uuid,
            status: "init_startup",
        }),
    ))
}
