//! Liveness endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use splitter_db::migrations::migration_status;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub active_flows: usize,
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (total, applied) = migration_status(state.db.pool()).await.unwrap_or((0, 0));

    let status = if database {
        StatusCode::OK
    } else {
        warn!("Health check failed: database unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
            migrations_applied: applied,
            migrations_total: total,
            active_flows: state.sessions.len(),
        }),
    )
}
