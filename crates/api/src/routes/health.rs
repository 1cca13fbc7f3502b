use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Entity types the restoration registry can handle.
    pub restorable_entity_types: Vec<String>,
}

/// GET /health -- service, database and registry health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = history_db::health_check(&state.pool).await.is_ok();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        restorable_entity_types: state
            .dispatcher
            .entity_types()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
