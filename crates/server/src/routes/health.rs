use axum::{extract::State, http::StatusCode};
use log::warn;

use crate::AppState;

/// Liveness probe; succeeds whenever the process is serving requests
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is running")
    ),
    tag = "Health"
)]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe; requires a reachable database holding at least one interaction
#[utoipa::path(
    get,
    path = "/readiness",
    responses(
        (status = 200, description = "Database reachable and populated"),
        (status = 503, description = "Database unreachable or empty")
    ),
    tag = "Health"
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.interactions.health_probe().await {
        StatusCode::OK
    } else {
        warn!("[readiness] Interaction store unavailable or empty");
        StatusCode::SERVICE_UNAVAILABLE
    }
}
