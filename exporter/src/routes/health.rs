use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::state::SharedState;

/// Probe response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /live`
///
/// The process is up and serving HTTP.
pub async fn live() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /ready`
///
/// Ready once the latest successful refresh saw a node that is not syncing.
pub async fn ready(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    if state.probe.is_synced() {
        (StatusCode::OK, Json(HealthResponse { status: "ok" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "syncing" }),
        )
    }
}
