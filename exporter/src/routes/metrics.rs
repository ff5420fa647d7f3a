use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::state::SharedState;

/// Prometheus text exposition format.
const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// `GET /metrics`
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        state.metrics.gather_text(),
    )
}
