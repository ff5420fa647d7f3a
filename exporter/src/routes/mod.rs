//! HTTP routes: metrics scrape endpoint and Kubernetes-style probes.

pub mod health;
pub mod metrics;

use axum::{Router, routing::get};

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::metrics))
        .route("/live", get(health::live))
        .route("/ready", get(health::ready))
        .with_state(state)
}
