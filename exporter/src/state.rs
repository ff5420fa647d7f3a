//! Shared application state.

use std::sync::Arc;

use watcher::{ChainGateway, MetricsRegistry, Watcher};

/// Answers the readiness probe.
pub trait SyncProbe: Send + Sync {
    fn is_synced(&self) -> bool;
}

impl<G: ChainGateway> SyncProbe for Watcher<G> {
    fn is_synced(&self) -> bool {
        Watcher::is_synced(self)
    }
}

/// Shared state held by the HTTP handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Registry the watcher publishes into; encoded on every scrape.
    pub metrics: Arc<MetricsRegistry>,
    /// Sync state of the watched node.
    pub probe: Arc<dyn SyncProbe>,
}

impl AppState {
    pub fn new(metrics: Arc<MetricsRegistry>, probe: Arc<dyn SyncProbe>) -> Self {
        Self { metrics, probe }
    }
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
