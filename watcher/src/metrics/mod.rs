//! Metrics exported by the watcher.
//!
//! This module defines the Prometheus gauges the watcher republishes the
//! chain state into, and the registry handle shared with the scrape
//! endpoint.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use watcher::metrics::MetricsRegistry;
//!
//! let registry = Arc::new(MetricsRegistry::new("near_validator_watcher")?);
//!
//! // Once per refresh cycle:
//! registry.watcher.publish(&observations);
//!
//! // On scrape:
//! let body = registry.gather_text();
//! ```

pub mod prometheus;

pub use self::prometheus::{MetricsRegistry, WatcherMetrics};
