//! NEAR validator watcher library crate.
//!
//! This crate observes the live state of a NEAR validator network through
//! a node's JSON-RPC interface and republishes it as Prometheus gauges:
//!
//! - strongly-typed decoded RPC views (`types`),
//! - the JSON-RPC gateway and its HTTP client (`rpc`),
//! - a bounded, cancellable retry policy (`retry`),
//! - concurrent snapshot collection (`collector`),
//! - pure metric derivation: ranking, seat price, uptime (`derive`),
//! - the Prometheus gauge set (`metrics`),
//! - the per-cycle status line (`render`),
//! - the refresh scheduler (`watcher`),
//! - and the library configuration (`config`).
//!
//! The `exporter` binary composes these pieces with an HTTP server exposing
//! `/metrics`, `/live` and `/ready`.

pub mod collector;
pub mod config;
pub mod derive;
pub mod metrics;
pub mod render;
pub mod retry;
pub mod rpc;
pub mod types;
pub mod watcher;

// Re-export top-level configuration types.
pub use config::{ConfigError, RpcConfig, TrackedAccounts, WatcherConfig};

// Re-export the gateway seam and its HTTP implementation.
pub use rpc::{BlockSelector, ChainGateway, EpochSelector, Finality, RpcClient, RpcError};

// Re-export the engine.
pub use collector::{CollectError, Collector};
pub use derive::{Observations, derive};
pub use metrics::{MetricsRegistry, WatcherMetrics};
pub use render::{StatusRenderer, format_status_line};
pub use retry::{RetryError, RetryPolicy, RetryableError};
pub use watcher::{Watcher, WatcherError, WatcherState};

// Re-export domain types at the crate root for convenience.
pub use types::*;
