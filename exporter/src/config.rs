//! Exporter configuration.
//!
//! Command-line flags (with environment fallbacks) and their mapping onto
//! the `watcher` crate's [`RpcConfig`] and [`WatcherConfig`].

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use watcher::config::DEFAULT_NAMESPACE;
use watcher::{RpcConfig, TrackedAccounts, WatcherConfig};

/// NEAR validator watcher: republishes validator set state as Prometheus
/// metrics.
#[derive(Parser, Debug)]
#[command(name = "near-validator-watcher", version)]
pub struct Args {
    /// NEAR RPC node URL
    #[arg(
        long,
        env = "NEAR_VALIDATOR_WATCHER_NODE",
        default_value = "https://rpc.mainnet.near.org"
    )]
    pub node: String,

    /// Address the HTTP server (metrics and probes) listens on
    #[arg(
        long,
        env = "NEAR_VALIDATOR_WATCHER_HTTP_ADDR",
        default_value = "0.0.0.0:8080"
    )]
    pub http_addr: SocketAddr,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "NEAR_VALIDATOR_WATCHER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Prefix of every exported metric name
    #[arg(
        long,
        env = "NEAR_VALIDATOR_WATCHER_NAMESPACE",
        default_value = DEFAULT_NAMESPACE
    )]
    pub namespace: String,

    /// Disable colored status lines
    #[arg(long)]
    pub no_color: bool,

    /// Time between two refreshes: `10s`, `500ms`, `1m`, `1h`, or bare seconds
    #[arg(
        long,
        env = "NEAR_VALIDATOR_WATCHER_REFRESH_RATE",
        default_value = "10s",
        value_parser = parse_refresh_rate
    )]
    pub refresh_rate: Duration,

    /// Timeout of a single RPC call, in seconds
    #[arg(
        long,
        env = "NEAR_VALIDATOR_WATCHER_RPC_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rpc_timeout: u64,

    /// Validator account to track (repeatable)
    #[arg(
        long = "validator",
        env = "NEAR_VALIDATOR_WATCHER_VALIDATORS",
        value_delimiter = ','
    )]
    pub validators: Vec<String>,
}

impl Args {
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            endpoint: self.node.clone(),
            timeout: Duration::from_secs(self.rpc_timeout),
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            refresh_rate: self.refresh_rate,
            tracked_accounts: TrackedAccounts::new(self.validators.iter().map(String::as_str)),
            namespace: self.namespace.clone(),
            colored: !self.no_color,
            ..WatcherConfig::default()
        }
    }
}

/// Parses a refresh rate such as `10s`, `500ms`, `2m` or `1h`. A bare number
/// is read as seconds.
fn parse_refresh_rate(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration `{s}`, expected e.g. `10s` or `500ms`"))?;

    let rate = match unit {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3600)),
        other => return Err(format!("unknown duration unit `{other}` in `{s}`")),
    };
    if rate.is_zero() {
        return Err("refresh rate must be positive".to_string());
    }
    Ok(rate)
}
