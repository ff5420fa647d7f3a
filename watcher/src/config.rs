//! Top-level configuration for the watcher.
//!
//! This module aggregates configuration for:
//!
//! - the JSON-RPC client (node URL + request timeout),
//! - the refresh loop (interval, retry delay),
//! - the tracked accounts and metric namespace.
//!
//! Parsing (CLI flags, env vars) is owned by the binary; the library only
//! defines the shapes, their defaults and their static validation.

use std::time::Duration;

use crate::types::AccountId;

/// Default metric namespace prefix.
pub const DEFAULT_NAMESPACE: &str = "near_validator_watcher";

/// Errors raised by static configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("refresh rate must be greater than zero")]
    ZeroRefreshRate,
    #[error("RPC endpoint must not be empty")]
    EmptyEndpoint,
    #[error("invalid metric namespace {0:?}")]
    InvalidNamespace(String),
}

/// Configuration for the JSON-RPC client.
#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// URL of the NEAR RPC node, e.g. `"https://rpc.mainnet.near.org"`.
    pub endpoint: String,
    /// Request timeout for a single RPC call.
    pub timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://rpc.mainnet.near.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RpcConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        Ok(())
    }
}

/// Operator-designated accounts of special monitoring interest.
///
/// Membership is exact, case-sensitive string equality. The configured order
/// is kept, since the status line lists tracked validators in that order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrackedAccounts(Vec<AccountId>);

impl TrackedAccounts {
    /// Builds the set, dropping empty entries (e.g. from splitting an empty
    /// environment variable) and duplicates.
    pub fn new<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<AccountId> = Vec::new();
        for account in accounts {
            let account = AccountId(account.into().trim().to_string());
            if !account.as_str().is_empty() && !out.contains(&account) {
                out.push(account);
            }
        }
        Self(out)
    }

    pub fn contains(&self, account_id: &str) -> bool {
        self.0.iter().any(|a| a.as_str() == account_id)
    }

    /// `"1"` for tracked accounts, `"0"` otherwise; used as a label value.
    pub fn flag(&self, account_id: &str) -> &'static str {
        if self.contains(account_id) { "1" } else { "0" }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configuration of the refresh loop.
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    /// How often the RPC node is polled.
    pub refresh_rate: Duration,
    /// Delay between retry attempts of a failed cycle.
    pub retry_delay: Duration,
    pub tracked_accounts: TrackedAccounts,
    /// Prefix of every exported metric name.
    pub namespace: String,
    /// Whether the status line uses ANSI colors.
    pub colored: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            refresh_rate: Duration::from_secs(10),
            retry_delay: Duration::from_secs(1),
            tracked_accounts: TrackedAccounts::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            colored: true,
        }
    }
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_rate.is_zero() {
            return Err(ConfigError::ZeroRefreshRate);
        }
        if !is_valid_namespace(&self.namespace) {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(())
    }
}

// Prometheus metric names: [a-zA-Z_:][a-zA-Z0-9_:]*
fn is_valid_namespace(ns: &str) -> bool {
    let mut chars = ns.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
