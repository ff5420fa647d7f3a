//! Core domain types used by the watcher.
//!
//! This module defines the decoded shapes of the three JSON-RPC views the
//! watcher consumes (node status, protocol config, validator set) and the
//! strongly-typed values they carry. The goal is to avoid "naked" strings
//! for stakes and account identifiers in public APIs and instead use
//! domain-specific newtypes.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Node status as returned by the `status` method.
pub mod status;
/// Protocol configuration as returned by `EXPERIMENTAL_protocol_config`.
pub mod protocol;
/// Current/next validators, proposals and kickouts.
pub mod validators;

pub use protocol::ProtocolConfig;
pub use status::{NodeStatus, NodeVersion, SyncInfo};
pub use validators::{
    CurrentValidator, Kickout, KickoutReason, NextValidator, Proposal, ValidatorSet,
};

/// NEAR account identifier, e.g. `"kiln.pool.f863973.m0"`.
///
/// Account ids are compared by exact, case-sensitive string equality. The
/// watcher never normalizes them; display-only shortening lives in
/// [`crate::render`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Returns the raw account id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        AccountId(s)
    }
}

/// Error returned when a stake string cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ParseStakeError {
    /// The string is not a decimal number.
    #[error("invalid stake {0:?}: not a decimal number")]
    Invalid(String),
    /// The string is a negative number.
    #[error("invalid stake {0:?}: negative")]
    Negative(String),
}

/// Validator stake in yoctoNEAR.
///
/// Observed stakes exceed 10^33, well beyond `u64` and beyond the exact
/// integer range of `f64`, so the value is kept as an arbitrary-precision
/// [`BigDecimal`]. Ordering and minimum comparisons operate on the decimal;
/// [`Stake::to_f64`] is only meant for the final gauge export.
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Stake(BigDecimal);

impl Stake {
    /// The zero stake, used as the seat price of an empty validator set.
    pub fn zero() -> Self {
        Stake(BigDecimal::zero())
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// Lossy conversion for export as a Prometheus gauge value.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY)
    }
}

impl Default for Stake {
    fn default() -> Self {
        Stake::zero()
    }
}

impl FromStr for Stake {
    type Err = ParseStakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value =
            BigDecimal::from_str(s.trim()).map_err(|_| ParseStakeError::Invalid(s.to_string()))?;
        if value < BigDecimal::zero() {
            return Err(ParseStakeError::Negative(s.to_string()));
        }
        Ok(Stake(value))
    }
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Stake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // The RPC encodes balances as JSON strings to avoid precision loss.
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl Serialize for Stake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

/// One consistent view of the chain, produced by a single collection cycle.
///
/// A snapshot is created fresh each cycle, never merged with a previous one,
/// and dropped once metrics have been derived from it.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub status: NodeStatus,
    pub protocol_config: ProtocolConfig,
    pub validators: ValidatorSet,
}
