//! NEAR JSON-RPC gateway.
//!
//! The watcher only ever needs three read-only views of the chain, expressed
//! by the [`ChainGateway`] trait. [`RpcClient`] implements it over HTTPS
//! POST; tests substitute in-memory gateways.
//!
//! The gateway never retries. Retrying is the scheduler's job, see
//! [`crate::retry`].

pub mod client;
pub mod error;
pub mod query;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use crate::types::{NodeStatus, ProtocolConfig, ValidatorSet};

pub use client::RpcClient;
pub use error::RpcError;
pub use query::{CallFunctionResult, QueryRequest};

/// JSON-RPC methods used by the watcher.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Method {
    Status,
    Validators,
    ProtocolConfig,
    Query,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Status => "status",
            Method::Validators => "validators",
            Method::ProtocolConfig => "EXPERIMENTAL_protocol_config",
            Method::Query => "query",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consensus-state selector for block-scoped reads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum Finality {
    #[default]
    #[serde(rename = "final")]
    Final,
    #[serde(rename = "near-final")]
    NearFinal,
    #[serde(rename = "optimistic")]
    Optimistic,
}

/// Explicit block reference, either by height or by hash.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockId {
    Height(u64),
    Hash(String),
}

/// Which block view a block-scoped read targets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BlockSelector {
    Finality(Finality),
    Block(BlockId),
}

impl Default for BlockSelector {
    fn default() -> Self {
        BlockSelector::Finality(Finality::Final)
    }
}

impl BlockSelector {
    pub(crate) fn to_params(&self) -> Value {
        match self {
            BlockSelector::Finality(finality) => json!({ "finality": finality }),
            BlockSelector::Block(id) => json!({ "block_id": id }),
        }
    }
}

/// Which epoch a `validators` read targets.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum EpochSelector {
    /// The epoch of the latest block.
    #[default]
    Latest,
    /// A historical epoch, by epoch id.
    EpochId(String),
    /// The epoch containing the given block.
    Block(BlockId),
}

impl EpochSelector {
    pub(crate) fn to_params(&self) -> Value {
        match self {
            EpochSelector::Latest => json!("latest"),
            EpochSelector::EpochId(id) => json!({ "epoch_id": id }),
            EpochSelector::Block(id) => json!({ "block_id": id }),
        }
    }
}

/// Read-only view of a NEAR node.
///
/// Every call is idempotent and side-effect free. Dropping the returned
/// future aborts the in-flight request.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn status(&self) -> Result<NodeStatus, RpcError>;

    async fn validators(&self, epoch: &EpochSelector) -> Result<ValidatorSet, RpcError>;

    async fn protocol_config(&self, block: &BlockSelector) -> Result<ProtocolConfig, RpcError>;
}

#[async_trait]
impl<G> ChainGateway for Arc<G>
where
    G: ChainGateway + ?Sized,
{
    async fn status(&self) -> Result<NodeStatus, RpcError> {
        (**self).status().await
    }

    async fn validators(&self, epoch: &EpochSelector) -> Result<ValidatorSet, RpcError> {
        (**self).validators(epoch).await
    }

    async fn protocol_config(&self, block: &BlockSelector) -> Result<ProtocolConfig, RpcError> {
        (**self).protocol_config(block).await
    }
}
