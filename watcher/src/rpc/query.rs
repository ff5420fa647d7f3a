//! Generic `query` requests (contract view calls, account lookups).
//!
//! A query targets exactly one block view: a finality keyword, an explicit
//! block height, or an explicit block hash. The selectors are set through
//! builder methods and checked by [`QueryRequest::validate`] before anything
//! is sent over the wire.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};

use super::{BlockId, Finality, RpcError};

/// Request body of the `query` JSON-RPC method.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryRequest {
    request_type: String,
    account_id: Option<String>,
    method_name: Option<String>,
    public_key: Option<String>,
    prefix_base64: String,
    args_base64: String,
    finality: Option<Finality>,
    block_height: Option<u64>,
    block_hash: Option<String>,
}

impl QueryRequest {
    /// Creates a query of the given `request_type` (e.g. `"view_account"`).
    pub fn new(request_type: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            request_type: request_type.into(),
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    /// Creates a `call_function` query for a contract view method.
    pub fn call_function(account_id: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            method_name: Some(method_name.into()),
            ..Self::new("call_function", account_id)
        }
    }

    pub fn with_finality(mut self, finality: Finality) -> Self {
        self.finality = Some(finality);
        self
    }

    pub fn with_block_height(mut self, height: u64) -> Self {
        self.block_height = Some(height);
        self
    }

    pub fn with_block_hash(mut self, hash: impl Into<String>) -> Self {
        self.block_hash = Some(hash.into());
        self
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Contract method of a `call_function` query.
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// Sets the call arguments, encoded as base64 JSON.
    ///
    /// `null` arguments are sent as an empty object, which is what contracts
    /// expect for argument-less view methods.
    pub fn with_args<T: Serialize + ?Sized>(mut self, args: &T) -> Result<Self, RpcError> {
        let value = serde_json::to_value(args)
            .map_err(|e| RpcError::InvalidRequest(format!("unencodable call args: {e}")))?;
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };
        self.args_base64 = STANDARD.encode(value.to_string());
        Ok(self)
    }

    /// Checks that exactly one block selector is set.
    pub fn validate(&self) -> Result<(), RpcError> {
        let selectors = [
            self.finality.is_some(),
            self.block_height.is_some(),
            self.block_hash.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        match selectors {
            1 => Ok(()),
            0 => Err(RpcError::InvalidRequest(
                "missing block_id or finality".to_string(),
            )),
            _ => Err(RpcError::InvalidRequest(
                "exactly one of finality, block height or block hash may be set".to_string(),
            )),
        }
    }

    fn block_id(&self) -> Option<BlockId> {
        match (self.block_height, &self.block_hash) {
            (Some(height), _) => Some(BlockId::Height(height)),
            (None, Some(hash)) => Some(BlockId::Hash(hash.clone())),
            (None, None) => None,
        }
    }
}

/// On-the-wire shape of a query request.
#[derive(Serialize)]
struct WireQuery<'a> {
    request_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    finality: Option<Finality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_id: Option<BlockId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<&'a str>,
    prefix_base64: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    method_name: Option<&'a str>,
    args_base64: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_key: Option<&'a str>,
}

impl Serialize for QueryRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        WireQuery {
            request_type: &self.request_type,
            finality: self.finality,
            block_id: self.block_id(),
            account_id: self.account_id.as_deref(),
            prefix_base64: &self.prefix_base64,
            method_name: self.method_name.as_deref(),
            args_base64: &self.args_base64,
            public_key: self.public_key.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Result of a `call_function` query.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallFunctionResult {
    pub block_hash: String,
    pub block_height: u64,
    #[serde(default)]
    pub logs: Vec<String>,
    /// Raw bytes returned by the contract method.
    #[serde(default)]
    pub result: Vec<u8>,
    /// Execution error reported by the node in place of `result`.
    #[serde(default)]
    pub error: Option<String>,
}

impl CallFunctionResult {
    /// Decodes the returned bytes as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RpcError> {
        serde_json::from_slice(&self.result).map_err(|e| RpcError::Decode {
            method: "call_function".to_string(),
            reason: e.to_string(),
        })
    }
}
