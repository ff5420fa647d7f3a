//! HTTP-based NEAR JSON-RPC client.
//!
//! This implementation of [`ChainGateway`] talks to a NEAR RPC node using
//! JSON-RPC 2.0 over HTTP(S) POST:
//!
//! ```json
//! POST /
//! { "jsonrpc": "2.0", "id": "near-validator-watcher", "method": "validators", "params": "latest" }
//!
//! Response:
//! { "jsonrpc": "2.0", "id": "near-validator-watcher", "result": { ... } }
//!
//! Error response:
//! {
//!   "jsonrpc": "2.0",
//!   "id": "near-validator-watcher",
//!   "error": {
//!     "name": "HANDLER_ERROR",
//!     "code": -32000,
//!     "message": "Server error",
//!     "data": "...",
//!     "cause": { "name": "UNKNOWN_EPOCH", "info": { } }
//!   }
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    BlockSelector, CallFunctionResult, ChainGateway, EpochSelector, Method, QueryRequest, RpcError,
};
use crate::config::RpcConfig;
use crate::types::{NodeStatus, ProtocolConfig, ValidatorSet};

const JSONRPC_VERSION: &str = "2.0";
const REQUEST_ID: &str = "near-validator-watcher";

/// JSON-RPC client for a single NEAR node.
///
/// The client is cheap to clone and can be shared across tasks; the
/// underlying `reqwest` connection pool is reference-counted.
#[derive(Clone, Debug)]
pub struct RpcClient {
    endpoint: String,
    client: Client,
}

impl RpcClient {
    /// Constructs a new client pointing at `cfg.endpoint`.
    pub fn new(cfg: &RpcConfig) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(RpcError::Client)?;

        Ok(Self {
            endpoint: cfg.endpoint.clone(),
            client,
        })
    }

    /// URL of the RPC node.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Performs a raw JSON-RPC call and decodes its `result`.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RpcError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: REQUEST_ID,
            method,
            params,
        };

        debug!(method, endpoint = %self.endpoint, "sending JSON-RPC request");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.transport(e))?;

        let envelope: RpcResponse = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(RpcError::HttpStatus(status)),
            Err(e) => return Err(decode_error(method, e)),
        };

        if let Some(err) = envelope.error {
            return Err(err.into_rpc_error());
        }
        if !status.is_success() {
            return Err(RpcError::HttpStatus(status));
        }

        let result = envelope.result.ok_or_else(|| RpcError::Decode {
            method: method.to_string(),
            reason: "response carries neither result nor error".to_string(),
        })?;

        serde_json::from_value(result).map_err(|e| decode_error(method, e))
    }

    /// Runs a generic `query` request.
    ///
    /// The request is validated first; a request with zero or several block
    /// selectors fails without being sent.
    pub async fn query<R>(&self, request: &QueryRequest) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        request.validate()?;
        self.call(Method::Query.as_str(), request).await
    }

    /// Calls a contract view method through `query`/`call_function`.
    ///
    /// A result that carries an `error` member instead of bytes is returned
    /// as [`RpcError::Contract`].
    pub async fn call_function(
        &self,
        request: &QueryRequest,
    ) -> Result<CallFunctionResult, RpcError> {
        let result: CallFunctionResult = self.query(request).await?;
        match result.error {
            Some(message) => Err(RpcError::Contract {
                method: request.method_name().unwrap_or_default().to_string(),
                message,
            }),
            None => Ok(result),
        }
    }

    fn transport(&self, source: reqwest::Error) -> RpcError {
        RpcError::Transport {
            url: self.endpoint.clone(),
            source,
        }
    }
}

#[async_trait]
impl ChainGateway for RpcClient {
    async fn status(&self) -> Result<NodeStatus, RpcError> {
        self.call(Method::Status.as_str(), &Value::Null).await
    }

    async fn validators(&self, epoch: &EpochSelector) -> Result<ValidatorSet, RpcError> {
        self.call(Method::Validators.as_str(), &epoch.to_params())
            .await
    }

    async fn protocol_config(&self, block: &BlockSelector) -> Result<ProtocolConfig, RpcError> {
        self.call(Method::ProtocolConfig.as_str(), &block.to_params())
            .await
    }
}

/// Internal request envelope sent to the node.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: ?Sized> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'a str,
    params: &'a P,
}

/// Internal response envelope returned by the node.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    cause: Option<RpcErrorCause>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorCause {
    #[serde(default)]
    name: String,
}

impl RpcErrorBody {
    fn into_rpc_error(self) -> RpcError {
        RpcError::Protocol {
            name: self.name,
            code: self.code,
            message: self.message,
            data: self.data.and_then(|data| match data {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            }),
            cause: self.cause.map(|c| c.name),
        }
    }
}

fn decode_error(method: &str, err: serde_json::Error) -> RpcError {
    RpcError::Decode {
        method: method.to_string(),
        reason: err.to_string(),
    }
}
