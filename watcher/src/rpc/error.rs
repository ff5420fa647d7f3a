use crate::retry::RetryableError;

/// Errors that can occur while talking to the NEAR JSON-RPC endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// Transport-level error (timeout, connection reset, TLS, ...).
    #[error("HTTP POST {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx HTTP status without a JSON-RPC error envelope.
    #[error("RPC endpoint returned HTTP status {0}")]
    HttpStatus(reqwest::StatusCode),
    /// The node answered with a structured JSON-RPC error envelope.
    #[error("jsonrpc error({code}): {name} {message}{}", detail(.data))]
    Protocol {
        name: String,
        code: i64,
        message: String,
        /// Free-form `data` member, flattened to text.
        data: Option<String>,
        cause: Option<String>,
    },
    /// A view call reached the contract, which reported an error.
    #[error("contract call {method} failed: {message}")]
    Contract { method: String, message: String },
    /// The response does not match the expected schema.
    #[error("failed to decode {method} response: {reason}")]
    Decode { method: String, reason: String },
    /// The request was rejected before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RetryableError for RpcError {
    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RpcError::InvalidRequest(_) | RpcError::Client(_) | RpcError::Contract { .. }
        )
    }
}

fn detail(data: &Option<String>) -> String {
    match data {
        Some(data) if !data.is_empty() => format!(" ({data})"),
        _ => String::new(),
    }
}
