//! One-shot API error type.

use poolwire_core::JsonRpcError;
use thiserror::Error;

/// Errors from one-shot HTTP calls. Never retried automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The call needs an API key and none is configured.
    #[error("Missing API key")]
    MissingCredential,

    /// The endpoint could not be turned into a request URL.
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    /// Connection refused, timeout, TLS failure and the like.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The acknowledgement had no string `result` field.
    #[error("Response has no string `result` field")]
    MissingResult,

    /// The `result` field was present but not in the expected format.
    #[error("Unexpected result {0:?}")]
    InvalidResult(String),

    /// JSON-RPC error object returned by the remote.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),
}

impl ApiError {
    /// HTTP status code, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
