//! JSON-RPC 2.0 wire types used by bids and one-shot calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request ID: string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: RpcId,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id: RpcId::Number(id),
        }
    }

    /// `eth_sendRawTransaction` for a signed transaction in hex.
    pub fn send_raw_transaction(id: u64, raw_tx_hex: &str) -> Self {
        let hex = if raw_tx_hex.starts_with("0x") {
            raw_tx_hex.to_string()
        } else {
            format!("0x{raw_tx_hex}")
        };
        Self::new(id, "eth_sendRawTransaction", vec![Value::String(hex)])
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response. Relay acknowledgements omit `jsonrpc` and `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<RpcId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// The `result` value, or the error object the remote returned.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

pub const SEND_BUNDLE_METHOD: &str = "eth_sendBundle";

/// Bundle parameters of an `eth_sendBundle` bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleParams {
    /// Signed transactions, hex encoded, in execution order.
    pub txs: Vec<String>,
    /// Target block; `"0"` lets the pool pick the auction's block.
    #[serde(rename = "blockNumber")]
    pub block_number: String,
}

/// The bid envelope: `{jsonrpc, method: "eth_sendBundle", params: [{txs, blockNumber}]}`.
///
/// Written as-is to an auction connection or POSTed to the relay. It carries
/// no `id`; the relay answers with `{result: <submission id>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<BundleParams>,
}

impl BundleRequest {
    pub fn new(txs: Vec<String>, block_number: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: SEND_BUNDLE_METHOD.into(),
            params: vec![BundleParams {
                txs,
                block_number: block_number.into(),
            }],
        }
    }

    /// A bid for the auction's own block.
    pub fn for_auction(txs: Vec<String>) -> Self {
        Self::new(txs, "0")
    }
}
