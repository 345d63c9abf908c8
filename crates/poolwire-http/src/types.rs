//! Request and response bodies of the one-shot API.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use poolwire_core::numeric::deserialize_u256;
use poolwire_core::ChainId;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Timestamps arrive as RFC 3339 strings or as Unix epoch numbers
/// (milliseconds when larger than 10^12, seconds otherwise).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n.abs() >= 1_000_000_000_000 => DateTime::from_timestamp_millis(n)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {n}"))),
        Raw::Number(n) => DateTime::from_timestamp(n, 0)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {n}"))),
        Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(de::Error::custom),
    }
}

/// Where and when a transaction was observed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TraceEntry {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub time: DateTime<Utc>,
    pub origin: String,
}

/// Propagation trace of one transaction: `GET /trace/<hash>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub hash: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub first_seen_at: DateTime<Utc>,
    pub chain_id: ChainId,
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
    #[serde(default)]
    pub tx_data: String,
}

/// One call of a bundle to simulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleCall {
    pub from: String,
    pub to: String,
    pub value: String,
    pub data: String,
}

/// A bundle of calls simulated on top of `block_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub chain_id: ChainId,
    pub calls: Vec<BundleCall>,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InternalTransfer {
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "deserialize_u256")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationCallResult {
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(default, deserialize_with = "deserialize_u256")]
    pub gas_used: U256,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub address_created: Option<String>,
    pub status: i64,
    #[serde(default)]
    pub error: Option<ErrorDetails>,
    #[serde(default)]
    pub internal_transfers: Vec<InternalTransfer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub chain_id: ChainId,
    #[serde(deserialize_with = "deserialize_u256")]
    pub block_number: U256,
    #[serde(default)]
    pub process_time: u64,
    pub calls: Vec<SimulationCallResult>,
}

/// A private pool submission: `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivateTransaction {
    /// Signed transactions, hex encoded.
    pub transactions: Vec<String>,
    pub fee_recipient: String,
    /// Free-form source tag.
    pub source: String,
    /// Privacy profile name.
    pub privacy: String,
    /// Hints to reveal; overrides the privacy profile.
    pub hints: Vec<String>,
    pub bundle_types: Vec<String>,
    pub release_targets: Vec<String>,
    pub prevent_reverts: bool,
}

impl PrivateTransaction {
    pub fn new(raw_tx_hex: impl Into<String>, fee_recipient: impl Into<String>) -> Self {
        Self {
            transactions: vec![raw_tx_hex.into()],
            fee_recipient: fee_recipient.into(),
            source: String::new(),
            privacy: String::new(),
            hints: Vec::new(),
            bundle_types: Vec::new(),
            release_targets: Vec::new(),
            prevent_reverts: false,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn privacy(mut self, profile: impl Into<String>) -> Self {
        self.privacy = profile.into();
        self
    }

    pub fn hints(mut self, hints: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    pub fn prevent_reverts(mut self, prevent: bool) -> Self {
        self.prevent_reverts = prevent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_accepts_both_timestamp_forms() {
        let json = r#"{
            "hash": "0xfdcc",
            "firstSeenAt": "2023-06-01T12:00:00Z",
            "chainId": 137,
            "trace": [
                {"time": 1685620800123, "origin": "polygon-node-eu"},
                {"time": 1685620801, "origin": "polygon-node-us"}
            ],
            "txData": "0x02f8"
        }"#;
        let trace: Trace = serde_json::from_str(json).unwrap();
        assert_eq!(trace.chain_id, ChainId::POLYGON);
        assert_eq!(trace.first_seen_at.timestamp(), 1_685_620_800);
        assert_eq!(trace.trace[0].time.timestamp_millis(), 1_685_620_800_123);
        assert_eq!(trace.trace[1].time.timestamp(), 1_685_620_801);
        assert_eq!(trace.tx_data, "0x02f8");
    }

    #[test]
    fn simulation_result_decodes() {
        let json = r#"{
            "chainId": 1,
            "blockNumber": 17000000,
            "processTime": 12,
            "calls": [{
                "logs": [{"address": "0x1", "topics": ["0xa"], "data": "0x"}],
                "gasUsed": 21000,
                "result": "0x",
                "status": 1,
                "internalTransfers": [{"from": "0x1", "to": "0x2", "amount": "1000"}]
            }]
        }"#;
        let result: SimulationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.block_number, U256::from(17_000_000u64));
        assert_eq!(result.calls[0].gas_used, U256::from(21_000u64));
        assert_eq!(result.calls[0].internal_transfers[0].amount, U256::from(1000u64));
        assert!(result.calls[0].error.is_none());
    }

    #[test]
    fn private_transaction_wire_shape() {
        let tx = PrivateTransaction::new("02f8", "0xfee")
            .source("searcher")
            .hints(["calldata", "logs"])
            .prevent_reverts(true);
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["transactions"], serde_json::json!(["02f8"]));
        assert_eq!(json["fee_recipient"], "0xfee");
        assert_eq!(json["hints"], serde_json::json!(["calldata", "logs"]));
        assert_eq!(json["prevent_reverts"], true);
        assert_eq!(json["bundle_types"], serde_json::json!([]));
    }
}
