//! Bid submission: over the auction's own connection when it is still
//! current, through the relay otherwise.

use alloy::consensus::TxEnvelope;
use alloy::eips::Encodable2718;
use thiserror::Error;

use poolwire_core::{Auction, BundleRequest, TransportError};
use poolwire_http::{ApiClient, ApiError};

#[derive(Debug, Error)]
pub enum BidError {
    /// Writing on the auction's connection failed. A replaced or closed
    /// connection means the auction is gone; do not retry.
    #[error("Bid write failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Relay submission failed: {0}")]
    Api(#[from] ApiError),

    #[error("Bid encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BidError {
    /// True when the auction's connection was replaced or closed.
    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::ConnectionReplaced { .. } | TransportError::ConnectionClosed)
        )
    }
}

/// How a bid was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidReceipt {
    /// Written on the auction's connection. No acknowledgement is read back.
    Sent { generation: u64 },
    /// Accepted by the relay under this submission id.
    Relayed { submission_id: String },
}

impl BidReceipt {
    pub fn submission_id(&self) -> Option<&str> {
        match self {
            Self::Relayed { submission_id } => Some(submission_id),
            Self::Sent { .. } => None,
        }
    }
}

/// Unprefixed hex of the EIP-2718 encoding.
pub fn encode_signed(tx: &TxEnvelope) -> String {
    hex::encode(tx.encoded_2718())
}

#[derive(Debug, Clone)]
pub struct BidSubmitter {
    api: ApiClient,
}

impl BidSubmitter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Bid on `auction` with signed transactions, in execution order.
    pub async fn submit_bid(&self, auction: &Auction, txs: &[TxEnvelope]) -> Result<BidReceipt, BidError> {
        self.submit_raw_bid(auction, txs.iter().map(encode_signed).collect()).await
    }

    /// Bid on `auction` with hex-encoded signed transactions.
    ///
    /// If the auction still references its connection the bid is written
    /// there, and fails if that connection has since been replaced. An
    /// auction without a connection is bid on through the relay.
    pub async fn submit_raw_bid(&self, auction: &Auction, txs: Vec<String>) -> Result<BidReceipt, BidError> {
        let bid = BundleRequest::for_auction(txs);
        match &auction.connection {
            Some(conn) => {
                let payload = serde_json::to_string(&bid)?;
                conn.send_text(payload).await.inspect_err(|e| {
                    tracing::warn!(auction = %auction.id, generation = conn.generation(), error = %e, "bid not sent");
                })?;
                tracing::debug!(auction = %auction.id, generation = conn.generation(), "bid sent on auction connection");
                Ok(BidReceipt::Sent { generation: conn.generation() })
            }
            None => {
                let submission_id = self.api.relay_bundle(&bid).await?;
                tracing::debug!(auction = %auction.id, submission_id = %submission_id, "bid relayed");
                Ok(BidReceipt::Relayed { submission_id })
            }
        }
    }

    /// Post hex-encoded signed transactions to the relay, regardless of any
    /// live connection. Returns the relay's submission id.
    pub async fn submit_bid_via_relay(&self, txs: Vec<String>) -> Result<String, BidError> {
        Ok(self.api.relay_bundle(&BundleRequest::for_auction(txs)).await?)
    }
}
