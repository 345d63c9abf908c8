//! Domain events delivered to stream consumers.

use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::chain::ChainId;
use crate::connection::ConnectionRef;
use crate::numeric;

/// A full signed transaction seen in the public mempool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub nonce: u64,
    /// `None` for pre-EIP-155 legacy transactions.
    pub chain_id: Option<u64>,
    pub signature: Signature,
    /// The EIP-2718 encoded envelope exactly as received.
    pub raw: Bytes,
}

/// The pending transaction being auctioned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuctionTransaction {
    #[serde(deserialize_with = "numeric::deserialize_hash")]
    pub hash: B256,
    #[serde(deserialize_with = "numeric::deserialize_address")]
    pub from: Address,
    #[serde(default, deserialize_with = "numeric::deserialize_opt_address")]
    pub to: Option<Address>,
    #[serde(default, deserialize_with = "numeric::deserialize_u256")]
    pub value: U256,
    #[serde(default, deserialize_with = "numeric::deserialize_bytes")]
    pub data: Bytes,
    #[serde(default)]
    pub gas: u64,
}

/// One open bidding opportunity on the private pool.
///
/// Deserializes directly from the auction stream's JSON notices:
/// `{id, fee_recipient, closes_at_unix, created_at_unix, chain_id, transaction}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Auction {
    pub id: String,
    pub fee_recipient: String,
    #[serde(rename = "closes_at_unix", deserialize_with = "numeric::deserialize_unix_seconds")]
    pub closes_at: DateTime<Utc>,
    #[serde(rename = "created_at_unix", deserialize_with = "numeric::deserialize_unix_seconds")]
    pub created_at: DateTime<Utc>,
    /// Notices from before multi-chain support carry no chain id; those are Ethereum.
    #[serde(default = "default_auction_chain")]
    pub chain_id: ChainId,
    pub transaction: AuctionTransaction,
    /// The connection this auction arrived on, if it came from a stream.
    /// Bids are written back on it while it is still the session's current one.
    #[serde(skip)]
    pub connection: Option<ConnectionRef>,
}

fn default_auction_chain() -> ChainId {
    ChainId::ETHEREUM
}

impl Auction {
    /// Returns `true` once `now` has reached the auction's close time.
    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.closes_at
    }

    /// Returns `true` if bids can still go out on the originating connection.
    pub fn has_live_connection(&self) -> bool {
        self.connection.as_ref().is_some_and(ConnectionRef::is_current)
    }
}
