//! poolwire-stream: persistent pool streams and bidding.
//!
//! # Features
//! - Pending transaction stream per chain, malformed messages dropped and counted
//! - Auction stream with frame reassembly
//! - Fixed-delay reconnect with a bounded number of consecutive dial failures
//! - Read deadline on every frame
//! - Bids written back on the auction's connection, or through the relay
//! - Deterministic shutdown via [`Subscription::shutdown`] or drop

pub mod bid;
pub mod client;
pub mod metrics;
pub mod session;
pub mod subscription;
mod supervisor;
pub mod ws;

pub use bid::{BidError, BidReceipt, BidSubmitter};
pub use client::Client;
pub use metrics::{MetricsSnapshot, StreamMetrics};
pub use session::{AuctionStream, TransactionStream};
pub use subscription::Subscription;
pub use ws::WsConnector;
