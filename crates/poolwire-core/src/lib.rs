//! poolwire-core: types and pure logic shared by the poolwire crates.
//!
//! # Overview
//!
//! poolwire consumes real-time feeds from a private transaction pool:
//! pending mempool transactions and auction notices. The core crate defines:
//!
//! - [`ChainId`]: the one chain identifier used everywhere
//! - [`DecodedTransaction`] / [`Auction`]: the domain events
//! - [`FrameReassembler`]: joins JSON messages split across frames
//! - [`decoder`]: binary transaction and JSON auction decoding
//! - [`Connector`] / [`FrameSource`] / [`FrameSink`]: the transport seam
//! - [`ConnectionRegistry`]: generation-tagged write access to a live connection
//! - [`ReconnectPolicy`]: fixed delay, bounded consecutive dial failures
//! - [`ClientConfig`]: endpoints, deadlines and limits

pub mod chain;
pub mod config;
pub mod connection;
pub mod decoder;
pub mod error;
pub mod event;
pub mod numeric;
pub mod policy;
pub mod reassembly;
pub mod request;
pub mod transport;

pub use chain::ChainId;
pub use config::{ClientConfig, Endpoints, StreamSettings};
pub use connection::{ConnectionRef, ConnectionRegistry};
pub use decoder::AuctionDecoder;
pub use error::{DecodeError, ReassemblyError, StreamError, TransportError};
pub use event::{Auction, AuctionTransaction, DecodedTransaction};
pub use policy::{ReconnectDecision, ReconnectPolicy};
pub use reassembly::{FrameReassembler, ReassemblyLimits};
pub use request::{BundleRequest, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::{Connection, Connector, Frame, FrameSink, FrameSource};

pub use alloy::primitives::{Address, Bytes, B256, U256};
