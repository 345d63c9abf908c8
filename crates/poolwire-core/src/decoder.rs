//! Decoding of reassembled messages into domain events.
//!
//! Two independent paths:
//! - transaction streams carry EIP-2718 transaction envelopes, either as raw
//!   binary frames or as hex text records;
//! - auction streams carry JSON notices that may be split over several frames
//!   and go through a [`FrameReassembler`] first.

use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{Transaction as _, TxEnvelope};
use alloy::eips::Decodable2718;
use alloy::primitives::Bytes;

use crate::connection::ConnectionRef;
use crate::error::{DecodeError, ReassemblyError};
use crate::event::{Auction, DecodedTransaction};
use crate::numeric::decode_hex;
use crate::reassembly::{FrameReassembler, ReassemblyLimits};
use crate::transport::Frame;

/// Decode one EIP-2718 encoded transaction envelope and recover its sender.
pub fn decode_transaction(raw: &[u8]) -> Result<DecodedTransaction, DecodeError> {
    let mut buf = raw;
    let envelope = TxEnvelope::decode_2718(&mut buf).map_err(|e| DecodeError::Envelope {
        reason: e.to_string(),
    })?;
    if !buf.is_empty() {
        return Err(DecodeError::Envelope {
            reason: format!("{} trailing bytes", buf.len()),
        });
    }

    let from = envelope.recover_signer().map_err(|e| DecodeError::Sender {
        reason: e.to_string(),
    })?;

    Ok(DecodedTransaction {
        hash: *envelope.hash(),
        from,
        to: envelope.to(),
        value: envelope.value(),
        input: envelope.input().clone(),
        gas_limit: envelope.gas_limit(),
        nonce: envelope.nonce(),
        chain_id: envelope.chain_id(),
        signature: *envelope.signature(),
        raw: Bytes::copy_from_slice(raw),
    })
}

/// Decode a transaction stream frame: binary frames are the envelope itself,
/// text frames are the envelope as hex (with or without `0x`).
pub fn decode_transaction_frame(frame: &Frame) -> Result<DecodedTransaction, DecodeError> {
    match frame {
        Frame::Binary(bytes) => decode_transaction(bytes),
        Frame::Text(text) if text.trim().is_empty() => Err(DecodeError::FrameKind("empty text")),
        Frame::Text(text) => decode_transaction(&decode_hex(text)?),
    }
}

/// Parse a complete auction notice.
pub fn decode_auction(json: &str) -> Result<Auction, DecodeError> {
    Ok(serde_json::from_str(json)?)
}

/// Turns the frames of one auction connection into [`Auction`]s.
///
/// A notice that is not yet a complete JSON document is treated as
/// incomplete; the reassembly limits bound how long that can go on. A
/// complete document that is not a valid notice is rejected on its own with
/// [`ReassemblyError::Invalid`].
#[derive(Debug)]
pub struct AuctionDecoder {
    reassembler: FrameReassembler<Auction>,
}

impl AuctionDecoder {
    pub fn new(limits: ReassemblyLimits) -> Self {
        Self {
            reassembler: FrameReassembler::new(limits),
        }
    }

    /// Feed one frame. `connection` is attached to the auction it completes.
    pub fn feed(
        &mut self,
        frame: Frame,
        connection: Option<&ConnectionRef>,
    ) -> Result<Option<Auction>, ReassemblyError> {
        Ok(self.reassembler.feed(frame)?.map(|mut auction| {
            auction.connection = connection.cloned();
            auction
        }))
    }

    /// Drop any partial notice. Called whenever the connection is replaced.
    pub fn reset(&mut self) {
        self.reassembler.reset();
    }

    pub fn pending_frames(&self) -> usize {
        self.reassembler.pending_frames()
    }
}

impl Default for AuctionDecoder {
    fn default() -> Self {
        Self::new(ReassemblyLimits::default())
    }
}
