//! Error types for streams, decoding and connections.

use thiserror::Error;

/// Errors raised by a physical connection: dial, read, write.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Dial (TCP/TLS/WebSocket handshake) failed.
    #[error("Connect failed: {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Reading a frame failed.
    #[error("Read error: {0}")]
    Read(String),

    /// Writing a frame failed.
    #[error("Write error: {0}")]
    Write(String),

    /// No frame arrived within the read deadline.
    #[error("No frame received within {ms}ms")]
    ReadTimeout { ms: u64 },

    /// The remote side closed the connection.
    #[error("Connection closed by remote")]
    Closed,

    /// The connection an auction arrived on has since been replaced by a reconnect.
    #[error("Connection generation {expected} was replaced (current generation: {current})")]
    ConnectionReplaced { expected: u64, current: u64 },

    /// The session that owned the connection has ended.
    #[error("Connection is no longer available")]
    ConnectionClosed,
}

impl TransportError {
    /// Returns `true` if the supervisor should reconnect after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Read(_) | Self::ReadTimeout { .. } | Self::Closed
        )
    }

    /// Returns `true` if this error came from writing to a connection,
    /// including a write refused because the connection is stale.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            Self::Write(_) | Self::ConnectionReplaced { .. } | Self::ConnectionClosed
        )
    }
}

/// Errors while decoding a message into a domain event.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid transaction envelope: {reason}")]
    Envelope { reason: String },

    #[error("Sender recovery failed: {reason}")]
    Sender { reason: String },

    #[error("Invalid integer {value:?}")]
    Integer { value: String },

    #[error("Invalid timestamp {0}")]
    Timestamp(i64),

    #[error("Unexpected frame kind: {0}")]
    FrameKind(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the frame reassembler.
#[derive(Debug, Clone, Error)]
pub enum ReassemblyError {
    /// The pending message outgrew the configured limits.
    #[error("Pending message exceeds limits ({frames} frames, {bytes} bytes)")]
    Overflow { frames: usize, bytes: usize },

    /// The buffer is a complete JSON document but not a valid message.
    /// Only that message is lost; the stream position is still sound.
    #[error("Invalid message: {reason}")]
    Invalid { reason: String },

    /// A frame was not valid UTF-8 text.
    #[error("Frame is not valid UTF-8")]
    NotText,
}

/// Errors delivered on a session's error channel.
///
/// Every variant is terminal: once one is received, the session produces no
/// further events.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// No API key was configured. Reported immediately; nothing is dialed.
    #[error("Missing API key")]
    MissingCredential,

    /// Consecutive dial failures reached the configured bound.
    #[error("Gave up after {attempts} failed connection attempts: {last}")]
    RetriesExhausted { attempts: u32, last: TransportError },

    /// The endpoint could not be turned into a dialable URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
