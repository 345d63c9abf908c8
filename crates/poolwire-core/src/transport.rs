//! The frame transport abstraction every persistent connection implements.
//!
//! A dialed connection is split into a [`FrameSource`] owned by the read loop
//! and a [`FrameSink`] kept in the session's connection registry so bids can
//! be written on the same socket.

use async_trait::async_trait;

use crate::error::TransportError;

/// One transport-level message fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
        }
    }
}

/// The read half of a connection.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Wait for the next data frame.
    ///
    /// Returns `None` once the remote side has closed the connection.
    /// Control frames (ping/pong) are handled internally and never returned.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// The write half of a connection.
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection. Errors are ignored; the connection is gone either way.
    async fn close(&mut self);
}

/// A dialed connection, already split.
pub struct Connection {
    pub source: Box<dyn FrameSource>,
    pub sink: Box<dyn FrameSink>,
}

/// Dials persistent connections.
///
/// # Object Safety
/// The trait is object-safe and is stored as `Arc<dyn Connector>` by sessions,
/// so tests can substitute a scripted transport.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Connection, TransportError>;
}
