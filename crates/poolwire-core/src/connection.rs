//! Connection registry: the single live write half of a session, tagged with
//! a generation number.
//!
//! Every successful dial installs a new sink and bumps the generation. Events
//! remember the generation they arrived on through a [`ConnectionRef`]; a write
//! through a stale reference fails fast instead of reaching a newer socket.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;

use crate::error::TransportError;
use crate::transport::FrameSink;

struct Slot {
    generation: u64,
    sink: Option<Box<dyn FrameSink>>,
}

/// Holds the write half of the current connection of one session.
pub struct ConnectionRegistry {
    slot: Mutex<Slot>,
    generation: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot { generation: 0, sink: None }),
            generation: AtomicU64::new(0),
        })
    }

    /// Generation of the most recently installed connection (0 = never connected).
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Install the sink of a freshly dialed connection and return its generation.
    /// Any previous sink is closed first.
    pub async fn install(&self, sink: Box<dyn FrameSink>) -> u64 {
        let mut slot = self.slot.lock().await;
        if let Some(mut old) = slot.sink.take() {
            old.close().await;
        }
        slot.generation += 1;
        slot.sink = Some(sink);
        self.generation.store(slot.generation, Ordering::Release);
        slot.generation
    }

    /// Close and drop the current sink. The generation is left unchanged so
    /// that references to it report the connection as closed, not replaced.
    pub async fn retire(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(mut sink) = slot.sink.take() {
            sink.close().await;
        }
    }

    /// Write `text` on the connection identified by `generation`.
    pub async fn send(&self, generation: u64, text: String) -> Result<(), TransportError> {
        let mut slot = self.slot.lock().await;
        if slot.generation != generation {
            return Err(TransportError::ConnectionReplaced {
                expected: generation,
                current: slot.generation,
            });
        }
        match slot.sink.as_mut() {
            Some(sink) => sink.send_text(text).await,
            None => Err(TransportError::ConnectionClosed),
        }
    }

    /// A non-owning reference to the connection with the given generation.
    pub fn reference(self: &Arc<Self>, generation: u64) -> ConnectionRef {
        ConnectionRef {
            generation,
            registry: Arc::downgrade(self),
        }
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("generation", &self.current_generation())
            .finish()
    }
}

/// Non-owning back-reference from an event to the connection it arrived on.
#[derive(Debug, Clone)]
pub struct ConnectionRef {
    generation: u64,
    registry: Weak<ConnectionRegistry>,
}

impl ConnectionRef {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` while the originating connection is still the session's
    /// current one. Advisory only: a reconnect may happen right after.
    pub fn is_current(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.current_generation() == self.generation)
    }

    /// Write on the originating connection.
    ///
    /// Fails with [`TransportError::ConnectionReplaced`] after a reconnect and
    /// with [`TransportError::ConnectionClosed`] once the session is gone.
    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        let registry = self
            .registry
            .upgrade()
            .ok_or(TransportError::ConnectionClosed)?;
        registry.send(self.generation, text).await
    }
}
