//! Per-session counters shared between the loops and the subscription handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_delivered: u64,
    /// Malformed transactions dropped by the decode loop.
    pub dropped_messages: u64,
    /// Invalid auction notices (dropped) and reassembly failures (which force a reconnect).
    pub protocol_errors: u64,
    pub dial_attempts: u64,
    /// Successful dials after the first one.
    pub reconnections: u64,
}

#[derive(Debug, Default)]
struct Counters {
    events_delivered: AtomicU64,
    dropped_messages: AtomicU64,
    protocol_errors: AtomicU64,
    dial_attempts: AtomicU64,
    reconnections: AtomicU64,
}

/// Cheaply cloneable handle to one session's counters.
#[derive(Debug, Clone, Default)]
pub struct StreamMetrics {
    counters: Arc<Counters>,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn event_delivered(&self) {
        self.counters.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_dropped(&self) {
        self.counters.dropped_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn protocol_error(&self) {
        self.counters.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dial_attempt(&self) {
        self.counters.dial_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reconnected(&self) {
        self.counters.reconnections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.counters;
        MetricsSnapshot {
            events_delivered: c.events_delivered.load(Ordering::Relaxed),
            dropped_messages: c.dropped_messages.load(Ordering::Relaxed),
            protocol_errors: c.protocol_errors.load(Ordering::Relaxed),
            dial_attempts: c.dial_attempts.load(Ordering::Relaxed),
            reconnections: c.reconnections.load(Ordering::Relaxed),
        }
    }
}
