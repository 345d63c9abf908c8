//! Connection policies.
//!
//! ```text
//! dial ─fail─▶ [ReconnectPolicy::on_dial_failure] ─delay─▶ dial
//!   │                      │
//!   ok ─▶ reset counter    └─ bound reached ─▶ fatal
//! ```

pub mod reconnect;

pub use reconnect::{ReconnectDecision, ReconnectPolicy};
