//! # poolwire-observability
//!
//! Structured logging for poolwire binaries: an `EnvFilter` built from a
//! global level plus per-crate overrides, with text or JSON output.

pub mod logging;

pub use logging::{init_tracing, LogConfig};
