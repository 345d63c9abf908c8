//! poolwire-http: one-shot calls against the pool's HTTP endpoints.
//!
//! Relay bid submission, transaction traces, raw transaction injection,
//! address overwatch, bundle simulation and private pool submission.
//! None of these calls are retried.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    Bundle, BundleCall, PrivateTransaction, SimulationCallResult, SimulationResult, Trace,
    TraceEntry,
};
