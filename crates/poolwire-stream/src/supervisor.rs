//! The connection supervisor: dial, read under a deadline, reconnect.
//!
//! ```text
//!   dial ──fail──▶ failures += 1 ──bound reached──▶ RetriesExhausted (fatal)
//!    │                  │
//!    │ ok               └──▶ sleep(delay) ──▶ dial
//!    ▼
//!   failures = 0, handler.on_connect(sink)
//!    ▼
//!   read ◀──────── Continue ◀── handler.on_frame(frame)
//!    │ error / deadline / close / Reconnect
//!    ▼
//!   handler.on_disconnect() ──▶ sleep(delay) ──▶ dial
//! ```
//!
//! Cancellation is observed while dialing, while reading and while sleeping.
//! Losing an established connection never counts against the dial bound.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use poolwire_core::{
    Connection, Connector, Frame, FrameSink, FrameSource, ReconnectDecision, ReconnectPolicy,
    StreamError, TransportError,
};

use crate::metrics::StreamMetrics;

/// What the supervisor does after a frame was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// Drop the connection and dial again.
    Reconnect,
    /// End the session quietly.
    Stop,
}

/// Stream-kind specific behaviour plugged into the supervisor.
#[async_trait]
pub(crate) trait FrameHandler: Send {
    /// A new connection is up. `sink` is its write half.
    async fn on_connect(&mut self, sink: Box<dyn FrameSink>);

    async fn on_frame(&mut self, frame: Frame) -> Flow;

    /// The current connection is gone.
    async fn on_disconnect(&mut self);
}

pub(crate) struct Supervisor {
    pub connector: Arc<dyn Connector>,
    pub url: String,
    /// Credential to mask in logs and errors.
    pub secret: String,
    pub read_timeout: Duration,
    pub policy: ReconnectPolicy,
    pub cancel: CancellationToken,
    pub metrics: StreamMetrics,
}

impl Supervisor {
    fn redact(&self, text: &str) -> String {
        if self.secret.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.secret, "***")
        }
    }

    fn scrub(&self, err: TransportError) -> TransportError {
        match err {
            TransportError::Connect { url, reason } => TransportError::Connect {
                url: self.redact(&url),
                reason: self.redact(&reason),
            },
            TransportError::Read(reason) => TransportError::Read(self.redact(&reason)),
            other => other,
        }
    }

    /// Sleep for `delay`. Returns `false` if cancelled meanwhile.
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Run until cancelled, stopped by the handler, or the dial bound is reached.
    ///
    /// `Ok(())` is a quiet stop; `Err` is the session's one fatal error.
    pub async fn run<H: FrameHandler>(&self, handler: &mut H) -> Result<(), StreamError> {
        let url = self.redact(&self.url);
        let mut failures = 0u32;
        let mut connected_before = false;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            self.metrics.dial_attempt();
            let dialed = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                r = self.connector.connect(&self.url) => r,
            };

            let Connection { mut source, sink } = match dialed {
                Ok(conn) => conn,
                Err(e) => {
                    let e = self.scrub(e);
                    failures += 1;
                    match self.policy.on_dial_failure(failures) {
                        ReconnectDecision::GiveUp => {
                            tracing::error!(url = %url, attempts = failures, error = %e, "giving up after repeated dial failures");
                            return Err(StreamError::RetriesExhausted {
                                attempts: failures,
                                last: e,
                            });
                        }
                        ReconnectDecision::Retry(delay) => {
                            tracing::warn!(url = %url, attempt = failures, error = %e, "dial failed, retrying in {delay:?}");
                            if !self.pause(delay).await {
                                return Ok(());
                            }
                            continue;
                        }
                    }
                }
            };

            failures = 0;
            if connected_before {
                self.metrics.reconnected();
            }
            connected_before = true;
            tracing::info!(url = %url, "connected");

            handler.on_connect(sink).await;
            let flow = self.read_until_broken(source.as_mut(), handler).await;
            handler.on_disconnect().await;

            if flow == Flow::Stop {
                return Ok(());
            }
            let delay = self.policy.on_disconnect();
            tracing::warn!(url = %url, "connection lost, reconnecting in {delay:?}");
            if !self.pause(delay).await {
                return Ok(());
            }
        }
    }

    async fn read_until_broken<H: FrameHandler>(
        &self,
        source: &mut dyn FrameSource,
        handler: &mut H,
    ) -> Flow {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Flow::Stop,
                r = tokio::time::timeout(self.read_timeout, source.next_frame()) => r,
            };
            match next {
                Err(_) => {
                    let e = TransportError::ReadTimeout {
                        ms: self.read_timeout.as_millis() as u64,
                    };
                    tracing::warn!(error = %e, "read deadline exceeded");
                    return Flow::Reconnect;
                }
                Ok(None) => {
                    let e = TransportError::Closed;
                    tracing::info!(error = %e, "read ended");
                    return Flow::Reconnect;
                }
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %self.scrub(e), "read failed");
                    return Flow::Reconnect;
                }
                Ok(Some(Ok(frame))) => match handler.on_frame(frame).await {
                    Flow::Continue => {}
                    other => return other,
                },
            }
        }
    }
}
