//! The caller's handle on one stream session: an event channel, an error
//! channel, counters, and the means to stop the session's loops.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use poolwire_core::StreamError;

use crate::metrics::{MetricsSnapshot, StreamMetrics};

/// Producer side of a subscription, held by the session loops.
pub(crate) struct Outlet<T> {
    pub events: mpsc::Sender<T>,
    pub errors: mpsc::Sender<StreamError>,
}

impl<T> Outlet<T> {
    /// Push the session's one terminal error.
    pub async fn fail(self, err: StreamError) {
        tracing::error!(error = %err, "stream session failed");
        let _ = self.errors.send(err).await;
    }
}

/// Events and errors of one stream session.
///
/// Events are delivered in wire order within one connection's lifetime.
/// At most one error is ever delivered; no events follow it. Dropping the
/// subscription cancels the session.
pub struct Subscription<T> {
    events: mpsc::Receiver<T>,
    errors: mpsc::Receiver<StreamError>,
    metrics: StreamMetrics,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    pub(crate) fn channel(
        capacity: usize,
        cancel: CancellationToken,
        metrics: StreamMetrics,
    ) -> (Self, Outlet<T>) {
        let (events_tx, events_rx) = mpsc::channel(capacity.max(1));
        let (errors_tx, errors_rx) = mpsc::channel(1);
        let subscription = Self {
            events: events_rx,
            errors: errors_rx,
            metrics,
            cancel,
            tasks: Vec::new(),
        };
        (subscription, Outlet { events: events_tx, errors: errors_tx })
    }

    /// A subscription that has already failed; no loop is started.
    pub(crate) fn failed(err: StreamError) -> Self {
        let (subscription, outlet) = Self::channel(1, CancellationToken::new(), StreamMetrics::new());
        tracing::error!(error = %err, "stream session not started");
        // capacity 1 and nothing sent yet
        let _ = outlet.errors.try_send(err);
        subscription
    }

    pub(crate) fn attach(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Next event, or `None` once the session has ended.
    pub async fn next_event(&mut self) -> Option<T> {
        self.events.recv().await
    }

    /// The terminal error, or `None` if the session ended without one.
    pub async fn next_error(&mut self) -> Option<StreamError> {
        self.errors.recv().await
    }

    /// Next item from either channel. Buffered events are returned before the
    /// terminal error; `None` once both channels are drained and closed.
    pub async fn next(&mut self) -> Option<Result<T, StreamError>> {
        tokio::select! {
            biased;
            Some(event) = self.events.recv() => Some(Ok(event)),
            Some(err) = self.errors.recv() => Some(Err(err)),
            else => None,
        }
    }

    pub fn events(&mut self) -> &mut mpsc::Receiver<T> {
        &mut self.events
    }

    pub fn errors(&mut self) -> &mut mpsc::Receiver<StreamError> {
        &mut self.errors
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// True once every loop of the session has returned.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Stop the session and wait for its loops to return.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "stream task ended abnormally");
            }
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("metrics", &self.metrics.snapshot())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_subscription_yields_one_error_then_ends() {
        let mut sub = Subscription::<u32>::failed(StreamError::MissingCredential);
        assert!(matches!(sub.next().await, Some(Err(StreamError::MissingCredential))));
        assert!(sub.next().await.is_none());
        assert!(sub.is_finished());
    }

    #[tokio::test]
    async fn buffered_events_come_before_the_error() {
        let (mut sub, outlet) =
            Subscription::<u32>::channel(4, CancellationToken::new(), StreamMetrics::new());
        outlet.events.send(1).await.unwrap();
        outlet.events.send(2).await.unwrap();
        let Outlet { events, errors } = outlet;
        drop(events);
        errors.send(StreamError::MissingCredential).await.unwrap();
        drop(errors);

        assert_eq!(sub.next().await.unwrap().unwrap(), 1);
        assert_eq!(sub.next().await.unwrap().unwrap(), 2);
        assert!(sub.next().await.unwrap().is_err());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn drop_cancels_the_session() {
        let cancel = CancellationToken::new();
        let (sub, _outlet) = Subscription::<u32>::channel(1, cancel.clone(), StreamMetrics::new());
        drop(sub);
        assert!(cancel.is_cancelled());
    }
}
