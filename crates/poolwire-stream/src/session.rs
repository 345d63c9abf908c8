//! Stream sessions: pending transactions and auction notices.
//!
//! Transaction sessions run two loops joined by an internal queue: the
//! supervisor's read loop forwards raw frames, the decode loop turns them
//! into [`DecodedTransaction`]s and drops what does not decode. Auction
//! sessions decode inline in the read loop so every auction can be tagged
//! with the connection it arrived on.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use poolwire_core::decoder::decode_transaction_frame;
use poolwire_core::{
    Auction, AuctionDecoder, ChainId, ClientConfig, ConnectionRef, ConnectionRegistry, Connector,
    DecodedTransaction, Frame, FrameSink, ReassemblyError, StreamError,
};

use crate::metrics::StreamMetrics;
use crate::subscription::{Outlet, Subscription};
use crate::supervisor::{Flow, FrameHandler, Supervisor};

fn supervisor(
    config: &ClientConfig,
    connector: &Arc<dyn Connector>,
    url: String,
    cancel: &CancellationToken,
    metrics: &StreamMetrics,
) -> Supervisor {
    Supervisor {
        connector: Arc::clone(connector),
        url,
        secret: config.api_key.clone(),
        read_timeout: config.stream.read_timeout(),
        policy: config.stream.reconnect_policy(),
        cancel: cancel.clone(),
        metrics: metrics.clone(),
    }
}

// ─── transactions ──────────────────────────────────────────────────────────

/// Item on the queue between the read loop and the decode loop.
enum Queued {
    Frame(Frame),
    /// The read loop has given up; delivered after every frame queued before it.
    Fatal(StreamError),
}

/// Read-loop side of a transaction session: forwards frames undecoded.
struct FrameForwarder {
    queue: mpsc::Sender<Queued>,
    sink: Option<Box<dyn FrameSink>>,
    cancel: CancellationToken,
}

#[async_trait]
impl FrameHandler for FrameForwarder {
    async fn on_connect(&mut self, sink: Box<dyn FrameSink>) {
        self.sink = Some(sink);
    }

    async fn on_frame(&mut self, frame: Frame) -> Flow {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Flow::Stop,
            sent = self.queue.send(Queued::Frame(frame)) => match sent {
                Ok(()) => Flow::Continue,
                Err(_) => Flow::Stop,
            },
        }
    }

    async fn on_disconnect(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.close().await;
        }
    }
}

/// Opens pending-transaction sessions, one chain per session.
#[derive(Clone)]
pub struct TransactionStream {
    config: Arc<ClientConfig>,
    connector: Arc<dyn Connector>,
}

impl TransactionStream {
    pub fn new(config: Arc<ClientConfig>, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    /// Start streaming pending transactions of `chain`.
    ///
    /// Never fails: a missing credential or a bad endpoint is delivered as the
    /// subscription's only error. Must be called inside a Tokio runtime.
    pub fn open(&self, chain: ChainId) -> Subscription<DecodedTransaction> {
        if !self.config.has_credential() {
            return Subscription::failed(StreamError::MissingCredential);
        }
        let url = match self
            .config
            .endpoints
            .transactions_url(&self.config.api_key, chain)
        {
            Ok(url) => url,
            Err(e) => {
                let reason = self.config.redact(&e.to_string());
                return Subscription::failed(StreamError::InvalidEndpoint(reason));
            }
        };

        let cancel = CancellationToken::new();
        let metrics = StreamMetrics::new();
        let capacity = self.config.stream.channel_capacity;
        let (mut subscription, outlet) = Subscription::channel(capacity, cancel.clone(), metrics.clone());
        let (queue_tx, queue_rx) = mpsc::channel(capacity.max(1));

        let supervisor = supervisor(&self.config, &self.connector, url.into(), &cancel, &metrics);
        let read_cancel = cancel.clone();
        let read_loop = async move {
            let mut forwarder = FrameForwarder {
                queue: queue_tx,
                sink: None,
                cancel: read_cancel.clone(),
            };
            if let Err(err) = supervisor.run(&mut forwarder).await {
                tokio::select! {
                    biased;
                    _ = read_cancel.cancelled() => {}
                    _ = forwarder.queue.send(Queued::Fatal(err)) => {}
                }
            }
        };

        let span = tracing::info_span!("transactions", chain = %chain);
        subscription.attach(tokio::spawn(read_loop.instrument(span.clone())));
        subscription.attach(tokio::spawn(
            decode_loop(queue_rx, outlet, cancel, metrics).instrument(span),
        ));
        subscription
    }
}

async fn decode_loop(
    mut queue: mpsc::Receiver<Queued>,
    outlet: Outlet<DecodedTransaction>,
    cancel: CancellationToken,
    metrics: StreamMetrics,
) {
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            item = queue.recv() => item,
        };
        let frame = match item {
            None => return,
            Some(Queued::Fatal(err)) => return outlet.fail(err).await,
            Some(Queued::Frame(frame)) => frame,
        };
        let tx = match decode_transaction_frame(&frame) {
            Ok(tx) => tx,
            Err(e) => {
                metrics.message_dropped();
                tracing::debug!(error = %e, kind = frame.kind(), len = frame.len(), "dropping undecodable transaction");
                continue;
            }
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            sent = outlet.events.send(tx) => match sent {
                Ok(()) => metrics.event_delivered(),
                Err(_) => {
                    tracing::debug!("event receiver dropped, stopping");
                    cancel.cancel();
                    return;
                }
            },
        }
    }
}

// ─── auctions ──────────────────────────────────────────────────────────────

/// Auction session handler: reassembles, decodes and tags notices with the
/// generation of the connection they arrived on.
struct AuctionHandler {
    decoder: AuctionDecoder,
    registry: Arc<ConnectionRegistry>,
    connection: Option<ConnectionRef>,
    events: mpsc::Sender<Auction>,
    cancel: CancellationToken,
    metrics: StreamMetrics,
}

#[async_trait]
impl FrameHandler for AuctionHandler {
    async fn on_connect(&mut self, sink: Box<dyn FrameSink>) {
        let generation = self.registry.install(sink).await;
        tracing::debug!(generation, "auction connection installed");
        self.connection = Some(self.registry.reference(generation));
        self.decoder.reset();
    }

    async fn on_frame(&mut self, frame: Frame) -> Flow {
        let auction = match self.decoder.feed(frame, self.connection.as_ref()) {
            Ok(Some(auction)) => auction,
            Ok(None) => return Flow::Continue,
            Err(e @ ReassemblyError::Invalid { .. }) => {
                self.metrics.protocol_error();
                tracing::warn!(error = %e, "dropping invalid auction notice");
                return Flow::Continue;
            }
            Err(e) => {
                self.metrics.protocol_error();
                tracing::warn!(error = %e, "discarding auction stream position");
                return Flow::Reconnect;
            }
        };
        tracing::debug!(id = %auction.id, chain = %auction.chain_id, "auction received");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Flow::Stop,
            sent = self.events.send(auction) => match sent {
                Ok(()) => {
                    self.metrics.event_delivered();
                    Flow::Continue
                }
                Err(_) => {
                    tracing::debug!("event receiver dropped, stopping");
                    Flow::Stop
                }
            },
        }
    }

    async fn on_disconnect(&mut self) {
        self.registry.retire().await;
        self.connection = None;
        self.decoder.reset();
    }
}

/// Opens auction sessions.
#[derive(Clone)]
pub struct AuctionStream {
    config: Arc<ClientConfig>,
    connector: Arc<dyn Connector>,
}

impl AuctionStream {
    pub fn new(config: Arc<ClientConfig>, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    /// Start streaming auction notices.
    ///
    /// Every delivered [`Auction`] references the connection it arrived on,
    /// so a bid can be written back on the same socket while it is current.
    /// Never fails; see [`TransactionStream::open`].
    pub fn open(&self) -> Subscription<Auction> {
        if !self.config.has_credential() {
            return Subscription::failed(StreamError::MissingCredential);
        }
        let url = match self.config.endpoints.auctions_url(&self.config.api_key) {
            Ok(url) => url,
            Err(e) => {
                let reason = self.config.redact(&e.to_string());
                return Subscription::failed(StreamError::InvalidEndpoint(reason));
            }
        };

        let cancel = CancellationToken::new();
        let metrics = StreamMetrics::new();
        let (mut subscription, outlet) =
            Subscription::channel(self.config.stream.channel_capacity, cancel.clone(), metrics.clone());

        let supervisor = supervisor(&self.config, &self.connector, url.into(), &cancel, &metrics);
        let limits = self.config.reassembly;
        let session = async move {
            let mut handler = AuctionHandler {
                decoder: AuctionDecoder::new(limits),
                registry: ConnectionRegistry::new(),
                connection: None,
                events: outlet.events.clone(),
                cancel,
                metrics,
            };
            let result = supervisor.run(&mut handler).await;
            // outstanding `ConnectionRef`s now report the connection as closed
            drop(handler);
            if let Err(err) = result {
                outlet.fail(err).await;
            }
        };

        subscription.attach(tokio::spawn(session.instrument(tracing::info_span!("auctions"))));
        subscription
    }
}
