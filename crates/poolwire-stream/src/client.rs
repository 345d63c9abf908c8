//! `Client`: builds every sub-client once from one configuration.

use std::sync::Arc;

use poolwire_core::{ClientConfig, Connector};
use poolwire_http::{ApiClient, ApiError};

use crate::bid::BidSubmitter;
use crate::session::{AuctionStream, TransactionStream};
use crate::ws::WsConnector;

/// Entry point: transaction and auction streams, bidding and one-shot calls.
///
/// # Example
/// ```no_run
/// use poolwire_core::{ChainId, ClientConfig};
/// use poolwire_stream::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new(ClientConfig::with_api_key("sk_..."))?;
/// let mut auctions = client.auctions().open();
/// while let Some(item) = auctions.next().await {
///     let auction = item?;
///     println!("{} closes at {}", auction.id, auction.closes_at);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transactions: TransactionStream,
    auctions: AuctionStream,
    bids: BidSubmitter,
    api: ApiClient,
}

impl Client {
    /// Client dialing real WebSocket endpoints.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Client dialing through `connector`.
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let config = Arc::new(config);
        Ok(Self {
            transactions: TransactionStream::new(Arc::clone(&config), Arc::clone(&connector)),
            auctions: AuctionStream::new(Arc::clone(&config), connector),
            bids: BidSubmitter::new(api.clone()),
            api,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transactions(&self) -> &TransactionStream {
        &self.transactions
    }

    pub fn auctions(&self) -> &AuctionStream {
        &self.auctions
    }

    pub fn bids(&self) -> &BidSubmitter {
        &self.bids
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoints", &self.config.endpoints)
            .field("has_credential", &self.config.has_credential())
            .finish()
    }
}
