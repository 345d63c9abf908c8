//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::chain::ChainId;
use crate::error::StreamError;
use crate::policy::ReconnectPolicy;
use crate::reassembly::ReassemblyLimits;

/// Remote endpoints of the pool service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Transaction stream base; the API key and chain id are appended as path segments.
    #[serde(default = "default_transactions_ws")]
    pub transactions_ws: String,
    /// Auction stream; the API key is passed as the `apiKey` query parameter.
    #[serde(default = "default_auctions_ws")]
    pub auctions_ws: String,
    /// Bundle relay used for bids that cannot go over a live auction connection.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// REST API base (trace, overwatch, simulation).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Private pool submission base.
    #[serde(default = "default_pool_url")]
    pub pool_url: String,
    /// Transaction injection base; the API key and chain id are appended as path segments.
    #[serde(default = "default_inject_url")]
    pub inject_url: String,
}

fn default_transactions_ws() -> String { "wss://txs.merkle.io/ws".into() }
fn default_auctions_ws() -> String { "wss://mempool.merkle.io/stream/auctions".into() }
fn default_relay_url() -> String { "https://pool.merkle.io/relay".into() }
fn default_api_url() -> String { "https://mbs-api.merkle.io/v1".into() }
fn default_pool_url() -> String { "https://mempool.merkle.io".into() }
fn default_inject_url() -> String { "https://txs.merkle.io/rpc".into() }

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            transactions_ws: default_transactions_ws(),
            auctions_ws: default_auctions_ws(),
            relay_url: default_relay_url(),
            api_url: default_api_url(),
            pool_url: default_pool_url(),
            inject_url: default_inject_url(),
        }
    }
}

/// Append non-empty path segments to `base`.
fn with_segments(base: &str, segments: &[&str]) -> Result<Url, StreamError> {
    let mut url = Url::parse(base).map_err(|e| StreamError::InvalidEndpoint(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| StreamError::InvalidEndpoint(format!("{base}: cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl Endpoints {
    /// `{transactions_ws}/{api_key}/{chain_id}`
    pub fn transactions_url(&self, api_key: &str, chain: ChainId) -> Result<Url, StreamError> {
        with_segments(&self.transactions_ws, &[api_key, &chain.id().to_string()])
    }

    /// `{auctions_ws}?apiKey={api_key}`
    pub fn auctions_url(&self, api_key: &str) -> Result<Url, StreamError> {
        let mut url = Url::parse(&self.auctions_ws)
            .map_err(|e| StreamError::InvalidEndpoint(format!("{}: {e}", self.auctions_ws)))?;
        url.query_pairs_mut().append_pair("apiKey", api_key);
        Ok(url)
    }

    /// `{inject_url}/{api_key}/{chain_id}`
    pub fn inject_url(&self, api_key: &str, chain: ChainId) -> Result<Url, StreamError> {
        with_segments(&self.inject_url, &[api_key, &chain.id().to_string()])
    }
}

/// Persistent-connection behaviour shared by both stream kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Inactivity deadline for every read.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Fixed pause before every re-dial.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Consecutive dial failures before the session gives up; `null` = never.
    #[serde(default = "default_max_dial_attempts")]
    pub max_dial_attempts: Option<u32>,
    /// Capacity of the event channel. 1 makes every send wait for the consumer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_read_timeout_ms() -> u64 { 5_000 }
fn default_reconnect_delay_ms() -> u64 { 1_000 }
fn default_max_dial_attempts() -> Option<u32> { Some(5) }
fn default_channel_capacity() -> usize { 1 }

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_dial_attempts: default_max_dial_attempts(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl StreamSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            Duration::from_millis(self.reconnect_delay_ms),
            self.max_dial_attempts,
        )
    }
}

/// Top-level configuration. Read-only once a session has been opened;
/// a different key, endpoint or chain needs a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub reassembly: ReassemblyLimits,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

fn default_http_timeout_ms() -> u64 { 30_000 }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoints: Endpoints::default(),
            stream: StreamSettings::default(),
            reassembly: ReassemblyLimits::default(),
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Defaults, overridden by `POOLWIRE_API_KEY` and the `POOLWIRE_*_URL`
    /// endpoint variables when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(key) = lookup("POOLWIRE_API_KEY") {
            config.api_key = key;
        }
        let endpoints = &mut config.endpoints;
        for (var, slot) in [
            ("POOLWIRE_TRANSACTIONS_URL", &mut endpoints.transactions_ws),
            ("POOLWIRE_AUCTIONS_URL", &mut endpoints.auctions_ws),
            ("POOLWIRE_RELAY_URL", &mut endpoints.relay_url),
            ("POOLWIRE_API_URL", &mut endpoints.api_url),
            ("POOLWIRE_POOL_URL", &mut endpoints.pool_url),
            ("POOLWIRE_INJECT_URL", &mut endpoints.inject_url),
        ] {
            if let Some(url) = lookup(var) {
                *slot = url;
            }
        }
        config
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// `text` with every occurrence of the API key masked, for logging.
    pub fn redact(&self, text: &str) -> String {
        if self.has_credential() {
            text.replace(&self.api_key, "***")
        } else {
            text.to_string()
        }
    }
}
