//! One-shot REST and JSON-RPC calls backed by `reqwest`.
//!
//! Every call is a single request: no retry, no batching. Failures are
//! returned to the caller as [`ApiError`].

use alloy::primitives::{Address, B256};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use poolwire_core::request::{BundleRequest, JsonRpcRequest, JsonRpcResponse};
use poolwire_core::{ChainId, ClientConfig, Endpoints};

use crate::error::ApiError;
use crate::types::{Bundle, PrivateTransaction, SimulationResult, Trace};

/// Header carrying the API key on private pool submissions.
const POOL_KEY_HEADER: &str = "X-MBS-Key";

/// HTTP client for the pool's one-shot endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self::with_http(http, config))
    }

    /// Reuse an existing `reqwest` client (connection pool, proxies, TLS).
    pub fn with_http(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            endpoints: config.endpoints.clone(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn require_key(&self) -> Result<&str, ApiError> {
        if self.api_key.trim().is_empty() {
            Err(ApiError::MissingCredential)
        } else {
            Ok(&self.api_key)
        }
    }

    fn redact(&self, text: &str) -> String {
        if self.api_key.trim().is_empty() {
            text.to_string()
        } else {
            text.replace(&self.api_key, "***")
        }
    }

    /// `{api_url}/{path}` with `Authorization: Token <key>`.
    fn api_request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let key = self.require_key()?;
        let url = format!("{}/{}", self.endpoints.api_url.trim_end_matches('/'), path);
        Ok(self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {key}")))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let resp = builder.send().await?;
        let status = resp.status();
        tracing::debug!(status = status.as_u16(), url = %self.redact(resp.url().as_str()), "response");
        if !status.is_success() {
            return Err(self.status_error(resp).await);
        }
        Ok(resp)
    }

    async fn status_error(&self, resp: Response) -> ApiError {
        let url = self.redact(resp.url().as_str());
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status, url = %url, "request rejected");
        ApiError::Status { url, status, body }
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST a JSON-RPC style body and return the string `result`.
    async fn rpc_result<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<String, ApiError> {
        let resp = self.execute(self.http.post(url).json(body)).await?;
        let ack: JsonRpcResponse = Self::json(resp).await?;
        match ack.into_result().map_err(ApiError::Rpc)? {
            serde_json::Value::String(result) => Ok(result),
            _ => Err(ApiError::MissingResult),
        }
    }

    /// Post a bid bundle to the relay. Returns the relay's submission id.
    pub async fn relay_bundle(&self, bundle: &BundleRequest) -> Result<String, ApiError> {
        tracing::debug!(txs = bundle.params.iter().map(|p| p.txs.len()).sum::<usize>(), "posting bundle to relay");
        self.rpc_result(&self.endpoints.relay_url, bundle).await
    }

    /// Propagation trace of a transaction. `Ok(None)` when the pool never saw it.
    pub async fn trace(&self, hash: B256) -> Result<Option<Trace>, ApiError> {
        let req = self.api_request(Method::GET, &format!("trace/{hash}"))?;
        let resp = req.send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Self::json(resp).await.map(Some),
            _ => Err(self.status_error(resp).await),
        }
    }

    /// Broadcast a signed transaction through `eth_sendRawTransaction`.
    /// Returns the transaction hash the remote acknowledged.
    pub async fn inject(&self, chain: ChainId, raw_tx_hex: &str) -> Result<B256, ApiError> {
        let key = self.require_key()?;
        let url = self
            .endpoints
            .inject_url(key, chain)
            .map_err(|e| ApiError::Endpoint(self.redact(&e.to_string())))?;
        let req = JsonRpcRequest::send_raw_transaction(1, raw_tx_hex);
        let result = self.rpc_result(url.as_str(), &req).await?;
        result.parse().map_err(|_| ApiError::InvalidResult(result))
    }

    /// Start receiving notifications for transactions touching `address`.
    pub async fn watch_address(&self, address: Address) -> Result<(), ApiError> {
        let req = self
            .api_request(Method::POST, "overwatch/addresses")?
            .json(&json!({ "address": address.to_string() }));
        self.execute(req).await.map(drop)
    }

    pub async fn unwatch_address(&self, address: Address) -> Result<(), ApiError> {
        let req = self.api_request(Method::DELETE, &format!("overwatch/addresses/{address}"))?;
        self.execute(req).await.map(drop)
    }

    /// Declare a transaction as one of yours so it can be tracked.
    pub async fn declare(&self, chain: ChainId, hash: B256) -> Result<(), ApiError> {
        let req = self
            .api_request(Method::POST, "overwatch/declare")?
            .json(&json!({ "hash": hash.to_string(), "chainId": chain.id() }));
        self.execute(req).await.map(drop)
    }

    pub async fn simulate_bundle(&self, bundle: &Bundle) -> Result<SimulationResult, ApiError> {
        let req = self.api_request(Method::POST, "simulate")?.json(bundle);
        let resp = self.execute(req).await?;
        Self::json(resp).await
    }

    /// Submit transactions to the private pool.
    pub async fn send_private_transaction(&self, tx: &PrivateTransaction) -> Result<(), ApiError> {
        let key = self.require_key()?;
        let url = format!("{}/transactions", self.endpoints.pool_url.trim_end_matches('/'));
        let req = self.http.post(url).header(POOL_KEY_HEADER, key).json(tx);
        self.execute(req).await.map(drop)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoints", &self.endpoints)
            .field("has_credential", &!self.api_key.trim().is_empty())
            .finish()
    }
}
