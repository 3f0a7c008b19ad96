//! HTTP client for the TON API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::types::{Account, Seqno, ServerTime, TransferEstimation};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a tonapi-shaped HTTP endpoint.
///
/// Stateless: every call fetches fresh data, nothing is cached or retried.
#[derive(Debug, Clone)]
pub struct TonApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TonApiClient {
    /// Create a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: None,
        })
    }

    /// Attach an API key, sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Fetch account state (balance and status).
    pub async fn get_account(&self, address: &str) -> ApiResult<Account> {
        debug!(address, "fetching account state");
        self.get(&format!("/v2/accounts/{address}")).await
    }

    /// Fetch the wallet contract's current seqno.
    ///
    /// Returns 0 for wallets that are not deployed yet, matching the
    /// contract's initial data.
    pub async fn get_seqno(&self, address: &str) -> ApiResult<u32> {
        debug!(address, "fetching seqno");
        let seqno: Seqno = self.get(&format!("/v2/wallet/{address}/seqno")).await?;
        Ok(seqno.seqno)
    }

    /// Fetch the server's unix time.
    pub async fn get_server_time(&self) -> ApiResult<u64> {
        let time: ServerTime = self.get("/v2/liteserver/get_time").await?;
        Ok(time.time)
    }

    /// Emulate an external message without submitting it.
    ///
    /// `ignore_signature_check` lets a placeholder-signed message through
    /// the contract's signature verification.
    pub async fn emulate(
        &self,
        boc: &str,
        ignore_signature_check: bool,
    ) -> ApiResult<TransferEstimation> {
        debug!(ignore_signature_check, "emulating message");
        self.post(
            "/v2/wallet/emulate",
            &json!({
                "boc": boc,
                "ignore_signature_check": ignore_signature_check,
            }),
        )
        .await
    }

    /// Submit an external message to the network.
    pub async fn send_boc(&self, boc: &str) -> ApiResult<()> {
        debug!("sending message");
        let response = self
            .request(reqwest::Method::POST, "/v2/blockchain/message")
            .json(&json!({ "boc": boc }))
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> ApiResult<T> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let body = Self::check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> ApiResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
