//! REST API client for OKX

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::auth::generate_auth_headers;
use super::messages::*;
use crate::common::errors::{MonitorError, Result};
use crate::config::types::ApiCredentials;

/// REST API client for OKX
#[derive(Debug, Clone)]
pub struct OkxRestClient {
    /// HTTP client
    client: Client,
    /// Base URL for the REST API
    base_url: String,
    /// Optional API credentials for account endpoints
    credentials: Option<ApiCredentials>,
}

impl OkxRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).map_err(|e| {
            MonitorError::Configuration(format!("Invalid OKX URL {}: {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Set API credentials for authenticated requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    // ========================================================================
    // Public Endpoints (No Authentication Required)
    // ========================================================================

    /// Get the last price of every spot instrument
    #[instrument(skip(self))]
    pub async fn get_spot_tickers(&self) -> Result<Vec<TickerData>> {
        self.get("/api/v5/market/tickers?instType=SPOT", false).await
    }

    /// Get candles for an instrument, newest first as OKX returns them
    ///
    /// # Arguments
    /// * `inst_id` - Instrument id (e.g. `BTC-USDT`)
    /// * `bar` - Bar size (e.g. `1D`, `1H`)
    /// * `limit` - Maximum number of candles (OKX caps this at 300)
    #[instrument(skip(self))]
    pub async fn get_candles(
        &self,
        inst_id: &str,
        bar: &str,
        limit: usize,
    ) -> Result<Vec<CandleRow>> {
        let path = format!(
            "/api/v5/market/candles?instId={}&bar={}&limit={}",
            inst_id, bar, limit
        );
        self.get(&path, false).await
    }

    // ========================================================================
    // Account Endpoints (Authentication Required)
    // ========================================================================

    /// Get trading account balances
    #[instrument(skip(self))]
    pub async fn get_account_balance(&self) -> Result<Vec<AccountBalance>> {
        self.get("/api/v5/account/balance", true).await
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Issue a GET and unwrap the OKX envelope
    async fn get<T: DeserializeOwned>(&self, path: &str, authenticated: bool) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching from: {}", url);

        let mut request = self.client.get(&url);
        if authenticated {
            let creds = self.credentials.as_ref().ok_or_else(|| {
                MonitorError::Authentication("OKX API credentials are not configured".to_string())
            })?;
            let headers = generate_auth_headers(
                &creds.api_key,
                &creds.api_secret,
                &creds.passphrase,
                "GET",
                path,
                "",
            )?;
            request = headers.apply_to_request(request);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::InvalidResponse(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let envelope: OkxResponse<T> = response.json().await?;
        if !envelope.is_ok() {
            return Err(MonitorError::InvalidResponse(format!(
                "OKX error {}: {}",
                envelope.code, envelope.msg
            )));
        }

        Ok(envelope.data)
    }
}
