//! HTTP client for the remote inventory service.
//!
//! Only the read endpoints the controller depends on are covered. The
//! [`InventoryService`] trait is the seam the dashboard talks through, so
//! tests can substitute an in-process fake.

pub mod types;

use async_trait::async_trait;
use reqwest::header;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::query::{OverviewParams, ProductSearchParams};
use crate::tracing::prelude::*;
use types::{LowStockCount, Page, Product, SettingsResponse, StockOverviewItem};

const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Read access to the inventory service.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// `GET /stock/overview`
    async fn stock_overview(&self, params: &OverviewParams) -> Result<Page<StockOverviewItem>>;

    /// `GET /products`
    async fn search_products(&self, params: &ProductSearchParams) -> Result<Page<Product>>;

    /// `GET /settings`
    async fn settings(&self) -> Result<SettingsResponse>;

    /// `GET /stock/low/count`
    async fn low_stock_count(&self) -> Result<LowStockCount>;
}

/// reqwest-backed [`InventoryService`].
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl Client {
    /// Client for the default local service URL.
    pub fn new() -> Self {
        Self::with_base_url(crate::config::DEFAULT_API_URL)
    }

    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Client honoring the configured URL, token and request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        trace!(url = %url, ?query, "GET");

        let mut request = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(query);
        if let Some(token) = &self.access_token {
            request = request.header(header::COOKIE, format!("{ACCESS_TOKEN_COOKIE}={token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = api_error(status.as_u16(), &body);
            debug!(url = %url, status = status.as_u16(), error = %err, "Request failed");
            return Err(err);
        }

        Ok(response.json().await?)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryService for Client {
    async fn stock_overview(&self, params: &OverviewParams) -> Result<Page<StockOverviewItem>> {
        self.get("/stock/overview", &params.query_pairs()).await
    }

    async fn search_products(&self, params: &ProductSearchParams) -> Result<Page<Product>> {
        self.get("/products", &params.query_pairs()).await
    }

    async fn settings(&self) -> Result<SettingsResponse> {
        self.get("/settings", &[]).await
    }

    async fn low_stock_count(&self) -> Result<LowStockCount> {
        self.get("/stock/low/count", &[]).await
    }
}

/// Build the error for a non-success response.
///
/// The service reports failures as `{"detail": "..."}`; validation errors
/// carry a non-string `detail`, which falls back to the generic message.
fn api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("detail")
                .and_then(|detail| detail.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    Error::Api { status, message }
}
