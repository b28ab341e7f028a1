//! HTTP client for the Receipt Store Service
//!
//! Thin reqwest wrapper over the store's REST API:
//!
//! - `GET  /api/receipts?skip=&limit=`
//! - `GET  /api/receipts/{id}`
//! - `PUT  /api/receipts/{id}`
//! - `DELETE /api/receipts/{id}`
//! - `GET  /api/analytics/expenses?months=`
//! - `GET  /api/analytics/categories?months=`
//! - `GET  /api/analytics/monthly-trends?months=`
//! - `GET  /health`

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Analytics, CategoryStat, CategoryTrendMatrix, Receipt};

use super::{ReceiptPatch, ReceiptStore};

/// Environment variable holding the store base URL.
pub const STORE_URL_ENV: &str = "SCANTRACK_STORE_URL";

/// Production [`ReceiptStore`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStoreClient {
    http_client: Client,
    base_url: String,
}

impl HttpStoreClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from the `SCANTRACK_STORE_URL` environment variable.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(STORE_URL_ENV).ok()?;
        Some(Self::new(&url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to `Error::Store`, extracting the store's
    /// `{"detail": ...}` body when present.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        #[derive(Deserialize)]
        struct Detail {
            detail: String,
        }

        let message = match response.json::<Detail>().await {
            Ok(body) => body.detail,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(message));
        }
        Err(Error::Store {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ReceiptStore for HttpStoreClient {
    async fn fetch_receipts(&self, skip: u32, limit: u32) -> Result<Vec<Receipt>> {
        debug!(skip, limit, "Fetching receipts");
        let response = self
            .http_client
            .get(self.url("/api/receipts"))
            .query(&[("skip", skip), ("limit", limit)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_receipt(&self, id: i64) -> Result<Receipt> {
        debug!(id, "Fetching receipt");
        let response = self
            .http_client
            .get(self.url(&format!("/api/receipts/{}", id)))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_analytics(&self, months: u32) -> Result<Analytics> {
        debug!(months, "Fetching expense analytics");
        let response = self
            .http_client
            .get(self.url("/api/analytics/expenses"))
            .query(&[("months", months)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_category_stats(&self, months: u32) -> Result<Vec<CategoryStat>> {
        debug!(months, "Fetching category stats");
        let response = self
            .http_client
            .get(self.url("/api/analytics/categories"))
            .query(&[("months", months)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn fetch_monthly_trends(&self, months: u32) -> Result<CategoryTrendMatrix> {
        debug!(months, "Fetching monthly trends");
        let response = self
            .http_client
            .get(self.url("/api/analytics/monthly-trends"))
            .query(&[("months", months)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_receipt(&self, id: i64, patch: &ReceiptPatch) -> Result<Receipt> {
        debug!(id, "Updating receipt");
        let response = self
            .http_client
            .put(self.url(&format!("/api/receipts/{}", id)))
            .json(patch)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_receipt(&self, id: i64) -> Result<()> {
        debug!(id, "Deleting receipt");
        let response = self
            .http_client
            .delete(self.url(&format!("/api/receipts/{}", id)))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self.http_client.get(self.url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, url = %self.base_url, "Store health check failed");
                false
            }
        }
    }
}
