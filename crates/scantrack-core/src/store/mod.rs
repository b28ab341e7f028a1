//! Receipt Store Service boundary
//!
//! The store persists receipts and runs OCR/extraction upstream; this crate
//! only consumes its output. `ReceiptStore` is the seam: the production
//! implementation is [`HttpStoreClient`], and the `test-utils` mock server
//! exercises the same trait in tests.

mod http;

pub use http::{HttpStoreClient, STORE_URL_ENV};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Analytics, CategoryStat, CategoryTrendMatrix, Receipt};

/// Client-side view of the Receipt Store Service API.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Page of receipts in store order.
    async fn fetch_receipts(&self, skip: u32, limit: u32) -> Result<Vec<Receipt>>;

    /// Single receipt with its items.
    async fn fetch_receipt(&self, id: i64) -> Result<Receipt>;

    /// Pre-aggregated analytics for a trailing window of `months`.
    async fn fetch_analytics(&self, months: u32) -> Result<Analytics>;

    /// Pre-aggregated per-category statistics for a trailing window.
    async fn fetch_category_stats(&self, months: u32) -> Result<Vec<CategoryStat>>;

    /// Pre-aggregated month-by-category trend matrix for a trailing window.
    async fn fetch_monthly_trends(&self, months: u32) -> Result<CategoryTrendMatrix>;

    /// Update a receipt. Opaque to the engines; callers refetch and
    /// recompute derived views afterwards.
    async fn update_receipt(&self, id: i64, patch: &ReceiptPatch) -> Result<Receipt>;

    /// Delete a receipt. Same recompute obligation as updates.
    async fn delete_receipt(&self, id: i64) -> Result<()>;

    /// Whether the store answers its health endpoint.
    async fn health_check(&self) -> bool;
}

/// Partial update for a receipt; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    /// When present, replaces the item list wholesale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ReceiptItemPatch>>,
}

/// Replacement line item for a receipt update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptItemPatch {
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Drain the listing endpoint page by page.
///
/// The engines want the whole collection for the active view; the store
/// paginates. Stops on the first short page.
pub async fn fetch_all_receipts(
    store: &dyn ReceiptStore,
    page_size: u32,
) -> Result<Vec<Receipt>> {
    let mut all = Vec::new();
    let mut skip = 0;
    loop {
        let page = store.fetch_receipts(skip, page_size).await?;
        let fetched = page.len();
        all.extend(page);
        if fetched < page_size as usize {
            break;
        }
        skip += page_size;
    }
    Ok(all)
}
