//! Test utilities for scantrack-core
//!
//! This module provides testing infrastructure including a mock Receipt
//! Store server that can be used for development and integration tests. The
//! mock serves the same REST surface as the real store and computes its
//! analytics responses with this crate's own aggregation engine, so client
//! and engine stay in agreement.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::analytics::{self, MonthWindow};
use crate::models::{Analytics, CategoryStat, CategoryTrendMatrix, Receipt, ReceiptItem};
use crate::store::ReceiptPatch;

type SharedReceipts = Arc<Mutex<Vec<Receipt>>>;

/// Number of recent receipts the mock's analytics endpoint returns,
/// matching the real store's default.
const ANALYTICS_RECENT_LIMIT: usize = 10;

/// Mock Receipt Store server for testing and development
pub struct MockStoreServer {
    addr: SocketAddr,
    receipts: SharedReceipts,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockStoreServer {
    /// Start the mock server on an available port with the sample dataset.
    pub async fn start() -> Self {
        Self::start_with(sample_receipts()).await
    }

    /// Start the mock server with a caller-supplied dataset.
    pub async fn start_with(receipts: Vec<Receipt>) -> Self {
        let receipts: SharedReceipts = Arc::new(Mutex::new(receipts));

        let app = Router::new()
            .route("/health", get(handle_health))
            .route("/api/receipts", get(handle_list_receipts))
            .route(
                "/api/receipts/:id",
                get(handle_get_receipt)
                    .put(handle_update_receipt)
                    .delete(handle_delete_receipt),
            )
            .route("/api/analytics/expenses", get(handle_analytics))
            .route("/api/analytics/categories", get(handle_category_stats))
            .route("/api/analytics/monthly-trends", get(handle_monthly_trends))
            .with_state(receipts.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            receipts,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Snapshot of the receipts currently held by the mock store.
    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockStoreServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
struct MonthsParams {
    #[serde(default = "default_months")]
    months: u32,
}

fn default_months() -> u32 {
    12
}

async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn handle_list_receipts(
    State(receipts): State<SharedReceipts>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Receipt>> {
    let receipts = receipts.lock().unwrap();
    let page: Vec<Receipt> = receipts
        .iter()
        .skip(params.skip)
        .take(params.limit)
        .cloned()
        .collect();
    Json(page)
}

async fn handle_get_receipt(
    State(receipts): State<SharedReceipts>,
    Path(id): Path<i64>,
) -> Result<Json<Receipt>, (StatusCode, Json<Value>)> {
    let receipts = receipts.lock().unwrap();
    receipts
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn handle_update_receipt(
    State(receipts): State<SharedReceipts>,
    Path(id): Path<i64>,
    Json(patch): Json<ReceiptPatch>,
) -> Result<Json<Receipt>, (StatusCode, Json<Value>)> {
    let mut receipts = receipts.lock().unwrap();
    let receipt = receipts
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(not_found)?;

    if let Some(amount) = patch.total_amount {
        receipt.total_amount = Some(amount);
    }
    if let Some(merchant) = patch.merchant_name {
        receipt.merchant_name = Some(merchant);
    }
    if let Some(date) = patch.purchase_date {
        receipt.purchase_date = Some(date);
    }
    if let Some(items) = patch.items {
        receipt.items = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| ReceiptItem {
                id: id * 1000 + i as i64,
                receipt_id: id,
                item_name: item.item_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
                category: item.category,
                description: item.description,
            })
            .collect();
    }
    receipt.updated_at = Some(Utc::now());

    Ok(Json(receipt.clone()))
}

async fn handle_delete_receipt(
    State(receipts): State<SharedReceipts>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut receipts = receipts.lock().unwrap();
    let before = receipts.len();
    receipts.retain(|r| r.id != id);
    if receipts.len() == before {
        return Err(not_found());
    }
    Ok(Json(json!({"message": "Receipt deleted successfully"})))
}

async fn handle_analytics(
    State(receipts): State<SharedReceipts>,
    Query(params): Query<MonthsParams>,
) -> Json<Analytics> {
    let receipts = receipts.lock().unwrap();
    let window = MonthWindow::trailing(params.months, Utc::now().date_naive());
    Json(analytics::expense_analytics(
        &receipts,
        &window,
        ANALYTICS_RECENT_LIMIT,
    ))
}

async fn handle_category_stats(
    State(receipts): State<SharedReceipts>,
    Query(params): Query<MonthsParams>,
) -> Json<Vec<CategoryStat>> {
    let receipts = receipts.lock().unwrap();
    let window = MonthWindow::trailing(params.months, Utc::now().date_naive());
    Json(analytics::category_stats(&receipts, &window))
}

async fn handle_monthly_trends(
    State(receipts): State<SharedReceipts>,
    Query(params): Query<MonthsParams>,
) -> Json<CategoryTrendMatrix> {
    let receipts = receipts.lock().unwrap();
    let window = MonthWindow::trailing(params.months, Utc::now().date_naive());
    Json(analytics::monthly_trends(&receipts, &window))
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": "Receipt not found"})),
    )
}

/// Sample dataset with purchases spread over the last three months relative
/// to now, so default windows always contain it.
pub fn sample_receipts() -> Vec<Receipt> {
    let now = Utc::now();
    let item = |id: i64, receipt_id: i64, name: &str, category: Option<&str>, total: f64| {
        ReceiptItem {
            id,
            receipt_id,
            item_name: name.to_string(),
            quantity: 1.0,
            unit_price: total,
            total_price: total,
            category: category.map(str::to_string),
            description: None,
        }
    };

    vec![
        Receipt {
            id: 1,
            filename: "COSTCO_0912.jpg".to_string(),
            file_path: "uploads/COSTCO_0912.jpg".to_string(),
            total_amount: Some(127.43),
            merchant_name: Some("Costco".to_string()),
            purchase_date: Some((now - chrono::Duration::days(3)).date_naive()),
            created_at: Some(now - chrono::Duration::days(2)),
            updated_at: None,
            raw_text: Some("COSTCO WHOLESALE #123".to_string()),
            items: vec![
                item(10, 1, "Rotisserie Chicken", Some("Food & Dining"), 4.99),
                item(11, 1, "Paper Towels 12pk", Some("Household"), 24.99),
                item(12, 1, "Salmon Fillet", Some("Food & Dining"), 21.47),
            ],
        },
        Receipt {
            id: 2,
            filename: "shell_receipt.png".to_string(),
            file_path: "uploads/shell_receipt.png".to_string(),
            total_amount: Some(54.20),
            merchant_name: Some("Shell".to_string()),
            purchase_date: Some((now - chrono::Duration::days(40)).date_naive()),
            created_at: Some(now - chrono::Duration::days(39)),
            updated_at: None,
            raw_text: Some("SHELL OIL 57444".to_string()),
            items: vec![item(20, 2, "Unleaded", Some("Transportation"), 54.20)],
        },
        Receipt {
            id: 3,
            filename: "trader_joes.jpg".to_string(),
            file_path: "uploads/trader_joes.jpg".to_string(),
            total_amount: Some(63.18),
            merchant_name: Some("Trader Joe's".to_string()),
            purchase_date: Some((now - chrono::Duration::days(70)).date_naive()),
            created_at: Some(now - chrono::Duration::days(69)),
            updated_at: None,
            raw_text: None,
            items: vec![
                item(30, 3, "Bananas", Some("Food & Dining"), 1.99),
                item(31, 3, "Frozen Dumplings", Some("Food & Dining"), 12.47),
            ],
        },
        // Extraction failure: no amount, no merchant, no items
        Receipt {
            id: 4,
            filename: "blurry_scan.png".to_string(),
            file_path: "uploads/blurry_scan.png".to_string(),
            total_amount: None,
            merchant_name: None,
            purchase_date: None,
            created_at: Some(now - chrono::Duration::days(1)),
            updated_at: None,
            raw_text: None,
            items: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HttpStoreClient, ReceiptStore};

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockStoreServer::start().await;
        let client = HttpStoreClient::new(&server.url());

        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_lists_receipts() {
        let server = MockStoreServer::start().await;
        let client = HttpStoreClient::new(&server.url());

        let receipts = client.fetch_receipts(0, 100).await.unwrap();
        assert_eq!(receipts.len(), 4);

        let page = client.fetch_receipts(1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, 2);
    }

    #[tokio::test]
    async fn test_mock_server_missing_receipt_is_not_found() {
        let server = MockStoreServer::start().await;
        let client = HttpStoreClient::new(&server.url());

        let err = client.fetch_receipt(999).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mock_server_analytics_round_trip() {
        let server = MockStoreServer::start().await;
        let client = HttpStoreClient::new(&server.url());

        let analytics = client.fetch_analytics(12).await.unwrap();
        // 127.43 + 54.20 + 63.18; the extraction-failure receipt adds 0
        assert!((analytics.total_expenses - 244.81).abs() < 1e-9);
        assert!(!analytics.monthly_expenses.is_empty());
        assert_eq!(analytics.category_breakdown[0].category, "Transportation");
    }
}
