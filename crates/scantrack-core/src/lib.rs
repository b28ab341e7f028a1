//! Scantrack Core Library
//!
//! Shared functionality for the Scantrack receipt analytics client:
//! - Domain models for receipts, line items and derived analytics values
//! - Query engine: search / category filter / stable sort for the list view
//! - Aggregation engine: totals, monthly series, category breakdowns and
//!   stats, and the sparse month-by-category trend matrix
//! - Receipt Store Service client (trait seam + HTTP implementation)
//! - Versioned collection slot that discards stale fetch responses
//! - CSV/JSON export

pub mod analytics;
pub mod collection;
pub mod error;
pub mod export;
pub mod models;
pub mod query;
pub mod store;

/// Test utilities including the mock Receipt Store server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analytics::{
    category_stats, dense_monthly_series, expense_analytics, monthly_trends, share_of_total,
    windowed, MonthWindow,
};
pub use collection::{FetchToken, ReceiptCollection, Versioned};
pub use error::{Error, Result};
pub use export::{ExportFormat, ExportInfo, JsonExport};
pub use models::{
    Analytics, CategoryBreakdown, CategoryStat, CategoryTrendMatrix, MonthKey, MonthlyExpense,
    Receipt, ReceiptItem, SortKey, UNCATEGORIZED_LABEL,
};
pub use query::{distinct_categories, filter_and_sort, uncategorized_item_count};
pub use store::{
    fetch_all_receipts, HttpStoreClient, ReceiptItemPatch, ReceiptPatch, ReceiptStore,
};
