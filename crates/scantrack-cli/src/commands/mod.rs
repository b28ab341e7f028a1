//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `export` - Receipt data export (CSV, JSON)
//! - `receipts` - Receipt browsing commands (list, show, delete)
//! - `reports` - Analytics report commands and the dashboard
//! - `status` - Store connectivity check

pub mod export;
pub mod receipts;
pub mod reports;
pub mod status;

// Re-export command functions for main.rs
pub use export::*;
pub use receipts::*;
pub use reports::*;
pub use status::*;

use scantrack_core::store::{HttpStoreClient, STORE_URL_ENV};

/// Default store URL when neither the flag nor the environment names one.
pub const DEFAULT_STORE_URL: &str = "http://localhost:8000";

/// Resolve the store client: --store-url flag > SCANTRACK_STORE_URL > default.
pub fn open_store(url_flag: Option<&str>) -> HttpStoreClient {
    match url_flag {
        Some(url) => HttpStoreClient::new(url),
        None => HttpStoreClient::from_env().unwrap_or_else(|| {
            tracing::debug!(
                "{} not set, using default store URL {}",
                STORE_URL_ENV,
                DEFAULT_STORE_URL
            );
            HttpStoreClient::new(DEFAULT_STORE_URL)
        }),
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}

/// Format an optional money amount, showing "N/A" for absent values.
pub fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(a) => format!("${:.2}", a),
        None => "N/A".to_string(),
    }
}

/// Format a (year, month) bucket as e.g. "Jan 2024".
pub fn format_month(year: i32, month: u32) -> String {
    match chrono::NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%b %Y").to_string(),
        None => format!("{:04}-{:02}", year, month),
    }
}
