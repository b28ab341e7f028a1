//! Export functionality for receipt data
//!
//! Supports:
//! - Flattened CSV export (one row per line item; receipts without items
//!   emit a single row with empty item columns)
//! - Full JSON export with an export_info header

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Receipt;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {} (use csv or json)", s)),
        }
    }
}

/// One flattened CSV row: receipt columns repeated per item.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    receipt_id: i64,
    filename: &'a str,
    merchant_name: &'a str,
    total_amount: f64,
    purchase_date: String,
    created_at: String,
    item_name: &'a str,
    item_quantity: String,
    item_unit_price: String,
    item_total_price: String,
    item_category: &'a str,
}

/// Write receipts as flattened CSV.
pub fn export_csv<W: std::io::Write>(receipts: &[Receipt], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for receipt in receipts {
        let purchase_date = receipt
            .purchase_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        let created_at = receipt
            .created_at
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        if receipt.items.is_empty() {
            csv_writer.serialize(CsvRow {
                receipt_id: receipt.id,
                filename: &receipt.filename,
                merchant_name: receipt.merchant_name.as_deref().unwrap_or(""),
                total_amount: receipt.total_amount.unwrap_or(0.0),
                purchase_date: purchase_date.clone(),
                created_at: created_at.clone(),
                item_name: "",
                item_quantity: String::new(),
                item_unit_price: String::new(),
                item_total_price: String::new(),
                item_category: "",
            })?;
            continue;
        }

        for item in &receipt.items {
            csv_writer.serialize(CsvRow {
                receipt_id: receipt.id,
                filename: &receipt.filename,
                merchant_name: receipt.merchant_name.as_deref().unwrap_or(""),
                total_amount: receipt.total_amount.unwrap_or(0.0),
                purchase_date: purchase_date.clone(),
                created_at: created_at.clone(),
                item_name: &item.item_name,
                item_quantity: item.quantity.to_string(),
                item_unit_price: item.unit_price.to_string(),
                item_total_price: item.total_price.to_string(),
                item_category: item.category.as_deref().unwrap_or(""),
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// Metadata header for JSON exports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportInfo {
    pub exported_at: DateTime<Utc>,
    pub total_receipts: usize,
}

/// Full JSON export: metadata plus the nested receipt records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonExport {
    pub export_info: ExportInfo,
    pub receipts: Vec<Receipt>,
}

/// Build the JSON export document. The timestamp is caller-supplied so
/// exports are reproducible in tests.
pub fn export_json(receipts: &[Receipt], exported_at: DateTime<Utc>) -> JsonExport {
    JsonExport {
        export_info: ExportInfo {
            exported_at,
            total_receipts: receipts.len(),
        },
        receipts: receipts.to_vec(),
    }
}

/// Write the JSON export document to a writer, pretty-printed.
pub fn write_json<W: std::io::Write>(
    receipts: &[Receipt],
    exported_at: DateTime<Utc>,
    writer: W,
) -> Result<()> {
    let export = export_json(receipts, exported_at);
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}
