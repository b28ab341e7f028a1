//! Receipt data export command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use scantrack_core::export::{export_csv, write_json, ExportFormat};
use scantrack_core::store::{fetch_all_receipts, ReceiptStore};

const FETCH_PAGE_SIZE: u32 = 100;

pub async fn cmd_export(store: &dyn ReceiptStore, output: &Path, format: &str) -> Result<()> {
    let format: ExportFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let receipts = fetch_all_receipts(store, FETCH_PAGE_SIZE)
        .await
        .context("Failed to fetch receipts from store")?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    match format {
        ExportFormat::Csv => export_csv(&receipts, file)?,
        ExportFormat::Json => write_json(&receipts, Utc::now(), file)?,
    }

    println!(
        "✅ Exported {} receipt(s) to {}",
        receipts.len(),
        output.display()
    );

    Ok(())
}
