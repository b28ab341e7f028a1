//! Receipt browsing commands

use anyhow::{Context, Result};

use scantrack_core::query;
use scantrack_core::store::{fetch_all_receipts, ReceiptStore};
use scantrack_core::{SortKey, UNCATEGORIZED_LABEL};

use super::{format_amount, truncate};

/// Page size for draining the store's listing endpoint.
const FETCH_PAGE_SIZE: u32 = 100;

pub async fn cmd_receipts_list(
    store: &dyn ReceiptStore,
    search: Option<&str>,
    category: Option<&str>,
    sort: &str,
    limit: usize,
) -> Result<()> {
    let sort_key: SortKey = sort.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let receipts = fetch_all_receipts(store, FETCH_PAGE_SIZE)
        .await
        .context("Failed to fetch receipts from store")?;

    // The category universe always reflects the full collection, even while
    // a filter is active.
    let categories = query::distinct_categories(&receipts);

    let filtered = query::filter_and_sort(
        &receipts,
        search.unwrap_or(""),
        category,
        sort_key,
    );

    println!();
    println!("🧾 Receipts");
    if let Some(term) = search {
        println!("   Search: {:?}", term);
    }
    if let Some(cat) = category {
        println!("   Category: {}", cat);
    }
    println!("   Sort: {}", sort_key);
    println!("   ─────────────────────────────────────────────────────────────");

    if filtered.is_empty() {
        if search.is_some() || category.is_some() {
            println!("   No receipts match the current filters.");
        } else {
            println!("   No receipts uploaded yet.");
        }
        return Ok(());
    }

    println!(
        "   {:>5} │ {:10} │ {:25} │ {:>10} │ {:>5}",
        "ID", "Date", "Merchant", "Amount", "Items"
    );
    println!("   ──────┼────────────┼───────────────────────────┼────────────┼───────");

    for receipt in filtered.iter().take(limit) {
        let date = receipt
            .purchase_date
            .map(|d| d.to_string())
            .or_else(|| receipt.created_at.map(|dt| dt.date_naive().to_string()))
            .unwrap_or_else(|| "no date".to_string());
        let merchant = receipt
            .merchant_name
            .as_deref()
            .unwrap_or("Unknown Merchant");
        println!(
            "   {:>5} │ {:10} │ {:25} │ {:>10} │ {:>5}",
            receipt.id,
            date,
            truncate(merchant, 25),
            format_amount(receipt.total_amount),
            receipt.items.len()
        );
    }

    if filtered.len() > limit {
        println!("   ... {} more (raise --limit to show)", filtered.len() - limit);
    }

    println!();
    println!("   {} of {} receipts", filtered.len(), receipts.len());
    if !categories.is_empty() {
        println!("   Categories: {}", categories.join(", "));
    }
    let uncategorized = query::uncategorized_item_count(&receipts);
    if uncategorized > 0 {
        println!("   {}: {} item(s)", UNCATEGORIZED_LABEL, uncategorized);
    }

    Ok(())
}

pub async fn cmd_receipts_show(store: &dyn ReceiptStore, id: i64) -> Result<()> {
    let receipt = store
        .fetch_receipt(id)
        .await
        .with_context(|| format!("Failed to fetch receipt {}", id))?;

    println!();
    println!("🧾 Receipt {}", receipt.id);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   File: {}", receipt.filename);
    println!(
        "   Merchant: {}",
        receipt.merchant_name.as_deref().unwrap_or("N/A")
    );
    println!("   Total: {}", format_amount(receipt.total_amount));
    println!(
        "   Purchased: {}",
        receipt
            .purchase_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!(
        "   Uploaded: {}",
        receipt
            .created_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );

    if receipt.items.is_empty() {
        println!();
        println!("   No items extracted from this receipt.");
    } else {
        println!();
        println!("   Items ({}):", receipt.items.len());
        println!(
            "   {:25} │ {:>5} │ {:>10} │ {:>10} │ {:18}",
            "Item", "Qty", "Unit", "Total", "Category"
        );
        println!("   ──────────────────────────┼───────┼────────────┼────────────┼───────────────────");
        for item in &receipt.items {
            println!(
                "   {:25} │ {:>5} │ {:>10.2} │ {:>10.2} │ {:18}",
                truncate(&item.item_name, 25),
                item.quantity,
                item.unit_price,
                item.total_price,
                item.category.as_deref().unwrap_or("-")
            );
        }
    }

    if let Some(ref raw_text) = receipt.raw_text {
        println!();
        println!("   Extracted text:");
        for line in raw_text.lines().take(10) {
            println!("     {}", truncate(line, 70));
        }
    }

    Ok(())
}

pub async fn cmd_receipts_delete(store: &dyn ReceiptStore, id: i64, yes: bool) -> Result<()> {
    if !yes {
        print!("Delete receipt {}? This cannot be undone. [y/N] ", id);
        use std::io::Write;
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    store
        .delete_receipt(id)
        .await
        .with_context(|| format!("Failed to delete receipt {}", id))?;

    // The collection changed underneath the derived views; refetch rather
    // than patching anything locally.
    let remaining = fetch_all_receipts(store, FETCH_PAGE_SIZE).await?;
    println!("✅ Deleted receipt {} ({} remaining)", id, remaining.len());

    Ok(())
}
