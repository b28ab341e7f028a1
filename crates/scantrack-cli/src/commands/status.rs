//! Store connectivity check

use anyhow::{bail, Result};

use scantrack_core::store::{fetch_all_receipts, ReceiptStore};

const FETCH_PAGE_SIZE: u32 = 100;

pub async fn cmd_status(store: &dyn ReceiptStore, store_url: &str) -> Result<()> {
    println!();
    println!("🔌 Store Service Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   URL: {}", store_url);

    if !store.health_check().await {
        println!("   Status: ❌ unreachable");
        bail!("Store service is not responding at {}", store_url);
    }

    println!("   Status: ✅ healthy");

    let receipts = fetch_all_receipts(store, FETCH_PAGE_SIZE).await?;
    let with_items = receipts.iter().filter(|r| !r.items.is_empty()).count();
    println!("   Receipts: {} ({} with extracted items)", receipts.len(), with_items);

    Ok(())
}
