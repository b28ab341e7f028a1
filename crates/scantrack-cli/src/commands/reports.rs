//! Analytics report commands and the dashboard

use anyhow::{Context, Result};
use chrono::Utc;

use scantrack_core::analytics::{self, share_of_total, MonthWindow};
use scantrack_core::store::{fetch_all_receipts, ReceiptStore};
use scantrack_core::Analytics;

use super::{format_month, truncate};

const FETCH_PAGE_SIZE: u32 = 100;

pub async fn cmd_report_analytics(
    store: &dyn ReceiptStore,
    months: u32,
    recent: usize,
    local: bool,
    dense: bool,
) -> Result<()> {
    let window = MonthWindow::trailing(months, Utc::now().date_naive());

    let analytics = if local {
        // Compute from the raw collection with the local engine instead of
        // the store's pre-aggregated endpoint.
        let receipts = fetch_all_receipts(store, FETCH_PAGE_SIZE)
            .await
            .context("Failed to fetch receipts from store")?;
        analytics::expense_analytics(&receipts, &window, recent)
    } else {
        store
            .fetch_analytics(months)
            .await
            .context("Failed to fetch analytics from store")?
    };

    println!();
    println!("📊 Expense Analytics");
    println!(
        "   Window: last {} month(s){}",
        months,
        if local { " (computed locally)" } else { "" }
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total Expenses: ${:.2}", analytics.total_expenses);
    println!(
        "   Average Monthly: ${:.2}",
        average_monthly(&analytics)
    );

    if analytics.monthly_expenses.is_empty() {
        println!();
        println!("   No expenses found in this window.");
        return Ok(());
    }

    let monthly = if dense {
        analytics::dense_monthly_series(&analytics.monthly_expenses, &window)
    } else {
        analytics.monthly_expenses.clone()
    };

    println!();
    println!("   {:10} │ {:>10}", "Month", "Amount");
    println!("   ───────────┼────────────");
    for month in &monthly {
        println!(
            "   {:10} │ {:>10.2}",
            format_month(month.year, month.month),
            month.total
        );
    }

    if !analytics.category_breakdown.is_empty() {
        println!();
        println!("   {:25} │ {:>10} │ {:>6}", "Category", "Total", "%");
        println!("   ──────────────────────────┼────────────┼────────");
        for category in &analytics.category_breakdown {
            println!(
                "   {:25} │ {:>10.2} │ {:>5.1}%",
                truncate(&category.category, 25),
                category.total,
                share_of_total(category.total, analytics.total_expenses)
            );
        }
    }

    if !analytics.recent_receipts.is_empty() {
        println!();
        println!("   Recent receipts:");
        for receipt in analytics.recent_receipts.iter().take(recent) {
            let merchant = receipt
                .merchant_name
                .as_deref()
                .unwrap_or("Unknown Merchant");
            let date = receipt
                .purchase_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no date".to_string());
            println!(
                "     {:25} {:12} ${:>8.2}  {} item(s)",
                truncate(merchant, 25),
                date,
                receipt.total_amount.unwrap_or(0.0),
                receipt.items.len()
            );
        }
    }

    Ok(())
}

pub async fn cmd_report_categories(store: &dyn ReceiptStore, months: u32) -> Result<()> {
    // Shares are against receipt-level total expenses, so both aggregates
    // are needed; fetch them concurrently and join before rendering.
    let (analytics, stats) = tokio::try_join!(
        store.fetch_analytics(months),
        store.fetch_category_stats(months),
    )
    .context("Failed to fetch category statistics from store")?;

    println!();
    println!("📊 Category Statistics");
    println!("   Window: last {} month(s)", months);
    println!("   ─────────────────────────────────────────────────────────────");

    if stats.is_empty() {
        println!("   No categorized items found in this window.");
        return Ok(());
    }

    println!(
        "   {:25} │ {:>5} │ {:>10} │ {:>10} │ {:>6}",
        "Category", "Items", "Total", "Average", "%"
    );
    println!("   ──────────────────────────┼───────┼────────────┼────────────┼────────");

    for stat in &stats {
        println!(
            "   {:25} │ {:>5} │ {:>10.2} │ {:>10.2} │ {:>5.1}%",
            truncate(&stat.category, 25),
            stat.item_count,
            stat.total_amount,
            stat.avg_amount,
            share_of_total(stat.total_amount, analytics.total_expenses)
        );
    }

    Ok(())
}

pub async fn cmd_report_trends(store: &dyn ReceiptStore, months: u32) -> Result<()> {
    let matrix = store
        .fetch_monthly_trends(months)
        .await
        .context("Failed to fetch monthly trends from store")?;

    println!();
    println!("📈 Category Trends");
    println!("   Window: last {} month(s)", months);
    println!("   ─────────────────────────────────────────────────────────────");

    if matrix.is_empty() {
        println!("   No categorized spending found in this window.");
        return Ok(());
    }

    // Union the categories across all months for the column set; sparse
    // cells render as 0.00 rather than dropping the month or the series.
    let categories = matrix.categories();

    print!("   {:10}", "Month");
    for category in &categories {
        print!(" │ {:>12}", truncate(category, 12));
    }
    println!();

    print!("   ──────────");
    for _ in &categories {
        print!("─┼─────────────");
    }
    println!();

    for month in matrix.months() {
        print!("   {:10}", format_month(month.year, month.month));
        for category in &categories {
            print!(" │ {:>12.2}", matrix.value(month, category));
        }
        println!();
    }

    Ok(())
}

pub async fn cmd_dashboard(store: &dyn ReceiptStore, months: u32) -> Result<()> {
    // Four independent fetches, joined before anything renders: partial
    // results must never be shown as if complete.
    let (analytics, stats, trends, receipts) = tokio::try_join!(
        store.fetch_analytics(months),
        store.fetch_category_stats(months),
        store.fetch_monthly_trends(months),
        fetch_all_receipts(store, FETCH_PAGE_SIZE),
    )
    .context("Failed to fetch dashboard data from store")?;

    let today = Utc::now().date_naive();
    let window = MonthWindow::trailing(months, today);
    let this_month = window.end_month();

    // Tiles come from the full windowed set, not the recent-receipts slice.
    let receipts_processed = analytics::windowed(&receipts, &window).len();
    let this_month_total = analytics
        .monthly_expenses
        .iter()
        .find(|m| m.month_key() == this_month)
        .map(|m| m.total)
        .unwrap_or(0.0);

    println!();
    println!("🏠 Dashboard (last {} month(s))", months);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   💵 Total Expenses:     ${:.2}", analytics.total_expenses);
    println!("   📅 This Month:         ${:.2}", this_month_total);
    println!("   📈 Average Monthly:    ${:.2}", average_monthly(&analytics));
    println!("   🧾 Receipts Processed: {}", receipts_processed);

    if !stats.is_empty() {
        println!();
        println!("   Top categories:");
        for stat in stats.iter().take(5) {
            println!(
                "     {:25} ${:>9.2} ({:.1}%)",
                truncate(&stat.category, 25),
                stat.total_amount,
                share_of_total(stat.total_amount, analytics.total_expenses)
            );
        }
    }

    if !trends.is_empty() {
        println!();
        println!(
            "   Trend data: {} month(s) across {} categor{}",
            trends.len(),
            trends.categories().len(),
            if trends.categories().len() == 1 { "y" } else { "ies" }
        );
    }

    if !analytics.recent_receipts.is_empty() {
        println!();
        println!("   Recent receipts:");
        for receipt in analytics.recent_receipts.iter().take(5) {
            let merchant = receipt
                .merchant_name
                .as_deref()
                .unwrap_or("Unknown Merchant");
            println!(
                "     {:25} ${:>9.2}",
                truncate(merchant, 25),
                receipt.total_amount.unwrap_or(0.0)
            );
        }
    }

    Ok(())
}

/// Mean of the non-empty monthly buckets, 0 when there are none.
fn average_monthly(analytics: &Analytics) -> f64 {
    if analytics.monthly_expenses.is_empty() {
        return 0.0;
    }
    let sum: f64 = analytics.monthly_expenses.iter().map(|m| m.total).sum();
    sum / analytics.monthly_expenses.len() as f64
}
