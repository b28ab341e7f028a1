//! Aggregation engine for expense analytics
//!
//! Pure functions over a receipt collection and an explicit month window.
//! Callers supply the anchor date (`MonthWindow::trailing(n, today)`); the
//! engine never reads the clock, so every metric is reproducible in tests.
//!
//! Receipt-level metrics (totals, monthly series) use `total_amount`;
//! item-level metrics (breakdowns, stats, trends) use `items[].total_price`.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    Analytics, CategoryBreakdown, CategoryStat, CategoryTrendMatrix, MonthKey, MonthlyExpense,
    Receipt, SortKey,
};
use crate::query::sort_receipts;

/// A trailing window of whole calendar months
///
/// Covers the last `months` calendar months up to and including the month of
/// the anchor date. `months == 0` is a defined empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    end: MonthKey,
    months: u32,
}

impl MonthWindow {
    /// Window ending at (and including) the month of `as_of`.
    pub fn trailing(months: u32, as_of: NaiveDate) -> Self {
        Self {
            end: MonthKey::from_date(as_of),
            months,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if self.months == 0 {
            return false;
        }
        let idx = MonthKey::from_date(date).index();
        let end = self.end.index();
        idx <= end && idx > end - self.months as i64
    }

    /// The last month of the window.
    pub fn end_month(&self) -> MonthKey {
        self.end
    }

    /// Every month of the window, chronological ascending.
    pub fn iter_months(&self) -> impl Iterator<Item = MonthKey> {
        let end = self.end.index();
        (end - self.months as i64 + 1..=end).map(MonthKey::from_index)
    }
}

/// Receipts whose anchor date falls inside the window.
///
/// Receipts lacking both purchase date and upload timestamp have no anchor
/// and are excluded from every time-bucketed metric. A receipt with a null
/// `total_amount` stays in: it contributes 0 to money sums but still counts
/// toward presence-style counts such as "receipts processed".
pub fn windowed<'a>(receipts: &'a [Receipt], window: &MonthWindow) -> Vec<&'a Receipt> {
    receipts
        .iter()
        .filter(|r| r.anchor_date().is_some_and(|d| window.contains(d)))
        .collect()
}

/// Compute the analytics aggregate for a window.
///
/// `recent_limit` caps `recent_receipts`, which is a view over the same
/// windowed set as the other metrics, never a separate query.
pub fn expense_analytics(
    receipts: &[Receipt],
    window: &MonthWindow,
    recent_limit: usize,
) -> Analytics {
    let in_window = windowed(receipts, window);

    let total_expenses: f64 = in_window
        .iter()
        .map(|r| r.total_amount.unwrap_or(0.0))
        .sum();

    // Monthly buckets, non-empty only; BTreeMap iteration gives
    // chronological ascending order.
    let mut buckets: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for receipt in &in_window {
        if let Some(anchor) = receipt.anchor_date() {
            *buckets.entry(MonthKey::from_date(anchor)).or_insert(0.0) +=
                receipt.total_amount.unwrap_or(0.0);
        }
    }
    let monthly_expenses = buckets
        .into_iter()
        .map(|(key, total)| MonthlyExpense {
            year: key.year,
            month: key.month,
            total,
        })
        .collect();

    let category_breakdown = category_breakdown(&in_window);

    let mut recent: Vec<Receipt> = in_window.iter().map(|r| (*r).clone()).collect();
    sort_receipts(&mut recent, SortKey::Newest);
    recent.truncate(recent_limit);

    Analytics {
        total_expenses,
        monthly_expenses,
        category_breakdown,
        recent_receipts: recent,
    }
}

/// Flatten in-window items, sum `total_price` per category, descending by
/// total. Uncategorized items are skipped here; `query::uncategorized_item_count`
/// surfaces them when a count is wanted.
fn category_breakdown(in_window: &[&Receipt]) -> Vec<CategoryBreakdown> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for receipt in in_window {
        for item in &receipt.items {
            if let Some(category) = item.category.as_deref() {
                *totals.entry(category).or_insert(0.0) += item.total_price;
            }
        }
    }

    let mut breakdown: Vec<CategoryBreakdown> = totals
        .into_iter()
        .map(|(category, total)| CategoryBreakdown {
            category: category.to_string(),
            total,
        })
        .collect();
    // Descending by total; the BTreeMap source already breaks exact ties by
    // category name, and the sort is stable.
    breakdown.sort_by(|a, b| b.total.total_cmp(&a.total));
    breakdown
}

/// Per-category item statistics for the window, descending by total.
pub fn category_stats(receipts: &[Receipt], window: &MonthWindow) -> Vec<CategoryStat> {
    let in_window = windowed(receipts, window);

    let mut grouped: BTreeMap<&str, (i64, f64)> = BTreeMap::new();
    for receipt in &in_window {
        for item in &receipt.items {
            if let Some(category) = item.category.as_deref() {
                let entry = grouped.entry(category).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += item.total_price;
            }
        }
    }

    let mut stats: Vec<CategoryStat> = grouped
        .into_iter()
        .map(|(category, (item_count, total_amount))| CategoryStat {
            category: category.to_string(),
            item_count,
            total_amount,
            avg_amount: if item_count > 0 {
                total_amount / item_count as f64
            } else {
                0.0
            },
        })
        .collect();
    stats.sort_by(|a, b| b.total_amount.total_cmp(&a.total_amount));
    stats
}

/// Zero-fill a sparse monthly series across every month of the window.
///
/// The aggregate omits empty months; consumers that explicitly want a dense
/// series (e.g., a fixed-width chart axis) expand it with this.
pub fn dense_monthly_series(
    sparse: &[MonthlyExpense],
    window: &MonthWindow,
) -> Vec<MonthlyExpense> {
    window
        .iter_months()
        .map(|key| MonthlyExpense {
            year: key.year,
            month: key.month,
            total: sparse
                .iter()
                .find(|m| m.month_key() == key)
                .map(|m| m.total)
                .unwrap_or(0.0),
        })
        .collect()
}

/// Percentage share of a row against a window total, 0 when the total is 0.
pub fn share_of_total(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        (amount / total) * 100.0
    } else {
        0.0
    }
}

/// Sparse month-by-category spend matrix for the window.
pub fn monthly_trends(receipts: &[Receipt], window: &MonthWindow) -> CategoryTrendMatrix {
    let mut matrix = CategoryTrendMatrix::new();
    for receipt in windowed(receipts, window) {
        let Some(anchor) = receipt.anchor_date() else {
            continue;
        };
        let month = MonthKey::from_date(anchor);
        for item in &receipt.items {
            if let Some(category) = item.category.as_deref() {
                matrix.accumulate(month, category, item.total_price);
            }
        }
    }
    matrix
}
