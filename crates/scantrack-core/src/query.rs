//! Query engine for the receipt list view
//!
//! Pure functions: filter by search text and item category, then apply a
//! stable sort. Recomputed in full on every parameter change; nothing here
//! mutates the collection or keeps state between calls.

use std::collections::BTreeSet;

use crate::models::{Receipt, SortKey};

/// Filter and sort a receipt collection for interactive browsing.
///
/// Membership is the conjunction of the search predicate and the category
/// predicate. The sort is stable: receipts that compare equal keep their
/// original collection order. Deterministic for identical inputs.
pub fn filter_and_sort(
    receipts: &[Receipt],
    search_term: &str,
    category: Option<&str>,
    sort_key: SortKey,
) -> Vec<Receipt> {
    let needle = search_term.trim().to_lowercase();

    let mut filtered: Vec<Receipt> = receipts
        .iter()
        .filter(|r| matches_search(r, &needle) && matches_category(r, category))
        .cloned()
        .collect();

    sort_receipts(&mut filtered, sort_key);
    filtered
}

/// Case-insensitive substring match over merchant name, filename and raw
/// OCR text. Absent fields never match; an empty term matches everything.
fn matches_search(receipt: &Receipt, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let fields = [
        receipt.merchant_name.as_deref(),
        Some(receipt.filename.as_str()),
        receipt.raw_text.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Exact, case-sensitive category match against any line item. Categories
/// are a closed taxonomy assigned upstream, not free text.
fn matches_category(receipt: &Receipt, category: Option<&str>) -> bool {
    match category {
        None => true,
        Some(wanted) => receipt
            .items
            .iter()
            .any(|item| item.category.as_deref() == Some(wanted)),
    }
}

/// Stable in-place sort by the given key.
pub fn sort_receipts(receipts: &mut [Receipt], sort_key: SortKey) {
    match sort_key {
        // Option<DateTime> orders None first, so missing upload timestamps
        // sort oldest under both date orders.
        SortKey::Newest => receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Oldest => receipts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortKey::AmountHigh => receipts.sort_by(|a, b| {
            b.total_amount
                .unwrap_or(0.0)
                .total_cmp(&a.total_amount.unwrap_or(0.0))
        }),
        SortKey::AmountLow => receipts.sort_by(|a, b| {
            a.total_amount
                .unwrap_or(0.0)
                .total_cmp(&b.total_amount.unwrap_or(0.0))
        }),
        SortKey::Merchant => receipts.sort_by(|a, b| {
            let a_name = a.merchant_name.as_deref().unwrap_or("").to_lowercase();
            let b_name = b.merchant_name.as_deref().unwrap_or("").to_lowercase();
            a_name.cmp(&b_name)
        }),
    }
}

/// Distinct, alphabetically sorted category universe across all items.
///
/// Computed over the full, unfiltered collection so the filter control keeps
/// showing every category even while a filter is active.
pub fn distinct_categories(receipts: &[Receipt]) -> Vec<String> {
    let set: BTreeSet<&str> = receipts
        .iter()
        .flat_map(|r| r.items.iter())
        .filter_map(|item| item.category.as_deref())
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Count of items with no category across the collection, for surfacing an
/// explicit "uncategorized" bucket.
pub fn uncategorized_item_count(receipts: &[Receipt]) -> usize {
    receipts
        .iter()
        .flat_map(|r| r.items.iter())
        .filter(|item| item.category.is_none())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceiptItem;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn receipt(id: i64, merchant: Option<&str>, amount: Option<f64>, day: u32) -> Receipt {
        Receipt {
            id,
            filename: format!("receipt_{:03}.jpg", id),
            file_path: format!("uploads/receipt_{:03}.jpg", id),
            total_amount: amount,
            merchant_name: merchant.map(str::to_string),
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, day),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()),
            updated_at: None,
            raw_text: None,
            items: Vec::new(),
        }
    }

    fn item(receipt_id: i64, category: Option<&str>, total_price: f64) -> ReceiptItem {
        ReceiptItem {
            id: receipt_id * 100,
            receipt_id,
            item_name: "item".to_string(),
            quantity: 1.0,
            unit_price: total_price,
            total_price,
            category: category.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn test_empty_search_matches_all() {
        let receipts = vec![receipt(1, Some("Safeway"), Some(10.0), 1)];
        let result = filter_and_sort(&receipts, "", None, SortKey::Newest);
        assert_eq!(result.len(), 1);

        let result = filter_and_sort(&receipts, "   ", None, SortKey::Newest);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_search_matches_filename_when_merchant_absent() {
        // merchant_name is null but the filename carries the term
        let mut r = receipt(1, None, Some(120.0), 1);
        r.filename = "COSTCO_0912.jpg".to_string();
        let receipts = vec![r, receipt(2, Some("Safeway"), Some(30.0), 2)];

        let result = filter_and_sort(&receipts, "costco", None, SortKey::Newest);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[test]
    fn test_search_matches_raw_text() {
        let mut r = receipt(1, None, None, 1);
        r.raw_text = Some("TRADER JOE'S #123\nBANANAS 0.99".to_string());
        let receipts = vec![r];

        let result = filter_and_sort(&receipts, "trader joe", None, SortKey::Newest);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_absent_fields_never_match() {
        let receipts = vec![receipt(1, None, Some(5.0), 1)];
        let result = filter_and_sort(&receipts, "anything", None, SortKey::Newest);
        assert!(result.is_empty());
    }

    #[test]
    fn test_category_filter_is_exact_and_case_sensitive() {
        let mut a = receipt(1, Some("Costco"), Some(50.0), 1);
        a.items = vec![item(1, Some("Food & Dining"), 50.0)];
        let mut b = receipt(2, Some("Shell"), Some(40.0), 2);
        b.items = vec![item(2, Some("Transportation"), 40.0)];
        let receipts = vec![a, b];

        let result = filter_and_sort(&receipts, "", Some("Food & Dining"), SortKey::Newest);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);

        // Case matters: taxonomy is closed, not free text
        let result = filter_and_sort(&receipts, "", Some("food & dining"), SortKey::Newest);
        assert!(result.is_empty());
    }

    #[test]
    fn test_category_with_no_matches_yields_empty_not_error() {
        let mut a = receipt(1, Some("Costco"), Some(50.0), 1);
        a.items = vec![item(1, Some("Food & Dining"), 50.0)];
        let receipts = vec![a];

        let result = filter_and_sort(&receipts, "", Some("Travel"), SortKey::Newest);
        assert!(result.is_empty());
    }

    #[test]
    fn test_predicates_compose_as_conjunction() {
        let mut a = receipt(1, Some("Costco"), Some(50.0), 1);
        a.items = vec![item(1, Some("Food & Dining"), 50.0)];
        let mut b = receipt(2, Some("Costco Gas"), Some(40.0), 2);
        b.items = vec![item(2, Some("Transportation"), 40.0)];
        let receipts = vec![a, b];

        let result = filter_and_sort(&receipts, "costco", Some("Transportation"), SortKey::Newest);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 2);
    }

    #[test]
    fn test_sort_newest_and_oldest() {
        let receipts = vec![
            receipt(1, Some("A"), Some(1.0), 5),
            receipt(2, Some("B"), Some(2.0), 20),
            receipt(3, Some("C"), Some(3.0), 10),
        ];

        let newest = filter_and_sort(&receipts, "", None, SortKey::Newest);
        assert_eq!(newest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        let oldest = filter_and_sort(&receipts, "", None, SortKey::Oldest);
        assert_eq!(oldest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_sort_amount_low_treats_null_as_zero() {
        let receipts = vec![
            receipt(1, Some("A"), None, 1),
            receipt(2, Some("B"), Some(10.0), 2),
            receipt(3, Some("C"), Some(5.0), 3),
        ];

        let result = filter_and_sort(&receipts, "", None, SortKey::AmountLow);
        assert_eq!(result.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3, 2]);

        let result = filter_and_sort(&receipts, "", None, SortKey::AmountHigh);
        assert_eq!(result.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_merchant_treats_null_as_empty_and_folds_case() {
        let receipts = vec![
            receipt(1, Some("zeke's"), Some(1.0), 1),
            receipt(2, None, Some(2.0), 2),
            receipt(3, Some("Albertsons"), Some(3.0), 3),
        ];

        let result = filter_and_sort(&receipts, "", None, SortKey::Merchant);
        assert_eq!(result.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        // Equal amounts keep collection order
        let receipts = vec![
            receipt(1, Some("A"), Some(10.0), 1),
            receipt(2, Some("B"), Some(10.0), 2),
            receipt(3, Some("C"), Some(10.0), 3),
        ];

        let result = filter_and_sort(&receipts, "", None, SortKey::AmountHigh);
        assert_eq!(result.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let receipts = vec![
            receipt(1, Some("A"), Some(3.0), 3),
            receipt(2, Some("B"), Some(1.0), 1),
            receipt(3, Some("C"), Some(2.0), 2),
        ];

        let once = filter_and_sort(&receipts, "", None, SortKey::AmountLow);
        let twice = filter_and_sort(&once, "", None, SortKey::AmountLow);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut a = receipt(1, Some("Costco"), Some(50.0), 1);
        a.items = vec![item(1, Some("Food & Dining"), 50.0)];
        let receipts = vec![a, receipt(2, Some("Safeway"), Some(30.0), 2)];

        let once = filter_and_sort(&receipts, "costco", None, SortKey::Newest);
        let twice = filter_and_sort(&once, "costco", None, SortKey::Newest);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_distinct_categories_reflect_full_collection() {
        let mut a = receipt(1, Some("Costco"), Some(50.0), 1);
        a.items = vec![
            item(1, Some("Food & Dining"), 30.0),
            item(1, Some("Household"), 20.0),
        ];
        let mut b = receipt(2, Some("Shell"), Some(40.0), 2);
        b.items = vec![item(2, Some("Transportation"), 40.0), item(2, None, 5.0)];
        let receipts = vec![a, b];

        // Alphabetical, distinct, and unaffected by any active filter
        assert_eq!(
            distinct_categories(&receipts),
            vec!["Food & Dining", "Household", "Transportation"]
        );
        assert_eq!(uncategorized_item_count(&receipts), 1);
    }
}
