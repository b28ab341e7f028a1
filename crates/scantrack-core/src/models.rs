//! Domain models for Scantrack
//!
//! Wire types for the Receipt Store Service plus the derived value objects
//! produced by the query and aggregation engines. Derived entities are plain
//! serializable values, recomputed on demand; nothing here is mutated in
//! place.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Label used when items without a category are surfaced explicitly
/// (e.g., an "uncategorized" count), instead of grouping under null.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A single extracted line item on a receipt
///
/// `total_price` is the authoritative line total; it is not guaranteed to
/// equal `quantity * unit_price` (extraction noise is tolerated upstream).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub id: i64,
    pub receipt_id: i64,
    pub item_name: String,
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub unit_price: f64,
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub total_price: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// One uploaded/extracted purchase record, possibly with line items
///
/// Extraction may fail partially: `total_amount`, `merchant_name` and
/// `purchase_date` can all be absent, and `total_amount` may diverge from the
/// sum of item totals. Receipt-level metrics use `total_amount`; item and
/// category metrics use `items[].total_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    #[serde(default, deserialize_with = "de::lenient_amount")]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_date")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de::lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
}

impl Receipt {
    /// Date used for time bucketing: the purchase date when extraction found
    /// one, else the upload timestamp. None when both are absent, in which
    /// case the receipt is excluded from time-bucketed metrics.
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        self.purchase_date
            .or_else(|| self.created_at.map(|dt| dt.date_naive()))
    }
}

/// Sort order for the receipt list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    AmountHigh,
    AmountLow,
    Merchant,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::AmountHigh => "amount_high",
            Self::AmountLow => "amount_low",
            Self::Merchant => "merchant",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "amount_high" | "amount-high" => Ok(Self::AmountHigh),
            "amount_low" | "amount-low" => Ok(Self::AmountLow),
            "merchant" => Ok(Self::Merchant),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A calendar month, ordered chronologically
///
/// Internal representation for month bucketing. Serializes as the sortable
/// `"YYYY-MM"` string only at the wire boundary, so chronological order never
/// depends on string parsing inside the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month));
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year 0, for window arithmetic.
    pub(crate) fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub(crate) fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidData(format!("Invalid month key: {}", s)))?;
        let year: i32 = year
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid month key: {}", s)))?;
        let month: u32 = month
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid month key: {}", s)))?;
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidData(format!("Invalid month key: {}", s)));
        }
        Ok(Self { year, month })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Total spend for one calendar month with at least one receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyExpense {
    pub year: i32,
    pub month: u32,
    pub total: f64,
}

impl MonthlyExpense {
    pub fn month_key(&self) -> MonthKey {
        MonthKey::new(self.year, self.month)
    }
}

/// Total spend for one item category across a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: f64,
}

/// Per-category item statistics across a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub item_count: i64,
    pub total_amount: f64,
    pub avg_amount: f64,
}

/// The analytics aggregate for a trailing month window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_expenses: f64,
    /// Chronological ascending, non-empty buckets only
    pub monthly_expenses: Vec<MonthlyExpense>,
    /// Descending by total
    pub category_breakdown: Vec<CategoryBreakdown>,
    /// Newest first, capped at the caller-supplied limit
    pub recent_receipts: Vec<Receipt>,
}

/// Sparse month-by-category spend matrix for multi-series charting
///
/// A month/category pair with no spend is absent. Consumers building a chart
/// must union categories across all months for the series set and read absent
/// cells as 0, never drop the month or the series; `categories`, `value` and
/// `series` implement that contract.
///
/// Serializes as a mapping keyed by `"YYYY-MM"`, the Store Service wire
/// format for monthly trends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTrendMatrix {
    cells: BTreeMap<MonthKey, BTreeMap<String, f64>>,
}

impl CategoryTrendMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add spend to a (month, category) cell, creating it if absent.
    pub fn accumulate(&mut self, month: MonthKey, category: &str, amount: f64) {
        *self
            .cells
            .entry(month)
            .or_default()
            .entry(category.to_string())
            .or_insert(0.0) += amount;
    }

    /// Months with at least one cell, chronological ascending.
    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.cells.keys().copied()
    }

    /// Union of categories observed across all months, sorted. This is the
    /// series set for a multi-series chart.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .cells
            .values()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Cell value, with absence read as 0 rather than missing data.
    pub fn value(&self, month: MonthKey, category: &str) -> f64 {
        self.cells
            .get(&month)
            .and_then(|row| row.get(category))
            .copied()
            .unwrap_or(0.0)
    }

    /// One data point per month for a single category series, zero-filled.
    pub fn series(&self, category: &str) -> Vec<(MonthKey, f64)> {
        self.months()
            .map(|month| (month, self.value(month, category)))
            .collect()
    }

    /// Categories with non-zero spend in one month.
    pub fn categories_in_month(&self, month: MonthKey) -> Vec<String> {
        self.cells
            .get(&month)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &BTreeMap<String, f64>)> {
        self.cells.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Lenient field-level deserializers
///
/// One receipt with a malformed date or a non-numeric amount must not fail
/// the whole fetch; the offending field deserializes as absent and the rest
/// of the record survives.
mod de {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
        Other(IgnoredAny),
    }

    pub(super) fn lenient_amount<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Num(n)) if n.is_finite() => Some(n),
            Some(Raw::Str(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        })
    }

    /// Like `lenient_amount` but for required money fields: garbage becomes 0.
    pub(super) fn lenient_money<'de, D>(d: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        lenient_amount(d).map(|v| v.unwrap_or(0.0))
    }

    pub(super) fn lenient_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Str(s)) => parse_date(s.trim()),
            _ => None,
        })
    }

    pub(super) fn lenient_datetime<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Str(s)) => parse_datetime(s.trim()),
            _ => None,
        })
    }

    fn parse_date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        // RFC 3339, then the store's naive ISO format, then bare dates
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|dt| dt.and_utc())
            })
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|dt| dt.and_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_roundtrip() {
        let key = MonthKey::new(2024, 3);
        assert_eq!(key.to_string(), "2024-03");
        assert_eq!("2024-03".parse::<MonthKey>().unwrap(), key);
        assert_eq!("2024-3".parse::<MonthKey>().unwrap(), key);
    }

    #[test]
    fn test_month_key_rejects_garbage() {
        assert!("2024".parse::<MonthKey>().is_err());
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024-00".parse::<MonthKey>().is_err());
        assert!("march-2024".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_month_key_orders_chronologically() {
        let mut keys = vec![
            MonthKey::new(2024, 2),
            MonthKey::new(2023, 12),
            MonthKey::new(2024, 1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                MonthKey::new(2023, 12),
                MonthKey::new(2024, 1),
                MonthKey::new(2024, 2),
            ]
        );
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("newest".parse::<SortKey>().unwrap(), SortKey::Newest);
        assert_eq!(
            "amount_high".parse::<SortKey>().unwrap(),
            SortKey::AmountHigh
        );
        assert_eq!("amount-low".parse::<SortKey>().unwrap(), SortKey::AmountLow);
        assert!("biggest".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_receipt_deserializes_full_record() {
        let json = r#"{
            "id": 1,
            "filename": "COSTCO_0912.jpg",
            "file_path": "uploads/abc.jpg",
            "total_amount": 42.5,
            "merchant_name": "Costco",
            "purchase_date": "2024-01-15",
            "created_at": "2024-01-16T10:30:00",
            "updated_at": null,
            "raw_text": "COSTCO WHOLESALE",
            "items": [
                {
                    "id": 10,
                    "receipt_id": 1,
                    "item_name": "Rotisserie Chicken",
                    "quantity": 1,
                    "unit_price": 4.99,
                    "total_price": 4.99,
                    "category": "Food & Dining",
                    "description": null
                }
            ]
        }"#;

        let receipt: Receipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.total_amount, Some(42.5));
        assert_eq!(
            receipt.purchase_date,
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].total_price, 4.99);
        assert_eq!(
            receipt.anchor_date(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_receipt_tolerates_malformed_fields() {
        // A bad date or amount nulls that field, not the record
        let json = r#"{
            "id": 2,
            "filename": "blurry.png",
            "file_path": "uploads/blurry.png",
            "total_amount": "not a number",
            "purchase_date": "01/15/2024",
            "created_at": "2024-02-01T08:00:00"
        }"#;

        let receipt: Receipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.total_amount, None);
        assert_eq!(receipt.purchase_date, None);
        // Anchor falls back to the upload timestamp
        assert_eq!(
            receipt.anchor_date(),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert!(receipt.items.is_empty());
    }

    #[test]
    fn test_receipt_without_any_date_has_no_anchor() {
        let json = r#"{
            "id": 3,
            "filename": "x.jpg",
            "file_path": "uploads/x.jpg",
            "created_at": "garbage"
        }"#;

        let receipt: Receipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.anchor_date(), None);
    }

    #[test]
    fn test_trend_matrix_serializes_keyed_by_month_string() {
        let mut matrix = CategoryTrendMatrix::new();
        matrix.accumulate(MonthKey::new(2024, 1), "Food & Dining", 12.5);
        matrix.accumulate(MonthKey::new(2024, 1), "Food & Dining", 7.5);
        matrix.accumulate(MonthKey::new(2024, 3), "Travel", 99.0);

        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(json["2024-01"]["Food & Dining"], 20.0);
        assert_eq!(json["2024-03"]["Travel"], 99.0);

        let back: CategoryTrendMatrix = serde_json::from_value(json).unwrap();
        assert_eq!(back, matrix);
    }

    #[test]
    fn test_trend_matrix_absent_cell_reads_as_zero() {
        let mut matrix = CategoryTrendMatrix::new();
        matrix.accumulate(MonthKey::new(2024, 1), "Food & Dining", 20.0);
        matrix.accumulate(MonthKey::new(2024, 2), "Travel", 50.0);

        // Union of categories across months
        assert_eq!(matrix.categories(), vec!["Food & Dining", "Travel"]);
        // Sparse cell defaults to 0, month and series are never dropped
        assert_eq!(matrix.value(MonthKey::new(2024, 2), "Food & Dining"), 0.0);
        assert_eq!(
            matrix.series("Travel"),
            vec![
                (MonthKey::new(2024, 1), 0.0),
                (MonthKey::new(2024, 2), 50.0),
            ]
        );
    }
}
