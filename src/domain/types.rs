//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while computing aggregates
//! - exported to JSON/CSV
//! - rendered by either the plain-text report or the TUI
//!
//! The data model follows the "raw row vs. derived value" split: a
//! `SaleRecord` stores exactly what the CSV said (after lenient coercion),
//! and everything derived — profit, group sums, the forecast — lives in the
//! `AggregateCatalog` computed from a filtered record sequence.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

/// Default profit margin applied to `total_sales` when deriving profit.
///
/// The original business rule was a fixed 20% with no documented rationale,
/// so it is a configurable parameter here rather than a constant of nature.
pub const DEFAULT_PROFIT_MARGIN: f64 = 0.2;

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Valid forecast horizon range (inclusive).
pub const HORIZON_RANGE: (u32, u32) = (7, 60);

/// Fixed seed for the deterministic fit/holdout split.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Fraction of fit-eligible rows held out of the trend fit.
pub const HOLDOUT_FRACTION: f64 = 0.2;

/// One row of the sales table, after lenient coercion.
///
/// Every field that can fail to parse is an `Option`: an unparseable date or
/// number becomes `None` and propagates as a null through the aggregates
/// instead of rejecting the row. Text fields are stored trimmed; a missing
/// text cell is the empty string.
///
/// `total_sales` is an independently supplied column. It is *not* required
/// to equal `quantity × unit_price` and is never reconciled against them.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub date: Option<NaiveDate>,
    pub product: String,
    pub category: String,
    pub region: String,
    pub customer_id: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_sales: Option<f64>,
}

impl SaleRecord {
    /// Derived profit: `total_sales × margin`. Null when the total is null.
    pub fn profit(&self, margin: f64) -> Option<f64> {
        self.total_sales.map(|s| s * margin)
    }
}

/// The full in-memory record sequence for one session.
///
/// A `Dataset` is an immutable value: filtering produces a new `Dataset`,
/// and every presentation refresh is the pure function
/// `aggregate(filter(dataset, criteria))` — there is no shared mutable
/// cache anywhere in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<SaleRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SaleRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Min/max over the non-null dates, if any.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        for d in self.records.iter().filter_map(|r| r.date) {
            span = Some(match span {
                None => (d, d),
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
            });
        }
        span
    }

    pub fn distinct_categories(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.category.as_str()))
    }

    pub fn distinct_products(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.product.as_str()))
    }

    pub fn distinct_regions(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.region.as_str()))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: BTreeSet<&str> = values.filter(|s| !s.is_empty()).collect();
    set.into_iter().map(str::to_string).collect()
}

/// The caller-selected filter: an inclusive date interval plus three
/// membership sets.
///
/// `None` on a membership set means "unrestricted" — the UI default where
/// every value is selected. A record passes iff its date lies in the
/// interval (a record with a null date never passes a bounded interval)
/// and each of its three labels is in the corresponding set when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub categories: Option<BTreeSet<String>>,
    pub products: Option<BTreeSet<String>>,
    pub regions: Option<BTreeSet<String>>,
}

impl FilterCriteria {
    /// True when no predicate is active (every record passes).
    pub fn is_unrestricted(&self) -> bool {
        self.start_date.is_none()
            && self.end_date.is_none()
            && self.categories.is_none()
            && self.products.is_none()
            && self.regions.is_none()
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags plus environment defaults.
#[derive(Debug, Clone, Serialize)]
pub struct DashConfig {
    /// Margin applied to `total_sales` when deriving profit.
    pub profit_margin: f64,
    /// Forecast horizon in days (valid range 7–60).
    pub horizon_days: u32,
    /// Seed for the deterministic fit/holdout split.
    pub split_seed: u64,
    /// Top-N size for ranked tables.
    pub top_n: usize,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            profit_margin: DEFAULT_PROFIT_MARGIN,
            horizon_days: DEFAULT_HORIZON_DAYS,
            split_seed: DEFAULT_SPLIT_SEED,
            top_n: 10,
        }
    }
}

/// Where the session's dataset comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A delimited text file on disk.
    Csv(PathBuf),
    /// Deterministic synthetic data (no CSV supplied).
    Sample {
        count: usize,
        seed: u64,
        end_date: NaiveDate,
    },
}

/// One point of a date-keyed sales series (daily or monthly).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub total_sales: f64,
}

/// A group key with its summed metric, used by ranked aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTotal {
    pub key: String,
    pub total: f64,
}

/// Per-category sales total plus its share of the filtered grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    /// Fraction of the filtered grand total in `[0, 1]`; NaN when the grand
    /// total is zero.
    pub share: f64,
}

/// The full multiset of `total_sales` values observed in one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSlice {
    pub region: String,
    pub values: Vec<f64>,
}

/// Purchase count for one customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerCount {
    pub customer_id: String,
    pub purchases: usize,
}

/// One `(total_sales, profit)` pair for the sales-vs-profit view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub total_sales: f64,
    pub profit: f64,
}

/// Pearson correlation matrix over the numeric columns.
///
/// `values[i][j]` is the pairwise-complete correlation of `columns[i]`
/// against `columns[j]`. Undefined entries (fewer than two complete pairs,
/// or zero variance) are NaN — NaN is a valid result here, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// The fitted linear trend underlying the forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    /// Intercept in the date-ordinal domain.
    pub intercept: f64,
    /// Slope per calendar day.
    pub slope: f64,
    /// Rows actually used for the fit (the 80% side of the split).
    pub n_train: usize,
}

/// One predicted future day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_sales: f64,
}

/// Forecast outcome.
///
/// "Cannot forecast" is a typed result, not an error and not a crash:
/// below the 2-dated-record threshold (or with a single distinct date,
/// which leaves the slope unidentifiable) the fit must be skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Forecast {
    Ready {
        line: TrendLine,
        points: Vec<ForecastPoint>,
    },
    Insufficient {
        /// Filtered rows carrying both a date and a total.
        dated_records: usize,
    },
}

impl Forecast {
    pub fn points(&self) -> Option<&[ForecastPoint]> {
        match self {
            Forecast::Ready { points, .. } => Some(points.as_slice()),
            Forecast::Insufficient { .. } => None,
        }
    }
}

/// Headline metrics over the filtered records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub records: usize,
    pub total_sales: f64,
    pub total_quantity: f64,
    pub unique_products: usize,
}

/// Per-numeric-column summary statistics (the `describe` block).
///
/// `count` is the number of non-null values; every other field is NaN when
/// `count` is zero (std additionally requires two values).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// The complete set of named aggregates for one (filtered) record sequence.
///
/// Every aggregate is derived independently from the same filtered records;
/// no aggregate depends on another. On an empty input every aggregate takes
/// its empty/zero form, except `sales_profit` (typed absent) and `forecast`
/// (typed insufficient).
#[derive(Debug, Clone, Serialize)]
pub struct AggregateCatalog {
    pub kpis: Kpis,
    pub summary: Vec<ColumnSummary>,
    /// Daily sales totals, chronological.
    pub daily_sales: Vec<SeriesPoint>,
    /// Monthly sales totals (dates truncated to month start), chronological.
    pub monthly_sales: Vec<SeriesPoint>,
    /// Per-product sales totals, descending; ties keep first-seen order.
    pub product_sales: Vec<RankedTotal>,
    /// Per-category sales totals + share, key-ascending.
    pub category_sales: Vec<CategoryShare>,
    /// Per-category quantity totals, descending; ties keep first-seen order.
    pub category_quantity: Vec<RankedTotal>,
    /// Per-region sales totals (the region×sales pivot), key-ascending.
    pub region_sales: Vec<RankedTotal>,
    /// Per-region `total_sales` multisets, first-seen order.
    pub region_distribution: Vec<RegionSlice>,
    /// Per-customer purchase counts, id-ascending.
    pub customer_counts: Vec<CustomerCount>,
    /// Full sequence of non-null unit prices.
    pub unit_prices: Vec<f64>,
    /// `(total_sales, profit)` pairs; `None` when no record yields a pair —
    /// the caller must treat absent as "do not render".
    pub sales_profit: Option<Vec<ScatterPoint>>,
    pub correlation: CorrelationMatrix,
    pub forecast: Forecast,
}

/// A saved catalog file (JSON export).
///
/// The envelope carries enough run metadata to make the export
/// self-describing: the applied filter, the config, and load counts.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogFile {
    pub tool: String,
    pub source: String,
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_matched: usize,
    pub criteria: FilterCriteria,
    pub config: DashConfig,
    pub catalog: AggregateCatalog,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<NaiveDate>, total: Option<f64>) -> SaleRecord {
        SaleRecord {
            date,
            product: "Widget".to_string(),
            category: "Tools".to_string(),
            region: "East".to_string(),
            customer_id: "C-001".to_string(),
            quantity: Some(1.0),
            unit_price: Some(10.0),
            total_sales: total,
        }
    }

    #[test]
    fn profit_follows_margin() {
        let r = record(None, Some(250.0));
        let p = r.profit(0.2).unwrap();
        assert!((p - 50.0).abs() < 1e-12);
        let p = r.profit(0.35).unwrap();
        assert!((p - 87.5).abs() < 1e-12);
    }

    #[test]
    fn profit_is_null_without_total() {
        let r = record(None, None);
        assert!(r.profit(0.2).is_none());
    }

    #[test]
    fn date_span_skips_null_dates() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let ds = Dataset::new(vec![
            record(Some(d2), None),
            record(None, None),
            record(Some(d1), None),
        ]);
        assert_eq!(ds.date_span(), Some((d1, d2)));

        let empty = Dataset::new(vec![record(None, None)]);
        assert!(empty.date_span().is_none());
    }

    #[test]
    fn distinct_values_are_sorted_and_deduped() {
        let mut a = record(None, None);
        a.region = "West".to_string();
        let b = record(None, None);
        let c = record(None, None);
        let ds = Dataset::new(vec![a, b, c]);
        assert_eq!(ds.distinct_regions(), vec!["East", "West"]);
    }
}
