//! Aggregate Catalog computation.
//!
//! Each named aggregate is computed independently from the same filtered
//! record sequence — no aggregate depends on another, so recomputation
//! order is irrelevant and the whole catalog is deterministic for a given
//! input.
//!
//! Null handling follows the tabular-analytics conventions the rest of the
//! tool assumes: sums skip null values, date-keyed series skip null-date
//! rows, counts count rows, and undefined statistics are NaN.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::domain::{
    AggregateCatalog, CategoryShare, ColumnSummary, CorrelationMatrix, CustomerCount, DashConfig,
    Dataset, Kpis, RankedTotal, RegionSlice, SaleRecord, ScatterPoint, SeriesPoint,
};
use crate::math::{mean, pearson, quantile_sorted, sample_std};

/// Numeric columns covered by the summary block and the correlation matrix.
const NUMERIC_COLUMNS: [&str; 4] = ["quantity", "unit_price", "total_sales", "profit"];

/// Compute every named aggregate for the (already filtered) dataset.
///
/// Tolerates an empty record sequence: sums and counts come back zero,
/// series and tables come back empty, sales-vs-profit comes back absent,
/// and the forecast comes back as a typed `Insufficient`.
pub fn aggregate(dataset: &Dataset, config: &DashConfig) -> AggregateCatalog {
    let records = dataset.records.as_slice();

    AggregateCatalog {
        kpis: kpis(records),
        summary: summary(records, config.profit_margin),
        daily_sales: daily_sales(records),
        monthly_sales: monthly_sales(records),
        product_sales: ranked_desc(sum_by_first_seen(
            records,
            |r| r.product.as_str(),
            |r| r.total_sales,
        )),
        category_sales: category_sales(records),
        category_quantity: ranked_desc(sum_by_first_seen(
            records,
            |r| r.category.as_str(),
            |r| r.quantity,
        )),
        region_sales: sum_by_key_ascending(records, |r| r.region.as_str(), |r| r.total_sales),
        region_distribution: region_distribution(records),
        customer_counts: customer_counts(records),
        unit_prices: records.iter().filter_map(|r| r.unit_price).collect(),
        sales_profit: sales_profit(records, config.profit_margin),
        correlation: correlation(records, config.profit_margin),
        forecast: crate::forecast::fit_forecast(records, config),
    }
}

fn kpis(records: &[SaleRecord]) -> Kpis {
    let unique_products: HashSet<&str> = records
        .iter()
        .map(|r| r.product.as_str())
        .filter(|p| !p.is_empty())
        .collect();

    Kpis {
        records: records.len(),
        total_sales: records.iter().filter_map(|r| r.total_sales).sum(),
        total_quantity: records.iter().filter_map(|r| r.quantity).sum(),
        unique_products: unique_products.len(),
    }
}

fn summary(records: &[SaleRecord], margin: f64) -> Vec<ColumnSummary> {
    NUMERIC_COLUMNS
        .iter()
        .map(|&column| {
            let mut values: Vec<f64> = records
                .iter()
                .filter_map(|r| numeric_value(r, column, margin))
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            ColumnSummary {
                column: column.to_string(),
                count: values.len(),
                mean: mean(&values),
                std: sample_std(&values),
                min: values.first().copied().unwrap_or(f64::NAN),
                q25: quantile_sorted(&values, 0.25),
                median: quantile_sorted(&values, 0.5),
                q75: quantile_sorted(&values, 0.75),
                max: values.last().copied().unwrap_or(f64::NAN),
            }
        })
        .collect()
}

/// Group by calendar date and sum `total_sales`, chronological.
fn daily_sales(records: &[SaleRecord]) -> Vec<SeriesPoint> {
    date_keyed_sums(records, |d| d)
}

/// Group by month (dates truncated to the 1st) and sum `total_sales`.
fn monthly_sales(records: &[SaleRecord]) -> Vec<SeriesPoint> {
    date_keyed_sums(records, |d| {
        NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(d)
    })
}

fn date_keyed_sums(records: &[SaleRecord], key: impl Fn(NaiveDate) -> NaiveDate) -> Vec<SeriesPoint> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        let (Some(date), Some(total)) = (r.date, r.total_sales) else {
            continue;
        };
        *sums.entry(key(date)).or_insert(0.0) += total;
    }
    sums.into_iter()
        .map(|(date, total_sales)| SeriesPoint { date, total_sales })
        .collect()
}

/// Group-by sum preserving first-seen key order.
///
/// First-seen order is what makes the descending sort's tie-break
/// deterministic: Rust's `sort_by` is stable, so equal sums keep the order
/// the keys first appeared in the record sequence.
fn sum_by_first_seen<'a>(
    records: &'a [SaleRecord],
    key: impl Fn(&'a SaleRecord) -> &'a str,
    value: impl Fn(&SaleRecord) -> Option<f64>,
) -> Vec<RankedTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<RankedTotal> = Vec::new();

    for r in records {
        let k = key(r);
        let slot = *index.entry(k).or_insert_with(|| {
            out.push(RankedTotal {
                key: k.to_string(),
                total: 0.0,
            });
            out.len() - 1
        });
        if let Some(v) = value(r) {
            out[slot].total += v;
        }
    }

    out
}

fn ranked_desc(mut totals: Vec<RankedTotal>) -> Vec<RankedTotal> {
    totals.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    totals
}

/// Group-by sum with keys in ascending order (pivot-style output).
fn sum_by_key_ascending<'a>(
    records: &'a [SaleRecord],
    key: impl Fn(&'a SaleRecord) -> &'a str,
    value: impl Fn(&SaleRecord) -> Option<f64>,
) -> Vec<RankedTotal> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        let slot = sums.entry(key(r)).or_insert(0.0);
        if let Some(v) = value(r) {
            *slot += v;
        }
    }
    sums.into_iter()
        .map(|(k, total)| RankedTotal {
            key: k.to_string(),
            total,
        })
        .collect()
}

fn category_sales(records: &[SaleRecord]) -> Vec<CategoryShare> {
    let totals = sum_by_key_ascending(records, |r| r.category.as_str(), |r| r.total_sales);
    let grand: f64 = totals.iter().map(|t| t.total).sum();

    totals
        .into_iter()
        .map(|t| CategoryShare {
            share: if grand == 0.0 { f64::NAN } else { t.total / grand },
            category: t.key,
            total: t.total,
        })
        .collect()
}

/// The full multiset of `total_sales` values per region, first-seen order.
fn region_distribution(records: &[SaleRecord]) -> Vec<RegionSlice> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<RegionSlice> = Vec::new();

    for r in records {
        let slot = *index.entry(r.region.as_str()).or_insert_with(|| {
            out.push(RegionSlice {
                region: r.region.clone(),
                values: Vec::new(),
            });
            out.len() - 1
        });
        if let Some(v) = r.total_sales {
            out[slot].values.push(v);
        }
    }

    out
}

fn customer_counts(records: &[SaleRecord]) -> Vec<CustomerCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.customer_id.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(customer_id, purchases)| CustomerCount {
            customer_id: customer_id.to_string(),
            purchases,
        })
        .collect()
}

/// `(total_sales, profit)` for every record where both are computable.
///
/// Absent (not empty) when no record yields a pair, so callers can
/// distinguish "nothing to render" from "render an empty chart".
fn sales_profit(records: &[SaleRecord], margin: f64) -> Option<Vec<ScatterPoint>> {
    let points: Vec<ScatterPoint> = records
        .iter()
        .filter_map(|r| {
            let total_sales = r.total_sales?;
            let profit = r.profit(margin)?;
            Some(ScatterPoint {
                total_sales,
                profit,
            })
        })
        .collect();

    if points.is_empty() { None } else { Some(points) }
}

fn numeric_value(r: &SaleRecord, column: &str, margin: f64) -> Option<f64> {
    match column {
        "quantity" => r.quantity,
        "unit_price" => r.unit_price,
        "total_sales" => r.total_sales,
        "profit" => r.profit(margin),
        _ => None,
    }
}

/// Pairwise-complete Pearson correlation over the numeric columns.
///
/// For each column pair, rows missing either value are dropped before the
/// coefficient is computed; undefined entries are NaN.
fn correlation(records: &[SaleRecord], margin: f64) -> CorrelationMatrix {
    let columns: Vec<String> = NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect();

    let series: Vec<Vec<Option<f64>>> = NUMERIC_COLUMNS
        .iter()
        .map(|&c| records.iter().map(|r| numeric_value(r, c, margin)).collect())
        .collect();

    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in 0..n {
            let pairs: Vec<(f64, f64)> = series[i]
                .iter()
                .zip(series[j].iter())
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .collect();
            values[i][j] = pearson(&pairs);
        }
    }

    CorrelationMatrix { columns, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg::filter::filter;
    use crate::domain::{FilterCriteria, Forecast};
    use std::collections::BTreeSet;

    fn record(
        date: &str,
        category: &str,
        product: &str,
        region: &str,
        customer: &str,
        quantity: f64,
        total: f64,
    ) -> SaleRecord {
        SaleRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            product: product.to_string(),
            category: category.to_string(),
            region: region.to_string(),
            customer_id: customer.to_string(),
            quantity: Some(quantity),
            unit_price: Some(total / quantity.max(1.0)),
            total_sales: Some(total),
        }
    }

    fn config() -> DashConfig {
        DashConfig::default()
    }

    #[test]
    fn filtered_two_record_example() {
        // Spec-style scenario: two records, filter to one category.
        let ds = Dataset::new(vec![
            record("2024-01-01", "A", "X", "East", "C-1", 1.0, 100.0),
            record("2024-01-02", "B", "Y", "West", "C-2", 1.0, 200.0),
        ]);
        let criteria = FilterCriteria {
            categories: Some(BTreeSet::from(["A".to_string()])),
            ..FilterCriteria::default()
        };

        let catalog = aggregate(&filter(&ds, &criteria), &config());

        assert_eq!(catalog.kpis.records, 1);
        assert_eq!(catalog.daily_sales.len(), 1);
        assert_eq!(
            catalog.daily_sales[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!((catalog.daily_sales[0].total_sales - 100.0).abs() < 1e-12);

        assert_eq!(catalog.product_sales.len(), 1);
        assert_eq!(catalog.product_sales[0].key, "X");
        assert!((catalog.product_sales[0].total - 100.0).abs() < 1e-12);

        // Correlation over a single row is undefined, not a panic.
        for row in &catalog.correlation.values {
            assert!(row.iter().all(|v| v.is_nan()));
        }
    }

    #[test]
    fn empty_input_degrades_to_zero_forms() {
        let catalog = aggregate(&Dataset::default(), &config());

        assert_eq!(catalog.kpis.records, 0);
        assert_eq!(catalog.kpis.total_sales, 0.0);
        assert!(catalog.daily_sales.is_empty());
        assert!(catalog.monthly_sales.is_empty());
        assert!(catalog.product_sales.is_empty());
        assert!(catalog.category_sales.is_empty());
        assert!(catalog.region_sales.is_empty());
        assert!(catalog.customer_counts.is_empty());
        assert!(catalog.unit_prices.is_empty());
        assert!(catalog.sales_profit.is_none());
        assert!(matches!(
            catalog.forecast,
            Forecast::Insufficient { dated_records: 0 }
        ));
        for s in &catalog.summary {
            assert_eq!(s.count, 0);
            assert!(s.mean.is_nan());
        }
    }

    #[test]
    fn ranked_sorts_descending_with_stable_ties() {
        let ds = Dataset::new(vec![
            record("2024-01-01", "A", "P1", "East", "C-1", 1.0, 50.0),
            record("2024-01-01", "A", "P2", "East", "C-1", 1.0, 80.0),
            record("2024-01-01", "A", "P3", "East", "C-1", 1.0, 50.0),
            record("2024-01-01", "A", "P1", "East", "C-1", 1.0, 30.0),
        ]);

        let catalog = aggregate(&ds, &config());
        let keys: Vec<&str> = catalog.product_sales.iter().map(|t| t.key.as_str()).collect();
        // P1 and P2 both sum to 80; P1 was seen first.
        assert_eq!(keys, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let ds = Dataset::new(vec![
            record("2024-01-03", "A", "X", "East", "C-2", 2.0, 40.0),
            record("2024-01-01", "B", "Y", "West", "C-1", 1.0, 10.0),
            record("2024-01-02", "A", "X", "East", "C-2", 3.0, 60.0),
        ]);

        let a = aggregate(&ds, &config());
        let b = aggregate(&ds, &config());

        assert_eq!(a.daily_sales, b.daily_sales);
        assert_eq!(a.product_sales, b.product_sales);
        assert_eq!(a.customer_counts, b.customer_counts);
        assert_eq!(a.forecast, b.forecast);
    }

    #[test]
    fn monthly_series_truncates_to_month_start() {
        let ds = Dataset::new(vec![
            record("2024-01-05", "A", "X", "East", "C-1", 1.0, 10.0),
            record("2024-01-25", "A", "X", "East", "C-1", 1.0, 20.0),
            record("2024-02-02", "A", "X", "East", "C-1", 1.0, 5.0),
        ]);

        let catalog = aggregate(&ds, &config());
        assert_eq!(catalog.monthly_sales.len(), 2);
        assert_eq!(
            catalog.monthly_sales[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!((catalog.monthly_sales[0].total_sales - 30.0).abs() < 1e-12);
        assert_eq!(
            catalog.monthly_sales[1].date,
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn null_values_propagate_without_rejection() {
        let mut broken = record("2024-01-02", "A", "X", "East", "C-1", 1.0, 10.0);
        broken.total_sales = None;
        broken.quantity = None;
        let ds = Dataset::new(vec![
            record("2024-01-01", "A", "X", "East", "C-1", 2.0, 20.0),
            broken,
        ]);

        let catalog = aggregate(&ds, &config());
        // The null-total row contributes to counts but not sums.
        assert_eq!(catalog.kpis.records, 2);
        assert!((catalog.kpis.total_sales - 20.0).abs() < 1e-12);
        assert_eq!(catalog.daily_sales.len(), 1);
        assert_eq!(catalog.customer_counts[0].purchases, 2);
        // Only the valued row yields a sales/profit pair.
        assert_eq!(catalog.sales_profit.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn category_share_sums_to_one() {
        let ds = Dataset::new(vec![
            record("2024-01-01", "A", "X", "East", "C-1", 1.0, 30.0),
            record("2024-01-01", "B", "Y", "East", "C-1", 1.0, 70.0),
        ]);

        let catalog = aggregate(&ds, &config());
        let total_share: f64 = catalog.category_sales.iter().map(|c| c.share).sum();
        assert!((total_share - 1.0).abs() < 1e-12);
        // Key-ascending order.
        assert_eq!(catalog.category_sales[0].category, "A");
        assert!((catalog.category_sales[1].share - 0.7).abs() < 1e-12);
    }

    #[test]
    fn correlation_of_proportional_columns_is_one() {
        let ds = Dataset::new(vec![
            record("2024-01-01", "A", "X", "East", "C-1", 1.0, 10.0),
            record("2024-01-02", "A", "X", "East", "C-1", 2.0, 20.0),
            record("2024-01-03", "A", "X", "East", "C-1", 3.0, 35.0),
        ]);

        let catalog = aggregate(&ds, &config());
        let cols = &catalog.correlation.columns;
        let sales_idx = cols.iter().position(|c| c == "total_sales").unwrap();
        let profit_idx = cols.iter().position(|c| c == "profit").unwrap();

        // profit = total_sales * margin, so the pair correlates perfectly.
        let r = catalog.correlation.values[sales_idx][profit_idx];
        assert!((r - 1.0).abs() < 1e-9);
        // Diagonal of a varying column is 1 as well.
        let d = catalog.correlation.values[sales_idx][sales_idx];
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn region_tables_cover_distribution_and_pivot() {
        let ds = Dataset::new(vec![
            record("2024-01-01", "A", "X", "West", "C-1", 1.0, 10.0),
            record("2024-01-01", "A", "X", "East", "C-1", 1.0, 20.0),
            record("2024-01-02", "A", "X", "West", "C-1", 1.0, 30.0),
        ]);

        let catalog = aggregate(&ds, &config());

        // Distribution keeps first-seen region order and full multisets.
        assert_eq!(catalog.region_distribution[0].region, "West");
        assert_eq!(catalog.region_distribution[0].values, vec![10.0, 30.0]);

        // Pivot is key-ascending with summed totals.
        assert_eq!(catalog.region_sales[0].key, "East");
        assert!((catalog.region_sales[1].total - 40.0).abs() < 1e-12);
    }
}
