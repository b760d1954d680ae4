//! Plain-text rendering of the Aggregate Catalog.
//!
//! Every section degrades gracefully: empty tables render their headers with
//! a "(no data)" line, the sales-vs-profit section turns into a visible
//! warning when the pairs are absent, and the forecast section prints a
//! notice instead of a table when the fit was skipped.

use crate::domain::{
    AggregateCatalog, CategoryShare, ColumnSummary, CorrelationMatrix, CustomerCount, DashConfig,
    FilterCriteria, Forecast, Kpis, RankedTotal, RegionSlice, ScatterPoint, SeriesPoint,
};
use crate::io::ingest::IngestedData;
use crate::math::quantile_sorted;

/// Format the run header: source, load counters, active filter, match count.
pub fn format_overview(
    ingest: &IngestedData,
    criteria: &FilterCriteria,
    rows_matched: usize,
    config: &DashConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== sd - Sales Data Analysis Dashboard ===\n");
    out.push_str(&format!(
        "Source: {} (rows: {} read, {} used, {} skipped",
        ingest.source,
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len(),
    ));
    if ingest.coerced_dates > 0 {
        out.push_str(&format!(", {} dates coerced to null", ingest.coerced_dates));
    }
    out.push_str(")\n");

    // Surface the first few skipped rows so silent data loss stays visible.
    for e in ingest.row_errors.iter().take(3) {
        out.push_str(&format!("  skipped row {}: {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > 3 {
        out.push_str(&format!(
            "  (+{} more skipped rows)\n",
            ingest.row_errors.len() - 3
        ));
    }

    out.push_str(&format!("Filter: {}\n", format_criteria(criteria)));
    out.push_str(&format!(
        "Matched: {} of {} records | margin: {:.0}% | horizon: {}d\n",
        rows_matched,
        ingest.dataset.len(),
        config.profit_margin * 100.0,
        config.horizon_days,
    ));

    out
}

/// One-line rendering of the active filter.
pub fn format_criteria(criteria: &FilterCriteria) -> String {
    if criteria.is_unrestricted() {
        return "all records".to_string();
    }

    let dates = match (criteria.start_date, criteria.end_date) {
        (None, None) => "any date".to_string(),
        (Some(s), None) => format!("{s}.."),
        (None, Some(e)) => format!("..{e}"),
        (Some(s), Some(e)) => format!("{s}..{e}"),
    };

    let set = |name: &str, s: &Option<std::collections::BTreeSet<String>>| match s {
        None => format!("{name}: all"),
        Some(values) => format!(
            "{name}: {}",
            values.iter().cloned().collect::<Vec<_>>().join(",")
        ),
    };

    format!(
        "{dates} | {} | {} | {}",
        set("categories", &criteria.categories),
        set("products", &criteria.products),
        set("regions", &criteria.regions),
    )
}

pub fn format_kpis(kpis: &Kpis) -> String {
    let mut out = String::new();
    out.push_str("Key performance indicators:\n");
    out.push_str(&format!("- total sales    : {}\n", fmt_money(kpis.total_sales)));
    out.push_str(&format!("- total quantity : {}\n", kpis.total_quantity as i64));
    out.push_str(&format!("- unique products: {}\n", kpis.unique_products));
    out.push_str(&format!("- records        : {}\n", kpis.records));
    out
}

/// The `describe`-style table over the numeric columns.
pub fn format_summary(summary: &[ColumnSummary]) -> String {
    let mut out = String::new();
    out.push_str("Summary statistics:\n");
    out.push_str(&format!(
        "{:<12} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    ));
    for s in summary {
        out.push_str(&format!(
            "{:<12} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            s.column,
            s.count,
            fmt_stat(s.mean),
            fmt_stat(s.std),
            fmt_stat(s.min),
            fmt_stat(s.q25),
            fmt_stat(s.median),
            fmt_stat(s.q75),
            fmt_stat(s.max),
        ));
    }
    out
}

/// Ranked table (top products, category quantities, ...).
pub fn format_ranked(title: &str, rows: &[RankedTotal], top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}:\n"));
    if rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    for r in rows.iter().take(top_n) {
        out.push_str(&format!(
            "{:<24} {:>14}\n",
            truncate(&r.key, 24),
            fmt_money(r.total)
        ));
    }
    if rows.len() > top_n {
        out.push_str(&format!("(+{} more)\n", rows.len() - top_n));
    }
    out
}

pub fn format_category_sales(rows: &[CategoryShare]) -> String {
    let mut out = String::new();
    out.push_str("Sales contribution by category:\n");
    if rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    for c in rows {
        let share = if c.share.is_nan() {
            "-".to_string()
        } else {
            format!("{:.1}%", c.share * 100.0)
        };
        out.push_str(&format!(
            "{:<24} {:>14} {:>8}\n",
            truncate(&c.category, 24),
            fmt_money(c.total),
            share
        ));
    }
    out
}

/// Region totals plus a five-number summary of each region's sales values.
pub fn format_regions(pivot: &[RankedTotal], distribution: &[RegionSlice]) -> String {
    let mut out = String::new();
    out.push_str("Sales by region:\n");
    if pivot.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    for r in pivot {
        out.push_str(&format!(
            "{:<16} {:>14}\n",
            truncate(&r.key, 16),
            fmt_money(r.total)
        ));
    }

    out.push_str("\nSales distribution by region (min / q1 / median / q3 / max):\n");
    for slice in distribution {
        let mut sorted = slice.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out.push_str(&format!(
            "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            truncate(&slice.region, 16),
            fmt_stat(sorted.first().copied().unwrap_or(f64::NAN)),
            fmt_stat(quantile_sorted(&sorted, 0.25)),
            fmt_stat(quantile_sorted(&sorted, 0.5)),
            fmt_stat(quantile_sorted(&sorted, 0.75)),
            fmt_stat(sorted.last().copied().unwrap_or(f64::NAN)),
        ));
    }
    out
}

pub fn format_customer_counts(rows: &[CustomerCount], top_n: usize) -> String {
    let mut out = String::new();
    out.push_str("Customer purchase frequency:\n");
    if rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    for c in rows.iter().take(top_n) {
        out.push_str(&format!(
            "{:<16} {:>6}\n",
            truncate(&c.customer_id, 16),
            c.purchases
        ));
    }
    if rows.len() > top_n {
        out.push_str(&format!("(+{} more customers)\n", rows.len() - top_n));
    }
    out
}

/// Correlation grid; NaN entries render as `-`.
pub fn format_correlation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    out.push_str("Correlation matrix (Pearson, pairwise-complete):\n");

    out.push_str(&format!("{:<12}", ""));
    for c in &matrix.columns {
        out.push_str(&format!(" {:>11}", truncate(c, 11)));
    }
    out.push('\n');

    for (i, c) in matrix.columns.iter().enumerate() {
        out.push_str(&format!("{:<12}", truncate(c, 12)));
        for v in &matrix.values[i] {
            out.push_str(&format!(" {:>11}", fmt_corr(*v)));
        }
        out.push('\n');
    }
    out
}

/// Sales-vs-profit section; absent pairs become a visible warning.
pub fn format_sales_profit(pairs: Option<&[ScatterPoint]>, margin: f64) -> String {
    let Some(pairs) = pairs else {
        return "Warning: profit values are missing or all null; sales-vs-profit view skipped.\n"
            .to_string();
    };

    let total: f64 = pairs.iter().map(|p| p.total_sales).sum();
    let profit: f64 = pairs.iter().map(|p| p.profit).sum();
    format!(
        "Sales vs. profit: {} pairs | sales {} | profit {} (margin {:.0}%)\n",
        pairs.len(),
        fmt_money(total),
        fmt_money(profit),
        margin * 100.0,
    )
}

/// Forecast table, or the insufficiency notice.
pub fn format_forecast(forecast: &Forecast, horizon_days: u32) -> String {
    match forecast {
        Forecast::Insufficient { dated_records } => format!(
            "Forecast unavailable: needs at least 2 dated records with sales totals (have {dated_records}).\n"
        ),
        Forecast::Ready { line, points } => {
            let mut out = String::new();
            out.push_str(&format!(
                "Future sales forecast (next {horizon_days} days, linear trend, {} fitted rows, slope {:+.2}/day):\n",
                line.n_train, line.slope,
            ));
            out.push_str(&format!("{:<12} {:>14}\n", "date", "predicted"));
            for p in points {
                out.push_str(&format!(
                    "{:<12} {:>14}\n",
                    p.date,
                    fmt_money(p.predicted_sales)
                ));
            }
            out
        }
    }
}

/// Daily/monthly series as a compact two-column table.
pub fn format_series(title: &str, series: &[SeriesPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}:\n"));
    if series.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }
    for p in series {
        out.push_str(&format!(
            "{:<12} {:>14}\n",
            p.date,
            fmt_money(p.total_sales)
        ));
    }
    out
}

/// Assemble the full report body (everything below the overview header).
pub fn format_catalog(catalog: &AggregateCatalog, config: &DashConfig) -> String {
    let mut out = String::new();

    out.push_str(&format_kpis(&catalog.kpis));
    out.push('\n');
    out.push_str(&format_summary(&catalog.summary));
    out.push('\n');
    out.push_str(&format_series(
        "Monthly sales trend",
        &catalog.monthly_sales,
    ));
    out.push('\n');
    out.push_str(&format_ranked(
        "Top selling products",
        &catalog.product_sales,
        config.top_n,
    ));
    out.push('\n');
    out.push_str(&format_category_sales(&catalog.category_sales));
    out.push('\n');
    out.push_str(&format_ranked(
        "Quantity sold per category",
        &catalog.category_quantity,
        config.top_n,
    ));
    out.push('\n');
    out.push_str(&format_regions(
        &catalog.region_sales,
        &catalog.region_distribution,
    ));
    out.push('\n');
    out.push_str(&format_customer_counts(&catalog.customer_counts, config.top_n));
    out.push('\n');
    out.push_str(&format_correlation(&catalog.correlation));
    out.push('\n');
    out.push_str(&format_sales_profit(
        catalog.sales_profit.as_deref(),
        config.profit_margin,
    ));
    out.push('\n');
    out.push_str(&format_forecast(&catalog.forecast, config.horizon_days));

    out
}

/// `$1,234.56`-style money formatting (sign-aware).
pub fn fmt_money(v: f64) -> String {
    if v.is_nan() {
        return "-".to_string();
    }
    let negative = v < 0.0;
    let cents = (v.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.2}")
    }
}

fn fmt_corr(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.3}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
