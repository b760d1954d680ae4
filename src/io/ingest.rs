//! CSV ingest and normalization.
//!
//! This module turns a sales CSV into a clean `Dataset` that is safe to
//! filter and aggregate.
//!
//! Design goals:
//! - **Strict schema for column presence** (clear errors + exit code 2):
//!   every aggregate consumes the eight required columns, so a missing
//!   column is a top-level load failure, not something to limp past.
//! - **Lenient values**: an unparseable date or number coerces to null and
//!   the row stays. Only structurally broken CSV rows are skipped, and
//!   those are reported as `RowError` values rather than failures.
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Dataset, SaleRecord};
use crate::error::AppError;

/// Columns every sales CSV must carry (after header normalization).
const REQUIRED_COLUMNS: [&str; 8] = [
    "date",
    "product",
    "category",
    "region",
    "customer_id",
    "quantity",
    "unit_price",
    "total_sales",
];

/// A row-level problem encountered during ingest.
///
/// These never abort the load; they are surfaced in the report so the user
/// can see what was skipped.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the dataset plus provenance counters.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    /// Human-readable source label ("path/to.csv" or "sample").
    pub source: String,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Rows whose date cell was non-empty but unparseable (coerced to null).
    pub coerced_dates: usize,
    pub row_errors: Vec<RowError>,
}

impl IngestedData {
    /// Wrap an already-built record sequence (synthetic sample data).
    pub fn from_records(records: Vec<SaleRecord>, source: impl Into<String>) -> Self {
        let n = records.len();
        Self {
            dataset: Dataset::new(records),
            source: source.into(),
            rows_read: n,
            rows_used: n,
            coerced_dates: 0,
            row_errors: Vec::new(),
        }
    }
}

/// Load and normalize a sales CSV.
pub fn load_sales_csv(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_sales_csv(file, path.display().to_string())
}

/// Load from any reader (used directly by tests).
pub fn read_sales_csv<R: Read>(reader: R, source: String) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut coerced_dates = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let (row, date_coerced) = parse_row(&record, &header_map);
        if date_coerced {
            coerced_dates += 1;
        }
        records.push(row);
    }

    let rows_used = records.len();

    Ok(IngestedData {
        dataset: Dataset::new(records),
        source,
        rows_read,
        rows_used,
        coerced_dates,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿Date"). If we don't strip it, schema validation
    // will incorrectly report missing columns. Surrounding whitespace in
    // header cells is trimmed before use for the same reason.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for col in REQUIRED_COLUMNS {
        if !header_map.contains_key(col) {
            return Err(AppError::input(format!("Missing required column: `{col}`")));
        }
    }
    Ok(())
}

/// Parse one CSV row into a `SaleRecord`, coercing instead of rejecting.
///
/// Returns the record plus whether a non-empty date cell failed to parse.
fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> (SaleRecord, bool) {
    let raw_date = get_optional(record, header_map, "date");
    let date = raw_date.and_then(parse_date_lenient);
    let date_coerced = raw_date.is_some() && date.is_none();

    let row = SaleRecord {
        date,
        product: get_text(record, header_map, "product"),
        category: get_text(record, header_map, "category"),
        region: get_text(record, header_map, "region"),
        customer_id: get_text(record, header_map, "customer_id"),
        quantity: parse_opt_f64(get_optional(record, header_map, "quantity")),
        unit_price: parse_opt_f64(get_optional(record, header_map, "unit_price")),
        total_sales: parse_opt_f64(get_optional(record, header_map, "total_sales")),
    };

    (row, date_coerced)
}

fn get_text(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> String {
    get_optional(record, header_map, name)
        .unwrap_or_default()
        .to_string()
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a date leniently; `None` means "unknown", never a failure.
///
/// We recommend ISO dates (`YYYY-MM-DD`), but sales exports often use
/// `DD/MM/YYYY` or `DD-MM-YYYY`. We accept a small set of common formats to
/// reduce friction while keeping parsing deterministic.
fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> IngestedData {
        read_sales_csv(text.as_bytes(), "test".to_string()).unwrap()
    }

    #[test]
    fn loads_well_formed_rows() {
        let data = load(
            "Date,Product,Category,Region,Customer_ID,Quantity,Unit_Price,Total_Sales\n\
             2024-01-01,Widget,Tools,East,C-001,2,10.5,21.0\n\
             2024-01-02,Gadget,Toys,West,C-002,1,5.0,5.0\n",
        );

        assert_eq!(data.rows_read, 2);
        assert_eq!(data.rows_used, 2);
        assert!(data.row_errors.is_empty());

        let r = &data.dataset.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(r.product, "Widget");
        assert_eq!(r.customer_id, "C-001");
        assert_eq!(r.quantity, Some(2.0));
        assert_eq!(r.total_sales, Some(21.0));
    }

    #[test]
    fn header_names_are_trimmed_and_bom_stripped() {
        let data = load(
            "\u{feff} Date , Product ,Category,Region,Customer_ID,Quantity,Unit_Price,Total_Sales\n\
             2024-03-05,Widget,Tools,East,C-001,1,2.0,2.0\n",
        );
        assert_eq!(data.rows_used, 1);
        assert_eq!(
            data.dataset.records[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn bad_dates_coerce_to_null_instead_of_failing() {
        let data = load(
            "Date,Product,Category,Region,Customer_ID,Quantity,Unit_Price,Total_Sales\n\
             not-a-date,Widget,Tools,East,C-001,1,2.0,2.0\n\
             2024-01-02,Gadget,Toys,West,C-002,1,5.0,5.0\n",
        );

        assert_eq!(data.rows_used, 2);
        assert_eq!(data.coerced_dates, 1);
        assert!(data.dataset.records[0].date.is_none());
        assert!(data.dataset.records[1].date.is_some());
    }

    #[test]
    fn bad_numbers_coerce_to_null() {
        let data = load(
            "Date,Product,Category,Region,Customer_ID,Quantity,Unit_Price,Total_Sales\n\
             2024-01-01,Widget,Tools,East,C-001,two,n/a,100.0\n",
        );

        let r = &data.dataset.records[0];
        assert!(r.quantity.is_none());
        assert!(r.unit_price.is_none());
        assert_eq!(r.total_sales, Some(100.0));
    }

    #[test]
    fn missing_required_column_is_a_load_failure() {
        let err = read_sales_csv(
            "Date,Product,Category,Region,Customer_ID,Quantity,Unit_Price\n".as_bytes(),
            "test".to_string(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn accepts_common_date_formats() {
        assert_eq!(
            parse_date_lenient("2024-02-03"),
            NaiveDate::from_ymd_opt(2024, 2, 3)
        );
        assert_eq!(
            parse_date_lenient("03/02/2024"),
            NaiveDate::from_ymd_opt(2024, 2, 3)
        );
        assert_eq!(
            parse_date_lenient("03-02-2024"),
            NaiveDate::from_ymd_opt(2024, 2, 3)
        );
        assert_eq!(parse_date_lenient("02/30/2024"), None);
    }
}
