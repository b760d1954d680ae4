//! Export aggregates to CSV/JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets or
//! downstream scripts:
//!
//! - daily series CSV: `date,total_sales`
//! - forecast CSV: `date,predicted_sales`
//! - catalog JSON: the full `CatalogFile` envelope (run metadata + every
//!   named aggregate); non-finite numbers serialize as `null`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{CatalogFile, Forecast, SeriesPoint};
use crate::error::AppError;

/// Write the daily sales series to a CSV file.
pub fn write_daily_csv(path: &Path, series: &[SeriesPoint]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "date,total_sales")
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for p in series {
        writeln!(file, "{},{:.2}", p.date, p.total_sales)
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the forecast series to a CSV file.
///
/// An insufficient forecast writes the header only — the file shape stays
/// stable for downstream consumers either way.
pub fn write_forecast_csv(path: &Path, forecast: &Forecast) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "date,predicted_sales")
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    if let Forecast::Ready { points, .. } = forecast {
        for p in points {
            writeln!(file, "{},{:.2}", p.date, p.predicted_sales)
                .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    Ok(())
}

/// Write the full catalog (plus run metadata) as pretty JSON.
pub fn write_catalog_json(path: &Path, catalog_file: &CatalogFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create catalog JSON '{}': {e}",
            path.display()
        ))
    })?;

    serde_json::to_writer_pretty(file, catalog_file)
        .map_err(|e| AppError::input(format!("Failed to write catalog JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn daily_csv_round_trips_through_text() {
        let dir = std::env::temp_dir().join("sales_dash_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("daily.csv");

        let series = vec![
            SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                total_sales: 100.5,
            },
            SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                total_sales: 80.0,
            },
        ];
        write_daily_csv(&path, &series).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "date,total_sales\n2024-01-01,100.50\n2024-01-02,80.00\n"
        );
    }

    #[test]
    fn insufficient_forecast_writes_header_only() {
        let dir = std::env::temp_dir().join("sales_dash_export_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("forecast.csv");

        write_forecast_csv(&path, &Forecast::Insufficient { dated_records: 1 }).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "date,predicted_sales\n");
    }
}
