//! Linear sales trend forecast.
//!
//! The model is deliberately trivial: an ordinary-least-squares line of
//! `total_sales` against the proleptic-Gregorian ordinal of the sale date,
//! projected forward day by day. No seasonality, no validation metric, no
//! error bars — the holdout side of the split is discarded after the fit.
//!
//! What *is* engineered here is the degenerate-input handling:
//!
//! - fewer than 2 rows carrying both a date and a total → typed
//!   `Insufficient`, the fit is never attempted
//! - fewer than 2 distinct dates on the train side → `Insufficient`
//!   (the slope is unidentifiable)
//! - the 20% holdout never starves the fit below 2 rows
//!
//! The fit/holdout split is a seeded shuffle, so the same filtered records
//! and the same seed always produce the same forecast.

use chrono::{Datelike, Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::domain::{
    DashConfig, Forecast, ForecastPoint, SaleRecord, TrendLine, HOLDOUT_FRACTION,
};

/// Fit the trend on the filtered records and project `horizon_days` forward.
///
/// The projected dates start the day after the maximum date observed in the
/// filtered records and increase strictly by one day.
pub fn fit_forecast(records: &[SaleRecord], config: &DashConfig) -> Forecast {
    // Rows eligible for fitting: date and total both present.
    let fit_rows: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| Some((r.date?, r.total_sales?)))
        .collect();

    let dated_records = fit_rows.len();
    if dated_records < 2 {
        return Forecast::Insufficient { dated_records };
    }

    // Deterministic 80/20 split: shuffle row indices with a fixed seed and
    // drop the holdout prefix. The holdout is clamped so at least two rows
    // remain on the train side.
    let mut indices: Vec<usize> = (0..dated_records).collect();
    let mut rng = StdRng::seed_from_u64(config.split_seed);
    indices.shuffle(&mut rng);

    let holdout = ((dated_records as f64) * HOLDOUT_FRACTION).floor() as usize;
    let holdout = holdout.min(dated_records - 2);
    let train = &indices[holdout..];

    let xs: Vec<f64> = train
        .iter()
        .map(|&i| f64::from(fit_rows[i].0.num_days_from_ce()))
        .collect();
    let ys: Vec<f64> = train.iter().map(|&i| fit_rows[i].1).collect();

    let mut distinct = xs.clone();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    distinct.dedup();
    if distinct.len() < 2 {
        return Forecast::Insufficient { dated_records };
    }

    let Some((intercept, slope)) = crate::math::fit_line(&xs, &ys) else {
        return Forecast::Insufficient { dated_records };
    };

    // Projection starts after the maximum date in the filtered dataset,
    // which may come from a row whose total is null.
    let last_date = records
        .iter()
        .filter_map(|r| r.date)
        .max()
        .unwrap_or(fit_rows[fit_rows.len() - 1].0);

    let mut points = Vec::with_capacity(config.horizon_days as usize);
    for offset in 1..=u64::from(config.horizon_days) {
        let Some(date) = last_date.checked_add_days(Days::new(offset)) else {
            break;
        };
        let predicted_sales = intercept + slope * f64::from(date.num_days_from_ce());
        points.push(ForecastPoint {
            date,
            predicted_sales,
        });
    }

    Forecast::Ready {
        line: TrendLine {
            intercept,
            slope,
            n_train: train.len(),
        },
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, total: f64) -> SaleRecord {
        SaleRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            product: "Widget".to_string(),
            category: "Tools".to_string(),
            region: "East".to_string(),
            customer_id: "C-001".to_string(),
            quantity: Some(1.0),
            unit_price: Some(total),
            total_sales: Some(total),
        }
    }

    fn config(horizon: u32) -> DashConfig {
        DashConfig {
            horizon_days: horizon,
            ..DashConfig::default()
        }
    }

    #[test]
    fn single_record_is_insufficient() {
        let records = vec![record("2024-01-01", 100.0)];
        assert_eq!(
            fit_forecast(&records, &config(30)),
            Forecast::Insufficient { dated_records: 1 }
        );
    }

    #[test]
    fn undated_rows_do_not_count_toward_the_threshold() {
        let mut undated = record("2024-01-02", 50.0);
        undated.date = None;
        let records = vec![record("2024-01-01", 100.0), undated];
        assert_eq!(
            fit_forecast(&records, &config(30)),
            Forecast::Insufficient { dated_records: 1 }
        );
    }

    #[test]
    fn one_distinct_date_is_insufficient() {
        let records = vec![
            record("2024-01-01", 100.0),
            record("2024-01-01", 120.0),
            record("2024-01-01", 90.0),
        ];
        assert!(matches!(
            fit_forecast(&records, &config(30)),
            Forecast::Insufficient { .. }
        ));
    }

    #[test]
    fn horizon_dates_start_after_max_and_increase() {
        // Max date 2024-01-10, horizon 7 -> 2024-01-11 ..= 2024-01-17.
        let records = vec![record("2024-01-08", 100.0), record("2024-01-10", 120.0)];
        let Forecast::Ready { points, line } = fit_forecast(&records, &config(7)) else {
            panic!("expected a forecast");
        };

        assert_eq!(line.n_train, 2);
        assert_eq!(points.len(), 7);
        assert_eq!(
            points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
        assert_eq!(
            points[6].date,
            NaiveDate::from_ymd_opt(2024, 1, 17).unwrap()
        );
        for pair in points.windows(2) {
            assert!(pair[1].date > pair[0].date);
        }
    }

    #[test]
    fn perfectly_linear_input_extends_the_line() {
        // 10 rows on y = 10 * day_index + 100; the split cannot change the fit.
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let records: Vec<SaleRecord> = (0..10)
            .map(|i| {
                let d = base.checked_add_days(Days::new(i)).unwrap();
                record(&d.format("%Y-%m-%d").to_string(), 100.0 + 10.0 * i as f64)
            })
            .collect();

        let Forecast::Ready { points, .. } = fit_forecast(&records, &config(7)) else {
            panic!("expected a forecast");
        };

        // Day 10 (first future day) continues the line at 200.
        assert!((points[0].predicted_sales - 200.0).abs() < 1e-6);
        assert!((points[6].predicted_sales - 260.0).abs() < 1e-6);
    }

    #[test]
    fn max_date_may_come_from_a_null_total_row() {
        let mut late_null = record("2024-01-20", 0.0);
        late_null.total_sales = None;
        let records = vec![
            record("2024-01-01", 100.0),
            record("2024-01-02", 110.0),
            late_null,
        ];

        let Forecast::Ready { points, .. } = fit_forecast(&records, &config(7)) else {
            panic!("expected a forecast");
        };
        assert_eq!(
            points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 21).unwrap()
        );
    }

    #[test]
    fn forecast_is_reproducible() {
        let records: Vec<SaleRecord> = (1..=20)
            .map(|i| record(&format!("2024-01-{i:02}"), 50.0 + (i % 7) as f64 * 12.0))
            .collect();

        let a = fit_forecast(&records, &config(30));
        let b = fit_forecast(&records, &config(30));
        assert_eq!(a, b);
    }
}
