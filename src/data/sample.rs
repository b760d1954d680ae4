//! Synthetic sales data generation.
//!
//! Demo mode: when the user supplies no CSV, we generate a plausible sales
//! table so every screen of the dashboard renders with real-looking data.
//! Generation is fully seeded — the same `(count, seed, end_date)` triple
//! always yields the same records.
//!
//! `total_sales` is produced with multiplicative noise around
//! `quantity × unit_price`, because the real column is independently
//! supplied (discounts, fees) and downstream code must not assume the
//! identity holds.

use chrono::{Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::domain::SaleRecord;
use crate::error::AppError;

/// Number of calendar days the sample spans, ending at `end_date`.
const SAMPLE_WINDOW_DAYS: u64 = 120;

/// Customer pool size (ids `C-001` .. `C-040`).
const CUSTOMER_POOL: u32 = 40;

/// Product catalog: name, category, base unit price.
const PRODUCTS: [(&str, &str, f64); 9] = [
    ("Laptop", "Electronics", 950.0),
    ("Smartphone", "Electronics", 620.0),
    ("Headphones", "Electronics", 120.0),
    ("Desk", "Furniture", 340.0),
    ("Office Chair", "Furniture", 185.0),
    ("Notebook", "Stationery", 4.5),
    ("Pen Set", "Stationery", 9.0),
    ("Backpack", "Accessories", 55.0),
    ("Water Bottle", "Accessories", 18.0),
];

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Generate `count` synthetic sale records ending at `end_date`.
pub fn generate_sample(
    count: usize,
    seed: u64,
    end_date: NaiveDate,
) -> Result<Vec<SaleRecord>, AppError> {
    if count == 0 {
        return Err(AppError::input("Sample count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let price_noise = LogNormal::new(0.0, 0.08)
        .map_err(|e| AppError::runtime(format!("Price noise distribution error: {e}")))?;
    let total_noise = Normal::new(0.0, 0.05)
        .map_err(|e| AppError::runtime(format!("Total noise distribution error: {e}")))?;

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let back = rng.gen_range(0..SAMPLE_WINDOW_DAYS);
        let date = end_date
            .checked_sub_days(Days::new(back))
            .unwrap_or(end_date);

        let (product, category, base_price) = PRODUCTS[rng.gen_range(0..PRODUCTS.len())];
        let region = REGIONS[rng.gen_range(0..REGIONS.len())];
        let customer = rng.gen_range(1..=CUSTOMER_POOL);

        let quantity = rng.gen_range(1..=8) as f64;
        let unit_price = round2(base_price * price_noise.sample(&mut rng));
        // Discount/fee noise: totals deviate from quantity × unit_price.
        let total_sales = round2((quantity * unit_price * (1.0 + total_noise.sample(&mut rng))).max(0.0));

        records.push(SaleRecord {
            date: Some(date),
            product: product.to_string(),
            category: category.to_string(),
            region: region.to_string(),
            customer_id: format!("C-{customer:03}"),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            total_sales: Some(total_sales),
        });
    }

    Ok(records)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn sample_is_deterministic_per_seed() {
        let a = generate_sample(50, 7, end()).unwrap();
        let b = generate_sample(50, 7, end()).unwrap();
        assert_eq!(a, b);

        let c = generate_sample(50, 8, end()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn sample_fields_are_well_formed() {
        let records = generate_sample(200, 42, end()).unwrap();
        assert_eq!(records.len(), 200);

        let earliest = end()
            .checked_sub_days(Days::new(SAMPLE_WINDOW_DAYS))
            .unwrap();
        for r in &records {
            let d = r.date.unwrap();
            assert!(d > earliest && d <= end());
            assert!(!r.product.is_empty());
            assert!(!r.category.is_empty());
            assert!(REGIONS.contains(&r.region.as_str()));
            let q = r.quantity.unwrap();
            assert!((1.0..=8.0).contains(&q));
            assert!(r.unit_price.unwrap() > 0.0);
            assert!(r.total_sales.unwrap() >= 0.0);
        }
    }

    #[test]
    fn zero_count_is_rejected() {
        let err = generate_sample(0, 42, end()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
