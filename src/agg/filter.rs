//! Record filtering.
//!
//! A record passes iff:
//! - its date lies in the inclusive `[start, end]` interval; a record with a
//!   null date never passes a bounded interval (matching how null dates
//!   compare in the source data model), but passes when both bounds are open
//! - its category, product, and region are each members of the
//!   corresponding allowed set, where an absent set means "unrestricted"
//!
//! Matching is exact on the trimmed values produced by ingest.

use std::collections::BTreeSet;

use crate::domain::{Dataset, FilterCriteria, SaleRecord};

/// Return the subsequence of records satisfying `criteria`.
///
/// An empty result is a valid outcome, not an error: every downstream
/// aggregate tolerates an empty record sequence.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    Dataset::new(
        dataset
            .records
            .iter()
            .filter(|r| matches(r, criteria))
            .cloned()
            .collect(),
    )
}

/// Predicate for a single record.
pub fn matches(record: &SaleRecord, criteria: &FilterCriteria) -> bool {
    if criteria.start_date.is_some() || criteria.end_date.is_some() {
        let Some(date) = record.date else {
            return false;
        };
        if let Some(start) = criteria.start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = criteria.end_date {
            if date > end {
                return false;
            }
        }
    }

    in_set(&record.category, criteria.categories.as_ref())
        && in_set(&record.product, criteria.products.as_ref())
        && in_set(&record.region, criteria.regions.as_ref())
}

fn in_set(value: &str, allowed: Option<&BTreeSet<String>>) -> bool {
    match allowed {
        None => true,
        Some(set) => set.contains(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: Option<&str>, category: &str, product: &str, region: &str) -> SaleRecord {
        SaleRecord {
            date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            product: product.to_string(),
            category: category.to_string(),
            region: region.to_string(),
            customer_id: "C-001".to_string(),
            quantity: Some(1.0),
            unit_price: Some(1.0),
            total_sales: Some(1.0),
        }
    }

    fn set(values: &[&str]) -> Option<BTreeSet<String>> {
        Some(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn unrestricted_criteria_pass_everything() {
        let criteria = FilterCriteria::default();
        assert!(matches(&record(Some("2024-01-01"), "A", "X", "East"), &criteria));
        assert!(matches(&record(None, "A", "X", "East"), &criteria));
    }

    #[test]
    fn date_interval_is_inclusive() {
        let criteria = FilterCriteria {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 20),
            ..FilterCriteria::default()
        };

        assert!(matches(&record(Some("2024-01-10"), "A", "X", "E"), &criteria));
        assert!(matches(&record(Some("2024-01-20"), "A", "X", "E"), &criteria));
        assert!(!matches(&record(Some("2024-01-09"), "A", "X", "E"), &criteria));
        assert!(!matches(&record(Some("2024-01-21"), "A", "X", "E"), &criteria));
    }

    #[test]
    fn null_dates_fail_any_bounded_interval() {
        let criteria = FilterCriteria {
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..FilterCriteria::default()
        };
        assert!(!matches(&record(None, "A", "X", "E"), &criteria));
    }

    #[test]
    fn all_membership_predicates_must_hold() {
        let criteria = FilterCriteria {
            categories: set(&["A"]),
            products: set(&["X", "Y"]),
            regions: set(&["East"]),
            ..FilterCriteria::default()
        };

        assert!(matches(&record(None, "A", "X", "East"), &criteria));
        assert!(!matches(&record(None, "B", "X", "East"), &criteria));
        assert!(!matches(&record(None, "A", "Z", "East"), &criteria));
        assert!(!matches(&record(None, "A", "X", "West"), &criteria));
    }

    #[test]
    fn filter_keeps_order_and_allows_empty_result() {
        let ds = Dataset::new(vec![
            record(Some("2024-01-01"), "A", "X", "East"),
            record(Some("2024-01-02"), "B", "Y", "West"),
            record(Some("2024-01-03"), "A", "Z", "East"),
        ]);

        let criteria = FilterCriteria {
            categories: set(&["A"]),
            ..FilterCriteria::default()
        };
        let out = filter(&ds, &criteria);
        assert_eq!(out.len(), 2);
        assert_eq!(out.records[0].product, "X");
        assert_eq!(out.records[1].product, "Z");

        let none = FilterCriteria {
            categories: set(&["missing"]),
            ..FilterCriteria::default()
        };
        assert!(filter(&ds, &none).is_empty());
    }
}
