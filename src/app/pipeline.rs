//! Shared "dashboard pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> filter -> aggregate
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! The workflow is a pure function of `(dataset, criteria, config)`: the TUI
//! loads once and calls `recompute` on every filter change, exactly like a
//! page refresh in the original dashboard — no cached intermediate survives
//! between refreshes.

use crate::agg;
use crate::data::generate_sample;
use crate::domain::{AggregateCatalog, CatalogFile, DashConfig, DataSource, Dataset, FilterCriteria};
use crate::error::AppError;
use crate::io::ingest::{load_sales_csv, IngestedData};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub criteria: FilterCriteria,
    pub filtered: Dataset,
    pub catalog: AggregateCatalog,
}

impl RunOutput {
    /// Build the JSON export envelope for this run.
    pub fn catalog_file(&self, config: &DashConfig) -> CatalogFile {
        CatalogFile {
            tool: "sd".to_string(),
            source: self.ingest.source.clone(),
            rows_read: self.ingest.rows_read,
            rows_used: self.ingest.rows_used,
            rows_matched: self.filtered.len(),
            criteria: self.criteria.clone(),
            config: config.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

/// Execute the full pipeline: load the source, filter, aggregate.
pub fn run_report(
    source: &DataSource,
    criteria: &FilterCriteria,
    config: &DashConfig,
) -> Result<RunOutput, AppError> {
    let ingest = load(source)?;
    Ok(run_with_ingested(ingest, criteria, config))
}

/// Load a dataset from the configured source.
pub fn load(source: &DataSource) -> Result<IngestedData, AppError> {
    match source {
        DataSource::Csv(path) => load_sales_csv(path),
        DataSource::Sample {
            count,
            seed,
            end_date,
        } => {
            let records = generate_sample(*count, *seed, *end_date)?;
            Ok(IngestedData::from_records(
                records,
                format!("sample (n={count}, seed={seed})"),
            ))
        }
    }
}

/// Execute the pipeline with an already-loaded dataset.
///
/// This is what the TUI calls on every filter change.
pub fn run_with_ingested(
    ingest: IngestedData,
    criteria: &FilterCriteria,
    config: &DashConfig,
) -> RunOutput {
    let filtered = agg::filter(&ingest.dataset, criteria);
    let catalog = agg::aggregate(&filtered, config);
    RunOutput {
        ingest,
        criteria: criteria.clone(),
        filtered,
        catalog,
    }
}

/// Filter + aggregate without consuming the loaded data.
///
/// Returns the matched-record count alongside the fresh catalog.
pub fn recompute(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    config: &DashConfig,
) -> (usize, AggregateCatalog) {
    let filtered = agg::filter(dataset, criteria);
    let catalog = agg::aggregate(&filtered, config);
    (filtered.len(), catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn demo_pipeline_produces_a_full_catalog() {
        let source = DataSource::Sample {
            count: 120,
            seed: 42,
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };
        let out = run_report(&source, &FilterCriteria::default(), &DashConfig::default()).unwrap();

        assert_eq!(out.filtered.len(), 120);
        assert_eq!(out.catalog.kpis.records, 120);
        assert!(!out.catalog.daily_sales.is_empty());
        assert!(out.catalog.sales_profit.is_some());
        assert!(out.catalog.forecast.points().is_some());
    }

    #[test]
    fn recompute_matches_the_one_shot_pipeline() {
        let source = DataSource::Sample {
            count: 60,
            seed: 7,
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };
        let config = DashConfig::default();
        let criteria = FilterCriteria {
            regions: Some(std::collections::BTreeSet::from(["East".to_string()])),
            ..FilterCriteria::default()
        };

        let out = run_report(&source, &criteria, &config).unwrap();
        let (matched, catalog) = recompute(&out.ingest.dataset, &criteria, &config);

        assert_eq!(matched, out.filtered.len());
        assert_eq!(catalog.daily_sales, out.catalog.daily_sales);
        assert_eq!(catalog.forecast, out.catalog.forecast);
    }
}
