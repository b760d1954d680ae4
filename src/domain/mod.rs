//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the sales record schema (`SaleRecord`, `Dataset`)
//! - the caller-selected filter (`FilterCriteria`)
//! - run configuration (`DashConfig`)
//! - the Aggregate Catalog produced for presentation (`AggregateCatalog`)

pub mod types;

pub use types::*;
