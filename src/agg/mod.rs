//! The filter-and-aggregate pipeline.
//!
//! Responsibilities:
//!
//! - apply the caller's `FilterCriteria` to a `Dataset` (`filter`)
//! - compute the full `AggregateCatalog` from the filtered records (`catalog`)
//!
//! Both halves are pure functions over immutable values: every presentation
//! refresh recomputes `aggregate(filter(dataset, criteria))` in full, with
//! no incremental state and no caching.

pub mod catalog;
pub mod filter;

pub use catalog::*;
pub use filter::*;
