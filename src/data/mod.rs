//! Data sources.
//!
//! The only built-in source is the deterministic synthetic sample used when
//! no CSV is supplied; file ingestion lives in `io::ingest`.

pub mod sample;

pub use sample::*;
