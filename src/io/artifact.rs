//! Pre-built report document passthrough.
//!
//! The dashboard can hand back a pre-existing report document (for example a
//! Word file produced by an offline process) *verbatim* — this module never
//! generates or modifies the document. A missing document is a reported,
//! non-fatal condition: the caller prints the notice and carries on.

use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default location of the pre-built report document.
pub const DEFAULT_REPORT_DOC: &str = "sales_analysis_report.docx";

/// Environment override for the document location.
pub const REPORT_DOC_ENV: &str = "SALES_REPORT_DOC";

/// Resolve the source path of the report document.
pub fn report_doc_source() -> PathBuf {
    std::env::var(REPORT_DOC_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPORT_DOC))
}

/// Copy the report document to `dest` byte-for-byte.
///
/// Returns `Ok(None)` when the source document does not exist — callers must
/// surface that as a visible, non-fatal message. Any other I/O failure is a
/// runtime error.
pub fn copy_report_doc(dest: &Path) -> Result<Option<PathBuf>, AppError> {
    let source = report_doc_source();
    if !source.exists() {
        return Ok(None);
    }

    std::fs::copy(&source, dest).map_err(|e| {
        AppError::runtime(format!(
            "Failed to copy report document '{}' to '{}': {e}",
            source.display(),
            dest.display()
        ))
    })?;

    Ok(Some(source))
}
