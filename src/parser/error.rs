//! Error types for header resolution and projection.

use thiserror::Error;

/// Errors raised while resolving headers or projecting rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Header row positions are 1-based.
    #[error("Header row must be greater than or equal to 1")]
    InvalidHeaderRow,
    /// The file has fewer rows than the requested header row.
    #[error("Header row {header_row} not found (file has {available} rows)")]
    HeaderRowNotFound { header_row: usize, available: usize },
    /// None of the requested names matched a header.
    #[error("invalid headers. At least 1 valid header required")]
    NoValidHeaders,
}
