//! Error types for file operations.

use crate::parser::ParseError;
use thiserror::Error;

/// Errors that can occur while ingesting or reading files.
#[derive(Debug, Error)]
pub enum FileError {
    /// Malformed or missing request input.
    #[error("{0}")]
    Validation(String),
    /// Unknown file, or a header row past the end of the file.
    #[error("{0}")]
    NotFound(String),
    /// Uploaded file is not a CSV file.
    #[error("{0}")]
    InvalidFormat(String),
    /// Failure talking to the storage or catalog backend.
    #[error("Backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

impl FileError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }

    /// Returns true if this is a not found error (404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ParseError> for FileError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::HeaderRowNotFound { .. } => Self::NotFound(e.to_string()),
            ParseError::InvalidHeaderRow | ParseError::NoValidHeaders => {
                Self::Validation(e.to_string())
            }
        }
    }
}
