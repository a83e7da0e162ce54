//! Upload domain rules shared by the engine and the HTTP layer.

pub mod capacity;
mod error;
pub mod stats;
pub mod validation;

pub use capacity::{enforce_capacity, CapacityPolicy, DEFAULT_MAX_FILES};
pub use error::FileError;
pub use stats::{aggregate_stats, FileStats};
pub use validation::{file_extension, validate_format, CSV_MIME_TYPE};
