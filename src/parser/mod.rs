//! CSV row/header reconciliation.
//!
//! Stored files are small, so everything here works on text already held in
//! memory. Rows are split on `\r\n` (or on a lone `\r` when the text has no
//! CRLF at all) and cells on `,`. Quoted fields are not supported.
//!
//! The functions are pure: tokenizing or projecting the same text twice
//! yields identical output.

mod error;
mod headers;
mod projection;
mod tokenizer;

pub use error::ParseError;
pub use headers::{resolve_headers, DEFAULT_HEADER_ROW};
pub use projection::{project, project_all, ColumnSelection, ProjectedRow};
pub use tokenizer::{split_cells, split_rows, tokenize_rows, CELL_SEPARATOR, ROW_SEPARATOR};
