use super::ParseError;

/// Header row used when a request does not name one.
pub const DEFAULT_HEADER_ROW: usize = 1;

/// Return the cells of the 1-based `header_row`, verbatim.
///
/// Order and duplicate names are preserved.
pub fn resolve_headers<S: AsRef<str>>(
    rows: &[Vec<S>],
    header_row: usize,
) -> Result<Vec<String>, ParseError> {
    if header_row < 1 {
        return Err(ParseError::InvalidHeaderRow);
    }

    rows.get(header_row - 1)
        .map(|row| row.iter().map(|cell| cell.as_ref().to_string()).collect())
        .ok_or(ParseError::HeaderRowNotFound {
            header_row,
            available: rows.len(),
        })
}
