/// Primary row separator.
pub const ROW_SEPARATOR: &str = "\r\n";

/// Row separator used when the text contains no CRLF.
const FALLBACK_ROW_SEPARATOR: char = '\r';

/// Cell separator. No escaping or quoting is applied.
pub const CELL_SEPARATOR: char = ',';

/// Split raw CSV text into rows.
///
/// CRLF wins when present anywhere in the text; otherwise a lone `\r` is the
/// row boundary. A single trailing separator does not produce an extra empty
/// row.
pub fn split_rows(raw: &str) -> Vec<&str> {
    let mut rows: Vec<&str> = if raw.contains(ROW_SEPARATOR) {
        raw.split(ROW_SEPARATOR).collect()
    } else {
        raw.split(FALLBACK_ROW_SEPARATOR).collect()
    };

    if rows.len() > 1 && rows.last().is_some_and(|last| last.is_empty()) {
        rows.pop();
    }

    rows
}

/// Split a single row into cells, verbatim.
pub fn split_cells(row: &str) -> Vec<&str> {
    row.split(CELL_SEPARATOR).collect()
}

/// Tokenize raw CSV text into rows of cells.
pub fn tokenize_rows(raw: &str) -> Vec<Vec<&str>> {
    split_rows(raw).into_iter().map(split_cells).collect()
}
