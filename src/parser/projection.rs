//! Column projection over tokenized rows.

use super::ParseError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Requested column names matched to their position in the header row.
///
/// Built once per request. Only names present in both the request and the
/// header appear, each once, with the index of its first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    columns: Vec<(String, usize)>,
}

impl ColumnSelection {
    /// Match `requested` against `headers` by exact, case-sensitive equality.
    ///
    /// Names missing from the header are dropped. Fails with
    /// [`ParseError::NoValidHeaders`] when nothing matches.
    pub fn build<S: AsRef<str>>(headers: &[String], requested: &[S]) -> Result<Self, ParseError> {
        let mut columns: Vec<(String, usize)> = Vec::with_capacity(requested.len());

        for name in requested {
            let name = name.as_ref();
            if columns.iter().any(|(selected, _)| selected == name) {
                continue;
            }
            if let Some(index) = headers.iter().position(|header| header == name) {
                columns.push((name.to_string(), index));
            }
        }

        if columns.is_empty() {
            return Err(ParseError::NoValidHeaders);
        }

        Ok(Self { columns })
    }

    /// Select every non-empty header name.
    pub fn all(headers: &[String]) -> Result<Self, ParseError> {
        let names: Vec<&str> = headers
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .collect();
        Self::build(headers, &names)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `(name, index)` pairs in selection order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, usize)> {
        self.columns.iter().map(|(name, index)| (name.as_str(), *index))
    }

    /// Project every row after `header_row` whose arity equals `header_len`.
    ///
    /// Rows with a different cell count are skipped. Output order follows
    /// input order.
    pub fn apply<S: AsRef<str>>(
        &self,
        rows: &[Vec<S>],
        header_len: usize,
        header_row: usize,
    ) -> Vec<ProjectedRow> {
        rows.iter()
            .skip(header_row)
            .filter(|row| row.len() == header_len)
            .map(|row| ProjectedRow {
                cells: self
                    .columns
                    .iter()
                    .map(|(name, index)| (name.clone(), row[*index].as_ref().to_string()))
                    .collect(),
            })
            .collect()
    }
}

/// A data row reduced to the selected columns, keyed by header name.
///
/// Serializes as a JSON object in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedRow {
    cells: Vec<(String, String)>,
}

impl ProjectedRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ProjectedRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for ProjectedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Project `rows` down to the `requested` columns of `headers`.
///
/// `header_row` is the 1-based position of the header; only rows after it
/// are considered.
pub fn project<R: AsRef<str>, S: AsRef<str>>(
    rows: &[Vec<R>],
    headers: &[String],
    requested: &[S],
    header_row: usize,
) -> Result<Vec<ProjectedRow>, ParseError> {
    if header_row < 1 {
        return Err(ParseError::InvalidHeaderRow);
    }
    let selection = ColumnSelection::build(headers, requested)?;
    Ok(selection.apply(rows, headers.len(), header_row))
}

/// Project `rows` onto every non-empty column of the header at `header_row`.
pub fn project_all<R: AsRef<str>>(
    rows: &[Vec<R>],
    header_row: usize,
) -> Result<Vec<ProjectedRow>, ParseError> {
    let headers = super::resolve_headers(rows, header_row)?;
    let selection = ColumnSelection::all(&headers)?;
    Ok(selection.apply(rows, headers.len(), header_row))
}
