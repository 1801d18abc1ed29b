//! Raw cell grids and configured datasets.

use std::collections::BTreeMap;

use crate::{ModelError, Result};

/// A decoded file with no header assumption.
///
/// Rows may be ragged; cells are plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row by 0-based index.
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell by 0-based coordinates; missing cells read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map_or("", String::as_str)
    }

    /// Length of the longest row.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Configured rows with named columns.
///
/// Column names are unique within a dataset and every row holds exactly one
/// value per column (possibly empty, never missing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    index: BTreeMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Create an empty dataset, rejecting duplicate column names.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (position, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(ModelError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    /// Build a dataset from string literals; convenient in tests and fixtures.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        let mut dataset = Self::new(columns.iter().map(|c| (*c).to_string()).collect())?;
        for row in rows {
            dataset.push_row(row.iter().map(|v| (*v).to_string()).collect())?;
        }
        Ok(dataset)
    }

    /// Append a row. Short rows are padded with empty strings.
    pub fn push_row(&mut self, mut values: Vec<String>) -> Result<()> {
        if values.len() > self.columns.len() {
            return Err(ModelError::RowTooWide {
                row: self.rows.len() + 1,
                width: values.len(),
                columns: self.columns.len(),
            });
        }
        values.resize(self.columns.len(), String::new());
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Value at a row for a named column; unknown columns read as empty.
    pub fn value(&self, row: usize, column: &str) -> &str {
        self.record(row).map_or("", |record| record.value(column))
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows.get(row).map(|values| Record {
            columns: &self.columns,
            index: &self.index,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            index: &self.index,
            values,
        })
    }

    /// Copy of the dataset keeping only rows for which `keep` returns true.
    pub fn retain_rows(&self, mut keep: impl FnMut(usize, Record<'_>) -> bool) -> Dataset {
        let rows = self
            .records()
            .enumerate()
            .filter(|(position, record)| keep(*position, *record))
            .map(|(_, record)| record.values.to_vec())
            .collect();
        Dataset {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows,
        }
    }
}

/// Borrowed view of one dataset row as an ordered `(column, value)` map.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    index: &'a BTreeMap<String, usize>,
    values: &'a [String],
}

impl<'a> Record<'a> {
    /// Value for a column, or `None` if the dataset has no such column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = *self.index.get(column)?;
        self.values.get(position).map(String::as_str)
    }

    /// Value for a column, empty when the column is unknown.
    pub fn value(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }

    /// Pairs in column order.
    pub fn iter(self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// True when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|value| value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_columns() {
        let result = Dataset::new(vec!["A".to_string(), "A".to_string()]);
        assert_eq!(result, Err(ModelError::DuplicateColumn("A".to_string())));
    }

    #[test]
    fn pads_short_rows() {
        let mut dataset = Dataset::new(vec!["A".into(), "B".into()]).unwrap();
        dataset.push_row(vec!["1".into()]).unwrap();
        assert_eq!(dataset.rows()[0], vec!["1".to_string(), String::new()]);
        assert_eq!(dataset.value(0, "B"), "");
    }

    #[test]
    fn rejects_wide_rows() {
        let mut dataset = Dataset::new(vec!["A".into()]).unwrap();
        let err = dataset.push_row(vec!["1".into(), "2".into()]).unwrap_err();
        assert!(matches!(err, ModelError::RowTooWide { width: 2, .. }));
    }

    #[test]
    fn record_iterates_in_column_order() {
        let dataset = Dataset::from_rows(&["Z", "A"], &[&["last", "first"]]).unwrap();
        let record = dataset.record(0).unwrap();
        let pairs: Vec<_> = record.iter().collect();
        assert_eq!(pairs, vec![("Z", "last"), ("A", "first")]);
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn raw_table_reads_ragged_cells() {
        let raw = RawTable::new(vec![vec!["a".into()], vec!["b".into(), "c".into()]]);
        assert_eq!(raw.max_width(), 2);
        assert_eq!(raw.cell(0, 1), "");
        assert_eq!(raw.cell(1, 1), "c");
    }
}
