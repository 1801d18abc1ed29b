//! Mapped output rows and their validation errors.

use serde::Serialize;

use crate::OutputColumn;

/// One row of the upload file: exactly one string per output column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OutputRow {
    values: [String; 13],
}

impl OutputRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: OutputColumn) -> &str {
        &self.values[column.index()]
    }

    pub fn set(&mut self, column: OutputColumn, value: impl Into<String>) {
        self.values[column.index()] = value.into();
    }

    /// Values in output column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Required columns that are empty, in output order.
    pub fn missing_required(&self) -> impl Iterator<Item = OutputColumn> + '_ {
        crate::REQUIRED_COLUMNS
            .into_iter()
            .filter(|column| self.get(*column).is_empty())
    }
}

/// A required output column left empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidationError {
    /// 1-indexed position in the filtered output.
    pub row: usize,
    pub column: OutputColumn,
    pub message: String,
}

impl ValidationError {
    pub fn missing(row: usize, column: OutputColumn) -> Self {
        Self {
            row,
            column,
            message: format!("{column} is required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_row_misses_every_required_column() {
        let row = OutputRow::new();
        let missing: Vec<_> = row.missing_required().collect();
        assert_eq!(missing, crate::REQUIRED_COLUMNS.to_vec());
    }

    #[test]
    fn set_and_get_by_column() {
        let mut row = OutputRow::new();
        row.set(OutputColumn::LocAmount, "150");
        assert_eq!(row.get(OutputColumn::LocAmount), "150");
        assert_eq!(row.values()[8], "150");
    }

    #[test]
    fn missing_message_names_the_header() {
        let error = ValidationError::missing(3, OutputColumn::LocAmount);
        assert_eq!(error.message, "LOC Amount is required");
    }
}
