//! Slicing raw rows into a configured dataset.

use std::collections::BTreeSet;

use bu_model::{DataConfig, Dataset, RawTable};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Apply a row configuration to a decoded table.
///
/// Rows are 1-indexed. `header_row == 0` means no header: every column name
/// is synthesized. The column count is the widest of the header row and every
/// row in range, so no data cell is dropped for lacking a header. Rows whose
/// cells are all blank are skipped.
pub fn configure(raw: &RawTable, config: &DataConfig) -> Result<Dataset> {
    let (first, last) = resolve_range(raw, config)?;

    let header: &[String] = match config.header_row {
        0 => &[],
        row => raw.row(row - 1).unwrap_or(&[]),
    };
    let data_rows = &raw.rows[first..=last];
    let width = data_rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(header.len());

    let mut dataset = Dataset::new(column_names(header, width))?;
    let mut skipped = 0usize;
    for row in data_rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            skipped += 1;
            continue;
        }
        dataset.push_row(row.iter().map(|cell| cell.trim().to_string()).collect())?;
    }
    debug!(
        start_row = config.start_row,
        end_row = last + 1,
        columns = width,
        rows = dataset.row_count(),
        skipped,
        "configured dataset"
    );
    Ok(dataset)
}

/// Validate the configuration and return the 0-based inclusive data range.
fn resolve_range(raw: &RawTable, config: &DataConfig) -> Result<(usize, usize)> {
    if config.start_row == 0 {
        return Err(IngestError::invalid_range("start row must be at least 1"));
    }
    if config.header_row >= config.start_row {
        return Err(IngestError::invalid_range(format!(
            "header row {} must come before start row {}",
            config.header_row, config.start_row
        )));
    }
    if config.start_row > raw.len() {
        return Err(IngestError::invalid_range(format!(
            "start row {} is past the last row ({})",
            config.start_row,
            raw.len()
        )));
    }
    let end_row = match config.end_row {
        Some(end) if end < config.start_row => {
            return Err(IngestError::invalid_range(format!(
                "end row {end} is before start row {}",
                config.start_row
            )));
        }
        Some(end) => end.min(raw.len()),
        None => raw.len(),
    };
    Ok((config.start_row - 1, end_row - 1))
}

/// Column names from a header row, padded to `width`.
///
/// Blank cells become `Column N` (1-indexed); repeated names get ` (2)`,
/// ` (3)`, ... so every name is unique.
pub fn column_names(header: &[String], width: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    (0..width)
        .map(|index| {
            let base = header
                .get(index)
                .map(|cell| cell.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Column {}", index + 1));
            let mut name = base.clone();
            let mut suffix = 2;
            while !seen.insert(name.clone()) {
                name = format!("{base} ({suffix})");
                suffix += 1;
            }
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn widens_columns_past_header() {
        let table = raw(&[&["Name", ""], &["Ann", "x", "extra"]]);
        let dataset = configure(&table, &DataConfig::new(2, None)).unwrap();
        assert_eq!(dataset.columns(), ["Name", "Column 2", "Column 3"]);
        assert_eq!(dataset.value(0, "Column 3"), "extra");
    }

    #[test]
    fn skips_blank_rows_and_trims_cells() {
        let table = raw(&[&["A"], &["  "], &[" 1 "]]);
        let dataset = configure(&table, &DataConfig::new(2, None)).unwrap();
        assert_eq!(dataset.row_count(), 1);
        assert_eq!(dataset.value(0, "A"), "1");
    }

    #[test]
    fn header_row_zero_synthesizes_names() {
        let table = raw(&[&["Ann", "Lee"]]);
        let dataset = configure(&table, &DataConfig::new(1, None)).unwrap();
        assert_eq!(dataset.columns(), ["Column 1", "Column 2"]);
        assert_eq!(dataset.row_count(), 1);
    }

    #[test]
    fn end_row_limits_range() {
        let table = raw(&[&["A"], &["1"], &["2"], &["3"]]);
        let dataset = configure(&table, &DataConfig::new(2, Some(3))).unwrap();
        assert_eq!(dataset.row_count(), 2);
        let clamped = configure(&table, &DataConfig::new(2, Some(99))).unwrap();
        assert_eq!(clamped.row_count(), 3);
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let names = column_names(&["Email".into(), "Email".into(), "Email".into()], 3);
        assert_eq!(names, ["Email", "Email (2)", "Email (3)"]);
    }

    #[test]
    fn rejects_invalid_ranges() {
        let table = raw(&[&["A"], &["1"]]);
        for config in [
            DataConfig::new(0, None),
            DataConfig::new(3, None),
            DataConfig::new(2, Some(1)),
        ] {
            assert!(matches!(
                configure(&table, &config),
                Err(IngestError::InvalidRowRange { .. })
            ));
        }
    }
}
