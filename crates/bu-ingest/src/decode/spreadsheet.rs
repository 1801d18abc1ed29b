use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::normalize_cell;
use crate::error::{IngestError, Result};

/// Read the first worksheet into raw rows.
///
/// The grid is anchored at A1 even when the sheet's used range starts later,
/// so 1-indexed row numbers match what the operator sees in a spreadsheet.
pub(crate) fn read_first_sheet(path: &Path, bytes: Vec<u8>) -> Result<Vec<Vec<String>>> {
    let spreadsheet_error = |message: String| IngestError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| spreadsheet_error(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(spreadsheet_error("workbook contains no sheets".to_string()));
    };
    if sheet_names.len() > 1 {
        debug!(sheet = %first, ignored = sheet_names.len() - 1, "reading first sheet only");
    }

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| spreadsheet_error(format!("sheet '{first}': {e}")))?;
    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for cells in range.rows() {
        let mut row = vec![String::new(); col_offset];
        row.extend(cells.iter().map(cell_text));
        while row.last().is_some_and(String::is_empty) {
            row.pop();
        }
        rows.push(row);
    }
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => normalize_cell(s),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Error(e) => format!("#{e:?}"),
    }
}

/// Render a spreadsheet number without a spurious trailing `.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Convert a 1900-system date serial to `DD/MM/YYYY`.
pub(crate) fn serial_to_date(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format_number(serial);
    };
    if !serial.is_finite() || serial < 0.0 {
        return format_number(serial);
    }
    epoch
        .checked_add_signed(Duration::days(serial.floor() as i64))
        .map_or_else(
            || format_number(serial),
            |date| date.format("%d/%m/%Y").to_string(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_render_without_decimals() {
        assert_eq!(format_number(1250.0), "1250");
        assert_eq!(format_number(149.5), "149.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn serials_render_as_uk_dates() {
        assert_eq!(serial_to_date(45306.0), "15/01/2024");
        assert_eq!(serial_to_date(45306.75), "15/01/2024");
    }

    #[test]
    fn corrupt_workbook_is_reported() {
        let err = read_first_sheet(Path::new("bad.xlsx"), b"not a workbook".to_vec()).unwrap_err();
        assert!(matches!(err, IngestError::Spreadsheet { .. }));
    }
}
