//! CSV variants of the upload output.
//!
//! All variants use CRLF line endings and quote only fields that contain a
//! delimiter, quote, or line break (internal quotes doubled).

use std::collections::BTreeSet;

use bu_model::{Dataset, OutputColumn, OutputRow};
use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use tracing::debug;

use crate::error::{OutputError, Result};

/// Extra SFTP column holding the company name.
pub const ACCOUNT_NAME_HEADER: &str = "AccountName";
/// Extra SFTP column, always empty.
pub const APT_HEADER: &str = "APT";
/// Column appended to the personal-group report.
pub const UPLOAD_DATE_HEADER: &str = "LOC Upload Date";

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| OutputError::Flush {
        message: e.error().to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| OutputError::Flush {
        message: e.to_string(),
    })
}

/// The 13-column upload file.
pub fn render_standard(rows: &[OutputRow]) -> Result<String> {
    let mut csv = writer();
    csv.write_record(OutputColumn::ALL.map(OutputColumn::header))?;
    for row in rows {
        csv.write_record(row.values())?;
    }
    debug!(rows = rows.len(), "standard output rendered");
    finish(csv)
}

/// The SFTP upload file: the 13 columns with Additional Details blanked,
/// then `AccountName` (the company) and an empty `APT`.
pub fn render_sftp(rows: &[OutputRow], company_name: &str) -> Result<String> {
    let mut csv = writer();
    let headers = OutputColumn::ALL
        .map(OutputColumn::header)
        .into_iter()
        .chain([ACCOUNT_NAME_HEADER, APT_HEADER]);
    csv.write_record(headers)?;
    for row in rows {
        let values = OutputColumn::ALL
            .into_iter()
            .map(|column| match column {
                OutputColumn::AdditionalDetails => "",
                _ => row.get(column),
            })
            .chain([company_name, ""]);
        csv.write_record(values)?;
    }
    debug!(rows = rows.len(), "SFTP output rendered");
    finish(csv)
}

/// A configured dataset as-is, header first.
pub fn render_dataset(dataset: &Dataset) -> Result<String> {
    let mut csv = writer();
    csv.write_record(dataset.columns())?;
    for row in dataset.rows() {
        csv.write_record(row)?;
    }
    debug!(rows = dataset.row_count(), "dataset rendered");
    finish(csv)
}

/// `DD.MM.YY`, as used in file names and the upload date column.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d.%m.%y").to_string()
}

/// The source file with a `LOC Upload Date` column appended.
///
/// The date is filled for rows whose value in `email_column` appears
/// (ignoring case and surrounding space) as an email in `rows`; other rows
/// get an empty cell.
pub fn render_personal_group(
    source: &Dataset,
    email_column: &str,
    rows: &[OutputRow],
    upload_date: NaiveDate,
) -> Result<String> {
    let uploaded: BTreeSet<String> = rows
        .iter()
        .map(|row| row.get(OutputColumn::Email).trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect();
    let date = short_date(upload_date);

    let mut csv = writer();
    csv.write_record(
        source
            .columns()
            .iter()
            .map(String::as_str)
            .chain([UPLOAD_DATE_HEADER]),
    )?;
    let mut marked = 0;
    for record in source.records() {
        let email = record.value(email_column).trim().to_lowercase();
        let stamp = if !email.is_empty() && uploaded.contains(&email) {
            marked += 1;
            date.as_str()
        } else {
            ""
        };
        csv.write_record(record.values().iter().map(String::as_str).chain([stamp]))?;
    }
    debug!(rows = source.row_count(), marked, "personal-group output rendered");
    finish(csv)
}
