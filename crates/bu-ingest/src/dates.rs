//! Date parsing, date-column detection, and date-range filtering.

use std::sync::LazyLock;

use bu_model::Dataset;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Values sampled per column when detecting date columns.
const DATE_SAMPLE_SIZE: usize = 5;

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})$").expect("valid date regex")
});

static YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})(?:[T ].*)?$").expect("valid date regex")
});

const TEXT_FORMATS: [&str; 6] = [
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
    "%d %b %y",
];

/// Parse a date in any of the formats operators commonly export.
///
/// Numeric dates are read day-first (UK convention). Two-digit years map to
/// 2000-2069 and 1970-1999.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(caps) = DAY_FIRST.captures(value) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = expand_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(caps) = YEAR_FIRST.captures(value) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }
    TEXT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    Some(match text.len() {
        2 if year < 70 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

/// Columns where at least half of the first five non-empty values are dates.
pub fn detect_date_columns(dataset: &Dataset) -> Vec<String> {
    dataset
        .columns()
        .iter()
        .filter(|column| {
            let samples: Vec<&str> = dataset
                .records()
                .map(|record| record.value(column))
                .filter(|value| !value.trim().is_empty())
                .take(DATE_SAMPLE_SIZE)
                .collect();
            if samples.is_empty() {
                return false;
            }
            let dates = samples
                .iter()
                .filter(|value| parse_flexible_date(value).is_some())
                .count();
            dates * 2 >= samples.len()
        })
        .cloned()
        .collect()
}

/// Inclusive date bounds; an absent bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Drop rows whose date falls outside `range`.
///
/// Rows with a blank or unparseable date are kept.
pub fn filter_by_date_range(dataset: &Dataset, column: &str, range: DateRange) -> Result<Dataset> {
    if !dataset.has_column(column) {
        return Err(IngestError::ColumnNotFound {
            column: column.to_string(),
        });
    }
    let filtered = dataset.retain_rows(|_, record| {
        parse_flexible_date(record.value(column)).is_none_or(|date| range.contains(date))
    });
    debug!(
        column,
        kept = filtered.row_count(),
        dropped = dataset.row_count() - filtered.row_count(),
        "applied date filter"
    );
    Ok(filtered)
}
