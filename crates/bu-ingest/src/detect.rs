//! First-data-row detection.

use std::sync::LazyLock;

use regex::Regex;

/// Rows examined before giving up.
const SCAN_LIMIT: usize = 20;

/// Row used when nothing looks like data (1-indexed).
pub const DEFAULT_FIRST_DATA_ROW: usize = 2;

/// Header vocabulary matched anywhere inside a squashed cell.
const CONTAINED_TERMS: &[&str] = &[
    "firstname",
    "forename",
    "surname",
    "lastname",
    "familyname",
    "email",
    "postcode",
    "zipcode",
    "address",
    "street",
    "county",
    "country",
    "amount",
    "frequency",
    "reference",
    "employee",
    "salary",
    "approval",
    "payroll",
];

/// Short header vocabulary that must match a whole squashed cell.
const EXACT_TERMS: &[&str] = &[
    "name", "town", "city", "loc", "id", "date", "title", "value", "phone", "mobile", "entity",
];

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static UK_POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2}$").expect("valid postcode regex")
});

static NAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]*(?:['-][A-Z]?[a-z]+)*$").expect("valid name regex")
});

fn squash(cell: &str) -> String {
    cell.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Whether a cell reads like a column label.
pub fn is_header_term(cell: &str) -> bool {
    let squashed = squash(cell);
    if squashed.is_empty() {
        return false;
    }
    EXACT_TERMS.contains(&squashed.as_str())
        || CONTAINED_TERMS.iter().any(|term| squashed.contains(term))
}

fn header_term_count(row: &[String]) -> usize {
    row.iter().filter(|cell| is_header_term(cell)).count()
}

/// More than two label-like cells.
pub fn is_header_like(row: &[String]) -> bool {
    header_term_count(row) > 2
}

/// An email, a UK postcode, or two name-like cells, with at most one
/// label-like cell.
pub fn is_data_like(row: &[String]) -> bool {
    if header_term_count(row) > 1 {
        return false;
    }
    let mut name_tokens = 0;
    for cell in row.iter().map(|cell| cell.trim()) {
        if EMAIL.is_match(cell) || UK_POSTCODE.is_match(cell) {
            return true;
        }
        if cell.len() >= 2 && NAME_TOKEN.is_match(cell) {
            name_tokens += 1;
        }
    }
    name_tokens >= 2
}

/// 1-indexed row where applicant data most likely starts.
///
/// The first data-like row among the first 20 wins; otherwise row 2.
pub fn detect_first_data_row(rows: &[Vec<String>]) -> usize {
    rows.iter()
        .take(SCAN_LIMIT)
        .position(|row| is_data_like(row))
        .map_or(DEFAULT_FIRST_DATA_ROW, |index| index + 1)
}
