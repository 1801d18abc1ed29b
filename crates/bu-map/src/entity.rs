//! Company and entity extraction from filenames and cells.
//!
//! Operators name files inconsistently ("Acme Ltd Cycle Scheme Export
//! 01.02.24 (ACM).xlsx"). The company name is what survives after removing
//! bracketed content, dates, version numbers, numbers, and scheme jargon.
//! The first short bracketed code becomes the entity.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use bu_model::RawTable;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::utils::title_case;

/// Company used when nothing survives cleanup.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Longest bracketed code accepted as an entity.
const MAX_ENTITY_LEN: usize = 10;

/// Words that never form part of a company name.
const STOPWORDS: &[&str] = &[
    // scheme and provider jargon
    "bike", "bikes", "cycle", "cycles", "cycling", "cyclescheme", "cycle2work", "c2w", "ctw",
    "scheme", "schemes", "voucher", "vouchers", "halfords", "evans", "gogeta", "salary",
    "sacrifice", "benefit", "benefits", "loc", "applicant", "applicants", "application",
    "applications", "employee", "employees", "staff", "payroll", "hr", "deduction", "deductions",
    "window", "approved", "approval", "approvals", "order", "orders", "invoice",
    // file words
    "export", "exports", "report", "final", "copy", "upload", "uploads", "uploaded", "sftp",
    "data", "file", "list", "batch", "new", "updated", "update", "draft", "version", "template",
    "monthly", "weekly", "sheet", "v",
    // months
    "jan", "january", "feb", "february", "mar", "march", "apr", "april", "may", "jun", "june",
    "jul", "july", "aug", "august", "sep", "sept", "september", "oct", "october", "nov",
    "november", "dec", "december",
    // legal suffixes
    "ltd", "limited", "plc", "llp", "inc",
];

static EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(xlsx|xlsm|xlsb|xls|ods|csv|tsv|txt|pdf)$").expect("valid extension regex")
});

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(\[{]([^)\]}]*)[)\]}]").expect("valid bracket regex"));

static DATES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4}|\d{4}[./\-]\d{1,2}[./\-]\d{1,2})\b")
        .expect("valid date regex")
});

static VERSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:v\d+(?:\.\d+)*|\d+(?:\.\d+)+)\b").expect("valid version regex")
});

static NUMBERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S*\d\S*").expect("valid number regex"));

/// Company and entity derived from a filename or cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityInfo {
    pub company: String,
    pub entity: Option<String>,
}

impl EntityInfo {
    pub fn is_unknown(&self) -> bool {
        self.company == UNKNOWN_COMPANY
    }
}

/// Derive company and entity from a filename (path components are ignored).
pub fn extract_from_filename(file_name: &str) -> EntityInfo {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let stem = EXTENSION.replace(base, "");
    let info = extract_from_text(&stem);
    debug!(file_name, company = %info.company, entity = ?info.entity, "extracted entity from filename");
    info
}

/// Derive company and entity from free text such as a title cell.
pub fn extract_from_text(text: &str) -> EntityInfo {
    let entity = BRACKETED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|code| {
            !code.is_empty()
                && code.len() <= MAX_ENTITY_LEN
                && code.chars().all(|ch| ch.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_uppercase);

    let cleaned = BRACKETED.replace_all(text, " ").replace('_', " ");
    let cleaned = DATES.replace_all(&cleaned, " ");
    let cleaned = VERSIONS.replace_all(&cleaned, " ");
    let cleaned = NUMBERS.replace_all(&cleaned, " ");
    let cleaned = cleaned.replace(['-', '.', ',', '+'], " ");

    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|token| token.chars().any(char::is_alphabetic))
        .filter(|token| !STOPWORDS.contains(&token.to_lowercase().as_str()))
        .collect();

    let company = if kept.is_empty() {
        UNKNOWN_COMPANY.to_string()
    } else {
        title_case(&kept.join(" "))
    };
    EntityInfo { company, entity }
}

/// A cell position, parsed from spreadsheet notation such as `B3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// 0-based row.
    pub row: usize,
    /// 0-based column.
    pub column: usize,
}

impl FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(|| format!("cell reference '{s}' has no row number"))?;
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || !letters.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(format!("cell reference '{s}' has no column letters"));
        }
        let row: usize = digits
            .parse()
            .map_err(|_| format!("cell reference '{s}' has an invalid row number"))?;
        if row == 0 {
            return Err(format!("cell reference '{s}' has row 0"));
        }
        let column = letters
            .chars()
            .try_fold(0usize, |acc, ch| {
                let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
                acc.checked_mul(26)?.checked_add(digit)
            })
            .ok_or_else(|| format!("cell reference '{s}' has too many column letters"))?;
        Ok(Self {
            row: row - 1,
            column: column - 1,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.column + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(char::from(b'A' + rem as u8));
            n = (n - 1) / 26;
        }
        let column: String = letters.into_iter().rev().collect();
        write!(f, "{column}{}", self.row + 1)
    }
}

/// Derive company and entity from a designated cell of the raw table.
///
/// Returns `None` when the cell is missing or blank.
pub fn extract_from_cell(raw: &RawTable, cell: CellRef) -> Option<EntityInfo> {
    let value = raw.cell(cell.row, cell.column).trim();
    if value.is_empty() {
        return None;
    }
    Some(extract_from_text(value))
}
