//! Best-effort PDF tabularization.
//!
//! Text is extracted with `pdf-extract` and split into cells on tabs or runs
//! of two or more spaces. Application-form PDFs are recognized by their fixed
//! phrasing and turned into a synthetic two-row table instead.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Header row of the table produced for recognized application forms.
pub const TEMPLATE_HEADERS: [&str; 7] = [
    "First Name",
    "Surname",
    "Address",
    "Postcode",
    "Email",
    "Amount",
    "Reference",
];

/// Phrases that identify an application form; two or more must be present.
const TEMPLATE_PHRASES: [&str; 8] = [
    "cycle to work",
    "employee details",
    "salary sacrifice",
    "certificate amount",
    "total package value",
    "order reference",
    "hire agreement",
    "applicant declaration",
];

static ENGINE: OnceLock<PdfEngine> = OnceLock::new();

/// Compiled patterns shared by every PDF decode.
#[derive(Debug)]
pub struct PdfEngine {
    cell_split: Regex,
    first_name: Regex,
    surname: Regex,
    full_name: Regex,
    address: Regex,
    postcode: Regex,
    email: Regex,
    amount: Regex,
    reference: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid PDF pattern")
}

impl PdfEngine {
    /// Process-wide engine, initialised on first use.
    ///
    /// Concurrent first callers block on the same initialisation rather than
    /// each building their own.
    pub fn ensure_loaded() -> &'static PdfEngine {
        ENGINE.get_or_init(|| {
            debug!("initialising PDF engine");
            PdfEngine::new()
        })
    }

    pub fn is_loaded() -> bool {
        ENGINE.get().is_some()
    }

    fn new() -> Self {
        Self {
            cell_split: compile(r"\t+| {2,}"),
            first_name: compile(r"(?im)^\s*(?:first\s*names?|forenames?)\s*[:\-]?\s*(.+?)\s*$"),
            surname: compile(r"(?im)^\s*(?:surname|last\s*name|family\s*name)\s*[:\-]?\s*(.+?)\s*$"),
            full_name: compile(
                r"(?im)^\s*(?:employee\s+|full\s+|applicant\s+)?name\s*[:\-]\s*(.+?)\s*$",
            ),
            address: compile(
                r"(?im)^\s*(?:home\s+)?address(?:\s*line\s*1)?\s*[:\-]?\s*(.+?)\s*$",
            ),
            postcode: compile(r"(?i)\b([A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2})\b"),
            email: compile(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"),
            amount: compile(
                r"(?i)(?:certificate\s+amount|total\s+package\s+value|voucher\s+value|amount)\s*[:\-]?\s*£?\s*([\d,]+(?:\.\d{1,2})?)",
            ),
            reference: compile(
                r"(?i)(?:order|application|certificate)\s+(?:reference|ref|number|no\.?)\s*[:\-#]?\s*([A-Z0-9][A-Z0-9\-/]*)",
            ),
        }
    }

    /// Extract text from PDF bytes and tabularize it.
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
        let pdf_error = |message: String| IngestError::Pdf {
            path: path.to_path_buf(),
            message,
        };
        // pdf-extract panics on some malformed documents.
        let text = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
            .map_err(|_| pdf_error("text extraction aborted on malformed document".to_string()))?
            .map_err(|e| pdf_error(e.to_string()))?;
        Ok(self.tabulate_text(&text))
    }

    /// Tabularize extracted text, preferring the application-form template.
    pub fn tabulate_text(&self, text: &str) -> Vec<Vec<String>> {
        if let Some(rows) = self.recognize_template(text) {
            info!("recognized application form template");
            return rows;
        }
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                self.cell_split
                    .split(line.trim())
                    .map(|cell| cell.trim().to_string())
                    .filter(|cell| !cell.is_empty())
                    .collect()
            })
            .collect()
    }

    /// Header plus one data row when at least two template phrases occur.
    pub fn recognize_template(&self, text: &str) -> Option<Vec<Vec<String>>> {
        let lowered = text.to_lowercase();
        let hits = TEMPLATE_PHRASES
            .iter()
            .filter(|phrase| lowered.contains(*phrase))
            .count();
        if hits < 2 {
            return None;
        }

        let capture = |re: &Regex| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };
        let mut first_name = capture(&self.first_name);
        let mut surname = capture(&self.surname);
        if first_name.is_empty() && surname.is_empty() {
            let full = capture(&self.full_name);
            if let Some((first, rest)) = full.split_once(char::is_whitespace) {
                first_name = first.to_string();
                surname = rest.trim().to_string();
            } else {
                first_name = full;
            }
        }
        let email = self
            .email
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let postcode = capture(&self.postcode).to_uppercase();

        let row = vec![
            first_name,
            surname,
            capture(&self.address),
            postcode,
            email,
            capture(&self.amount).replace(',', ""),
            capture(&self.reference),
        ];
        let header = TEMPLATE_HEADERS.iter().map(|h| (*h).to_string()).collect();
        Some(vec![header, row])
    }
}
