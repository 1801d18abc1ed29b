//! Cross-file duplicate detection.
//!
//! Rows from the current file are compared with rows from a previously
//! uploaded file. Neither file needs to be mapped: every column that is not
//! bookkeeping (ids, dates, statuses) contributes its normalized value, and
//! two rows are linked when their values match exactly or share enough
//! tokens. Which columns matched decides the classification:
//!
//! - confirmed: first name and surname matched, plus email or an equal LOC amount
//! - potential: first name and surname matched but the LOC amounts differ
//!
//! Candidate pairs come from an inverted index over values and tokens of the
//! previous file. A pair absent from the index shares no value and no token,
//! so it could never match; classification is the same as a full scan.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use bu_map::parse_loc_amount;
use bu_model::{Dataset, Record};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::fingerprint::RowFingerprint;

/// Values that appear in most rows and carry no identity.
pub const COMMON_WORDS: &[&str] = &[
    // pay frequencies
    "monthly", "weekly", "fortnightly", "fourweekly", "4weekly", "fourweekl", "annually",
    "annual", "quarterly",
    // countries
    "uk", "gb", "gbr", "england", "scotland", "wales", "unitedkingdom", "greatbritain",
    // scheme vocabulary
    "cycletowork", "cyclescheme", "cycle2work", "c2w", "halfords", "evans", "voucher",
    "bike", "bikes", "scheme", "salarysacrifice",
    // placeholders
    "na", "none", "null", "nil", "tbc", "tba", "unknown", "yes", "no", "true", "false",
    "mr", "mrs", "ms", "miss", "dr",
];

/// Amount tolerance when comparing LOC values.
const LOC_EPSILON: f64 = 0.005;

static SKIP_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)id|index|row|date|timestamp|created|updated|status|approval")
        .expect("valid skip regex")
});
static NAME_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)name").expect("valid name regex"));
static FIRST_NAME_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)first[\s_\-]*name|forename|given[\s_\-]*name").expect("valid regex")
});
static SURNAME_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)surname|last[\s_\-]*name|family[\s_\-]*name").expect("valid regex")
});
static EMAIL_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)e[\s_\-]*mail").expect("valid regex"));
static AMOUNT_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bloc\b|amount|value|price|total|cost").expect("valid regex")
});

/// Tuning for duplicate detection.
#[derive(Debug, Clone, Default)]
pub struct DuplicateOptions {
    /// Normalized values ignored in addition to [`COMMON_WORDS`].
    pub extra_common_words: Vec<String>,
}

/// Lowercase and keep only letters and digits.
pub fn normalize_value(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

struct Stoplist(BTreeSet<String>);

impl Stoplist {
    fn new(options: &DuplicateOptions) -> Self {
        let words = COMMON_WORDS
            .iter()
            .map(|word| (*word).to_string())
            .chain(
                options
                    .extra_common_words
                    .iter()
                    .map(String::as_str)
                    .map(normalize_value),
            )
            .filter(|word| !word.is_empty())
            .collect();
        Self(words)
    }

    /// Whether a normalized value is too short or too common to identify anyone.
    fn rejects(&self, normalized: &str) -> bool {
        normalized.chars().count() < 2 || self.0.contains(normalized)
    }
}

/// One identifying value of a row.
#[derive(Debug, Clone)]
struct Meaningful<'a> {
    column: &'a str,
    raw: &'a str,
    normalized: String,
    tokens: BTreeSet<String>,
}

fn meaningful_values<'a>(record: Record<'a>, stoplist: &Stoplist) -> Vec<Meaningful<'a>> {
    record
        .iter()
        .filter(|(column, _)| !SKIP_COLUMN.is_match(column))
        .filter_map(|(column, raw)| {
            let normalized = normalize_value(raw);
            if stoplist.rejects(&normalized) {
                return None;
            }
            let tokens = raw
                .split_whitespace()
                .map(normalize_value)
                .filter(|token| !stoplist.rejects(token))
                .collect();
            Some(Meaningful {
                column,
                raw: raw.trim(),
                normalized,
                tokens,
            })
        })
        .collect()
}

/// Two values that matched, by column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub current_column: String,
    pub previous_column: String,
    /// Matched value for display: the value itself or the shared tokens.
    pub value: String,
}

/// Classification of a matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKind {
    Confirmed,
    Potential,
}

/// A current-file row that matches a previous-file row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub kind: DuplicateKind,
    /// 0-based row in the current file.
    pub current_row: usize,
    /// 0-based row in the previous file.
    pub previous_row: usize,
    pub matches: Vec<ColumnMatch>,
    pub current_loc: Option<f64>,
    pub previous_loc: Option<f64>,
}

/// Every confirmed and potential duplicate between two files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub confirmed: Vec<DuplicateMatch>,
    pub potential: Vec<DuplicateMatch>,
    /// Row pairs compared after index pruning.
    pub comparisons: usize,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.potential.is_empty()
    }
}

fn token_overlap_needed(a: &Meaningful<'_>, b: &Meaningful<'_>) -> usize {
    if NAME_COLUMN.is_match(a.column) || NAME_COLUMN.is_match(b.column) {
        1
    } else {
        2
    }
}

fn match_values(a: &Meaningful<'_>, b: &Meaningful<'_>) -> Option<String> {
    if a.normalized == b.normalized {
        return Some(a.raw.to_string());
    }
    let shared: Vec<&str> = a.tokens.intersection(&b.tokens).map(String::as_str).collect();
    (shared.len() >= token_overlap_needed(a, b)).then(|| shared.join(" "))
}

/// First parseable value in an amount-like column.
fn row_loc(record: Record<'_>) -> Option<f64> {
    record
        .iter()
        .filter(|(column, _)| AMOUNT_COLUMN.is_match(column))
        .find_map(|(_, value)| parse_loc_amount(value))
}

#[derive(Debug, Default)]
struct Roles {
    first_name: bool,
    surname: bool,
    email: bool,
}

impl Roles {
    /// A role counts only when both matched columns carry it, so a first
    /// name equal to a surname fills neither role.
    fn record(&mut self, a: &str, b: &str) {
        let both = |re: &Regex| re.is_match(a) && re.is_match(b);
        self.first_name |= both(&FIRST_NAME_COLUMN);
        self.surname |= both(&SURNAME_COLUMN);
        self.email |= both(&EMAIL_COLUMN);
    }
}

fn classify(
    current: Record<'_>,
    previous: Record<'_>,
    current_values: &[Meaningful<'_>],
    previous_values: &[Meaningful<'_>],
) -> Option<(DuplicateKind, Vec<ColumnMatch>, Option<f64>, Option<f64>)> {
    let mut roles = Roles::default();
    let mut matches = Vec::new();
    for a in current_values {
        for b in previous_values {
            if let Some(value) = match_values(a, b) {
                roles.record(a.column, b.column);
                matches.push(ColumnMatch {
                    current_column: a.column.to_string(),
                    previous_column: b.column.to_string(),
                    value,
                });
            }
        }
    }
    if !(roles.first_name && roles.surname) {
        return None;
    }

    let current_loc = row_loc(current);
    let previous_loc = row_loc(previous);
    let kind = match (current_loc, previous_loc) {
        (Some(a), Some(b)) if (a - b).abs() < LOC_EPSILON => DuplicateKind::Confirmed,
        _ if roles.email => DuplicateKind::Confirmed,
        (Some(_), Some(_)) => DuplicateKind::Potential,
        _ => return None,
    };
    Some((kind, matches, current_loc, previous_loc))
}

/// Inverted index from value and token keys to previous-file rows.
struct CandidateIndex {
    postings: BTreeMap<String, BTreeSet<usize>>,
}

impl CandidateIndex {
    fn keys(values: &[Meaningful<'_>]) -> impl Iterator<Item = String> {
        values.iter().flat_map(|value| {
            std::iter::once(format!("v:{}", value.normalized))
                .chain(value.tokens.iter().map(|token| format!("t:{token}")))
        })
    }

    fn build(rows: &[Vec<Meaningful<'_>>]) -> Self {
        let mut postings: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        for (row, values) in rows.iter().enumerate() {
            for key in Self::keys(values) {
                postings.entry(key).or_default().insert(row);
            }
        }
        Self { postings }
    }

    fn candidates(&self, values: &[Meaningful<'_>]) -> BTreeSet<usize> {
        Self::keys(values)
            .filter_map(|key| self.postings.get(&key))
            .flatten()
            .copied()
            .collect()
    }
}

/// Compare every current-file row with the previous file.
pub fn find_duplicates(
    current: &Dataset,
    previous: &Dataset,
    options: &DuplicateOptions,
) -> DuplicateReport {
    let span = info_span!("find_duplicates");
    let _guard = span.enter();

    let stoplist = Stoplist::new(options);
    let current_values: Vec<_> = current
        .records()
        .map(|record| meaningful_values(record, &stoplist))
        .collect();
    let previous_values: Vec<_> = previous
        .records()
        .map(|record| meaningful_values(record, &stoplist))
        .collect();
    let index = CandidateIndex::build(&previous_values);

    let mut report = DuplicateReport::default();
    for (current_row, values) in current_values.iter().enumerate() {
        let Some(current_record) = current.record(current_row) else {
            continue;
        };
        for previous_row in index.candidates(values) {
            let Some(previous_record) = previous.record(previous_row) else {
                continue;
            };
            report.comparisons += 1;
            let Some((kind, matches, current_loc, previous_loc)) = classify(
                current_record,
                previous_record,
                values,
                &previous_values[previous_row],
            ) else {
                continue;
            };
            debug!(current_row, previous_row, ?kind, "duplicate pair");
            let found = DuplicateMatch {
                kind,
                current_row,
                previous_row,
                matches,
                current_loc,
                previous_loc,
            };
            match kind {
                DuplicateKind::Confirmed => report.confirmed.push(found),
                DuplicateKind::Potential => report.potential.push(found),
            }
        }
    }

    info!(
        current_rows = current.row_count(),
        previous_rows = previous.row_count(),
        comparisons = report.comparisons,
        confirmed = report.confirmed.len(),
        potential = report.potential.len(),
        "duplicate check complete"
    );
    report
}

/// Operator review of a duplicate report before download.
///
/// Confirmed duplicates are always removed from the current file. Potential
/// duplicates are kept unless the operator excludes them.
#[derive(Debug, Clone)]
pub struct DuplicateReview {
    report: DuplicateReport,
    excluded: BTreeSet<usize>,
}

impl DuplicateReview {
    pub fn new(report: DuplicateReport) -> Self {
        Self {
            report,
            excluded: BTreeSet::new(),
        }
    }

    pub fn report(&self) -> &DuplicateReport {
        &self.report
    }

    /// Mark a potential duplicate (by index into `report().potential`) for
    /// removal. Returns false for an unknown index.
    pub fn exclude(&mut self, potential: usize) -> bool {
        if potential >= self.report.potential.len() {
            return false;
        }
        self.excluded.insert(potential);
        true
    }

    /// Keep a previously excluded potential duplicate.
    pub fn include(&mut self, potential: usize) -> bool {
        self.excluded.remove(&potential)
    }

    pub fn exclude_all_potential(&mut self) {
        self.excluded = (0..self.report.potential.len()).collect();
    }

    pub fn is_excluded(&self, potential: usize) -> bool {
        self.excluded.contains(&potential)
    }

    /// Current-file rows selected for removal, before content dedup.
    fn flagged_rows(&self) -> BTreeSet<usize> {
        self.report
            .confirmed
            .iter()
            .map(|m| m.current_row)
            .chain(
                self.excluded
                    .iter()
                    .filter_map(|index| self.report.potential.get(*index))
                    .map(|m| m.current_row),
            )
            .collect()
    }

    /// Content fingerprints of the rows to remove.
    pub fn removal_fingerprints(&self, current: &Dataset) -> BTreeSet<RowFingerprint> {
        self.flagged_rows()
            .into_iter()
            .filter_map(|row| current.record(row))
            .map(RowFingerprint::of)
            .collect()
    }

    /// Number of distinct rows (by content) that will be removed.
    pub fn removal_count(&self, current: &Dataset) -> usize {
        self.removal_fingerprints(current).len()
    }

    /// The current file with confirmed and excluded rows removed.
    pub fn apply(&self, current: &Dataset) -> Dataset {
        let remove = self.removal_fingerprints(current);
        current.retain_rows(|_, record| !remove.contains(&RowFingerprint::of(record)))
    }
}
