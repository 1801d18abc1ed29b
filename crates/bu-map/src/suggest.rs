//! Field mapping suggestions from source header names.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use bu_model::{FieldMapping, OutputColumn};
use rapidfuzz::distance::jaro_winkler;
use serde::Serialize;

use crate::utils::normalize_text;

/// Minimum similarity for a suggestion to be offered.
pub const MIN_CONFIDENCE: f64 = 0.85;

/// A proposed source column for one output column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSuggestion {
    pub column: OutputColumn,
    pub source_column: String,
    pub confidence: f64,
}

/// Header spellings seen in real exports, normalized.
fn synonyms(column: OutputColumn) -> &'static [&'static str] {
    match column {
        OutputColumn::Firstname => &["first name", "firstname", "forename", "forenames", "given name"],
        OutputColumn::Surname => &["surname", "last name", "lastname", "family name"],
        OutputColumn::Street1 => &[
            "street1",
            "street 1",
            "address",
            "address 1",
            "address line 1",
            "home address",
        ],
        OutputColumn::Street2 => &["street2", "street 2", "address 2", "address line 2"],
        OutputColumn::City => &["city", "town", "town city", "city town"],
        OutputColumn::County => &["county", "region"],
        OutputColumn::Postcode => &["postcode", "post code", "postal code", "zip", "zip code"],
        OutputColumn::Country => &["country"],
        OutputColumn::LocAmount => &[
            "loc amount",
            "loc",
            "amount",
            "voucher value",
            "voucher amount",
            "certificate amount",
            "certificate value",
            "total package value",
            "package value",
        ],
        OutputColumn::Email => &["email", "email address", "e mail", "work email", "e mail address"],
        OutputColumn::PayFrequency => &["pay frequency", "frequency", "payroll frequency", "pay cycle"],
        OutputColumn::AdditionalDetails => &[],
        OutputColumn::DateOfApproval => &[
            "date of approval",
            "approval date",
            "approved date",
            "date approved",
        ],
    }
}

/// Similarity of a source header to an output column, in `0.0..=1.0`.
pub fn score_column(source: &str, column: OutputColumn) -> f64 {
    let normalized = normalize_text(source);
    if normalized.is_empty() {
        return 0.0;
    }
    let header = normalize_text(column.header());
    std::iter::once(header.as_str())
        .chain(synonyms(column).iter().copied())
        .map(|candidate| {
            if candidate == normalized {
                1.0
            } else {
                jaro_winkler::similarity(normalized.chars(), candidate.chars())
            }
        })
        .fold(0.0, f64::max)
}

/// Suggest a one-to-one mapping from source headers to output columns.
///
/// Every (header, column) pair is scored; pairs are taken greedily by
/// descending score, each header and column used at most once. Ties go to
/// the earlier header, then the earlier output column.
pub fn suggest_fields(columns: &[String]) -> Vec<FieldSuggestion> {
    let mut candidates: Vec<(usize, OutputColumn, f64)> = Vec::new();
    for (index, source) in columns.iter().enumerate() {
        for column in OutputColumn::mappable() {
            let confidence = score_column(source, column);
            if confidence >= MIN_CONFIDENCE {
                candidates.push((index, column, confidence));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });

    let mut used_sources = BTreeSet::new();
    let mut used_columns = BTreeSet::new();
    let mut suggestions = Vec::new();
    for (index, column, confidence) in candidates {
        if used_sources.contains(&index) || used_columns.contains(&column) {
            continue;
        }
        used_sources.insert(index);
        used_columns.insert(column);
        suggestions.push(FieldSuggestion {
            column,
            source_column: columns[index].clone(),
            confidence,
        });
    }
    suggestions.sort_by_key(|suggestion| suggestion.column);
    suggestions
}

/// Field mapping built from [`suggest_fields`].
pub fn suggested_mapping(columns: &[String]) -> FieldMapping {
    let mut mapping = FieldMapping::new();
    for suggestion in suggest_fields(columns) {
        // Suggestions only cover mappable columns.
        let _ = mapping.set(suggestion.column, suggestion.source_column);
    }
    mapping
}
