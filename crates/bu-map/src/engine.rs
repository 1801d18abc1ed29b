//! Mapping engine implementation.
//!
//! [`apply_mapping`] turns configured source rows into upload rows. Each row
//! is mapped independently; the only cross-row state is the output position
//! used to number validation errors, which counts retained rows only.

use std::collections::BTreeMap;

use bu_model::{Dataset, OutputColumn, OutputRow, Process, Record, ValidationError};
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::clean::{clean_loc_amount, resolve_email, sanitize_value};
use crate::details::compose_additional_details;
use crate::error::{MapError, Result};

/// Company and entity the rows are being mapped for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingContext {
    pub company_name: String,
    pub entity: String,
}

impl MappingContext {
    pub fn new(company_name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            entity: entity.into(),
        }
    }

    /// Context taken from the process's own company and entity.
    pub fn for_process(process: &Process) -> Self {
        Self::new(process.company_name.clone(), process.entity.clone())
    }
}

/// Result of mapping a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingOutcome {
    /// Output rows in source order, minus range-filtered rows.
    #[serde(skip)]
    pub rows: Vec<OutputRow>,
    pub validation: Vec<ValidationError>,
    /// Rows dropped by the LOC range filter.
    pub filtered: usize,
}

impl MappingOutcome {
    /// Validation errors grouped by 1-indexed output row.
    pub fn errors_by_row(&self) -> BTreeMap<usize, Vec<&ValidationError>> {
        let mut grouped: BTreeMap<usize, Vec<&ValidationError>> = BTreeMap::new();
        for error in &self.validation {
            grouped.entry(error.row).or_default().push(error);
        }
        grouped
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_empty()
    }

    /// Number of rows with at least one validation error.
    pub fn invalid_row_count(&self) -> usize {
        self.errors_by_row().len()
    }
}

/// Every source column the process refers to, with the role it plays.
fn referenced_columns(process: &Process) -> Vec<(String, &str)> {
    let mut referenced: Vec<(String, &str)> = process
        .fields
        .iter()
        .map(|(column, source)| (column.header().to_string(), source))
        .collect();
    let options = &process.output_options;
    let details = &process.additional_details;
    let extras = [
        ("Secondary email", options.secondary_email_column.as_deref()),
        ("Additional Details entity", details.entity_column.as_deref()),
        ("Additional Details reference", details.reference_column.as_deref()),
    ];
    for (role, column) in extras {
        if let Some(column) = column.filter(|c| !c.trim().is_empty()) {
            referenced.push((role.to_string(), column));
        }
    }
    referenced
}

/// Check that every source column the process refers to exists.
pub fn validate_mapping(columns: &[String], process: &Process) -> Result<()> {
    for (role, column) in referenced_columns(process) {
        if !columns.iter().any(|c| c == column) {
            return Err(MapError::UnknownSourceColumn {
                role,
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Map every row of `dataset` through `process`.
///
/// Rows whose cleaned LOC amount falls outside the process's range are
/// dropped and counted in `filtered`. Missing required values produce
/// validation errors but never drop a row.
pub fn apply_mapping(
    dataset: &Dataset,
    process: &Process,
    context: &MappingContext,
) -> Result<MappingOutcome> {
    let span = info_span!("apply_mapping", company = %context.company_name);
    let _guard = span.enter();

    validate_mapping(dataset.columns(), process)?;

    let mut outcome = MappingOutcome::default();
    for (source_index, record) in dataset.records().enumerate() {
        let Some(row) = map_record(record, process, context) else {
            debug!(source_row = source_index + 1, "LOC amount outside range; row filtered");
            outcome.filtered += 1;
            continue;
        };
        let position = outcome.rows.len() + 1;
        outcome.validation.extend(
            row.missing_required()
                .map(|column| ValidationError::missing(position, column)),
        );
        outcome.rows.push(row);
    }

    info!(
        source_rows = dataset.row_count(),
        output_rows = outcome.rows.len(),
        filtered = outcome.filtered,
        validation_errors = outcome.validation.len(),
        "mapping applied"
    );
    Ok(outcome)
}

/// Map one source row; `None` when the LOC range filter excludes it.
fn map_record(record: Record<'_>, process: &Process, context: &MappingContext) -> Option<OutputRow> {
    let options = &process.output_options;
    let mapped = |column: OutputColumn| process.fields.get(column).map(|source| record.value(source).trim());

    let loc = clean_loc_amount(
        mapped(OutputColumn::LocAmount).unwrap_or_default(),
        options.round_loc_amount,
    );
    if let Ok(amount) = loc.parse::<f64>()
        && !options.loc_in_range(amount)
    {
        return None;
    }

    let mut row = OutputRow::new();
    for column in OutputColumn::ALL {
        let value = match column {
            OutputColumn::LocAmount => loc.clone(),
            OutputColumn::AdditionalDetails => compose_additional_details(
                &process.additional_details,
                record,
                &context.company_name,
                &context.entity,
            ),
            OutputColumn::Email => {
                let secondary = options
                    .secondary_email_column
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| record.value(c));
                resolve_email(mapped(column).unwrap_or_default(), secondary, options)
            }
            _ => match mapped(column) {
                Some(value) => sanitize_value(value),
                None => column.default_value().unwrap_or_default().to_string(),
            },
        };
        row.set(column, value);
    }
    Some(row)
}

#[cfg(test)]
mod tests {
    use bu_model::FieldMapping;

    use super::*;

    fn process() -> Process {
        let mut process = Process::new("Acme");
        process.fields = FieldMapping::new()
            .with(OutputColumn::Firstname, "First")
            .unwrap()
            .with(OutputColumn::Surname, "Last")
            .unwrap()
            .with(OutputColumn::LocAmount, "Amount")
            .unwrap()
            .with(OutputColumn::Email, "Email")
            .unwrap();
        process
    }

    fn dataset() -> Dataset {
        Dataset::from_rows(
            &["First", "Last", "Amount", "Email", "Alt"],
            &[
                &["Jane", "Doe", "£1,000", "jane@acme.com", ""],
                &["John", "", "99.99", "", "john@acme.com"],
                &["Ann", "Lee", "250", "n/a", ""],
            ],
        )
        .unwrap()
    }

    #[test]
    fn maps_and_defaults_columns() {
        let outcome = apply_mapping(&dataset(), &process(), &MappingContext::default()).unwrap();
        let first = &outcome.rows[0];
        assert_eq!(first.get(OutputColumn::LocAmount), "1000.00");
        assert_eq!(first.get(OutputColumn::Country), "UK");
        assert_eq!(first.get(OutputColumn::PayFrequency), "Monthly");
        assert_eq!(first.get(OutputColumn::City), "");
    }

    #[test]
    fn validation_numbers_follow_filtered_output() {
        let mut process = process();
        process.fields.set(OutputColumn::Email, "Alt").unwrap();
        process.output_options.loc_minimum = Some(100.0);
        process.output_options.loc_maximum = Some(1000.0);

        let outcome = apply_mapping(&dataset(), &process, &MappingContext::default()).unwrap();
        assert_eq!(outcome.filtered, 1);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[1].get(OutputColumn::Firstname), "Ann");
        let rows: Vec<_> = outcome.validation.iter().map(|e| (e.row, e.column)).collect();
        assert_eq!(rows, vec![(1, OutputColumn::Email), (2, OutputColumn::Email)]);
    }

    #[test]
    fn invalid_primary_survives_without_alternatives() {
        let outcome = apply_mapping(&dataset(), &process(), &MappingContext::default()).unwrap();
        assert_eq!(outcome.rows[2].get(OutputColumn::Email), "n/a");
    }

    #[test]
    fn unknown_source_column_fails_before_mapping() {
        let mut process = process();
        process.additional_details.reference_column = Some("PO".to_string());
        let err = apply_mapping(&dataset(), &process, &MappingContext::default()).unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownSourceColumn {
                role: "Additional Details reference".to_string(),
                column: "PO".to_string(),
            }
        );
    }

    #[test]
    fn groups_errors_by_row() {
        let outcome = apply_mapping(&dataset(), &process(), &MappingContext::default()).unwrap();
        let grouped = outcome.errors_by_row();
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![2]);
        let columns: Vec<_> = grouped[&2].iter().map(|e| e.column).collect();
        assert_eq!(columns, vec![OutputColumn::Surname, OutputColumn::Email]);
        assert_eq!(outcome.invalid_row_count(), 1);
    }
}
