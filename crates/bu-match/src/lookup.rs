//! Targeted entity lookup across batch files.
//!
//! Operators know who they are looking for (names and LOC amounts from an
//! invoice or typed by hand) but not which entity each person belongs to.
//! A [`LookupSession`] searches batch files one at a time; every employee
//! found is skipped by later searches, so adding files only narrows the
//! missing list.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use bu_map::parse_loc_amount;
use bu_model::{Dataset, Record};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::error::{MatchError, Result};

/// Entity columns combined per match.
pub const MAX_ENTITY_COLUMNS: usize = 3;

/// Amount tolerance when comparing a batch row with an employee.
const LOC_TOLERANCE: f64 = 0.01;

/// Separator between entity column values.
const ENTITY_SEPARATOR: &str = "/";

static FIRST_NAME_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)first[\s_\-]*name|forename|given[\s_\-]*name").expect("valid regex")
});
static LAST_NAME_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)surname|last[\s_\-]*name|family[\s_\-]*name").expect("valid regex")
});
static LOC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bloc\b|amount|voucher|certificate|value|total").expect("valid regex")
});
static ENTITY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)entity|company|division|department|site|location|cost[\s_\-]*cent(?:re|er)|business[\s_\-]*unit")
        .expect("valid regex")
});

/// Someone to find in the batch files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    /// Empty when unknown.
    pub first_name: String,
    /// Empty when unknown.
    pub last_name: String,
    pub loc: f64,
}

impl Employee {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, loc: f64) -> Self {
        Self {
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            loc,
        }
    }

    pub fn display_name(&self) -> String {
        [self.first_name.as_str(), self.last_name.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether a batch row with these names and amount is this employee.
    ///
    /// With both names known, both must match case-insensitively. With one
    /// name known it may appear in either name column.
    pub fn matches(&self, first: &str, last: &str, loc: f64) -> bool {
        if (loc - self.loc).abs() >= LOC_TOLERANCE {
            return false;
        }
        let eq = |a: &str, b: &str| a.trim().to_lowercase() == b.to_lowercase();
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => eq(first, &self.first_name) && eq(last, &self.last_name),
            (false, true) => eq(first, &self.first_name) || eq(last, &self.first_name),
            (true, false) => eq(first, &self.last_name) || eq(last, &self.last_name),
            (true, true) => false,
        }
    }
}

/// Column roles within one batch file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchColumns {
    pub first_name: String,
    pub last_name: String,
    pub loc: String,
    pub entity: Vec<String>,
}

impl BatchColumns {
    /// Assign roles from header names.
    ///
    /// Each role takes the first header matching its pattern; entity columns
    /// take up to [`MAX_ENTITY_COLUMNS`] of the remaining matching headers.
    pub fn auto_assign(batch: &str, columns: &[String]) -> Result<Self> {
        let pick = |re: &Regex, role: &'static str| {
            columns
                .iter()
                .find(|column| re.is_match(column))
                .cloned()
                .ok_or_else(|| MatchError::UnassignedColumn {
                    batch: batch.to_string(),
                    missing: role,
                })
        };
        let first_name = pick(&FIRST_NAME_HEADER, "first name")?;
        let last_name = pick(&LAST_NAME_HEADER, "last name")?;
        let loc = columns
            .iter()
            .filter(|column| **column != first_name && **column != last_name)
            .find(|column| LOC_HEADER.is_match(column))
            .cloned()
            .ok_or_else(|| MatchError::UnassignedColumn {
                batch: batch.to_string(),
                missing: "LOC amount",
            })?;
        let entity = columns
            .iter()
            .filter(|column| ![&first_name, &last_name, &loc].contains(column))
            .filter(|column| ENTITY_HEADER.is_match(column))
            .take(MAX_ENTITY_COLUMNS)
            .cloned()
            .collect();
        Ok(Self {
            first_name,
            last_name,
            loc,
            entity,
        })
    }

    /// Check the assignment against a batch's columns.
    pub fn validate(&self, batch: &str, dataset: &Dataset) -> Result<()> {
        if self.entity.len() > MAX_ENTITY_COLUMNS {
            return Err(MatchError::TooManyEntityColumns {
                count: self.entity.len(),
                max: MAX_ENTITY_COLUMNS,
            });
        }
        let named = [&self.first_name, &self.last_name, &self.loc]
            .into_iter()
            .chain(self.entity.iter());
        for column in named {
            if !dataset.has_column(column) {
                return Err(MatchError::UnknownColumn {
                    batch: batch.to_string(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    fn entity_value(&self, record: Record<'_>) -> String {
        self.entity
            .iter()
            .map(|column| record.value(column).trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(ENTITY_SEPARATOR)
    }
}

/// Where an employee was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupMatch {
    pub batch: String,
    /// 0-based row within the batch.
    pub row: usize,
    pub entity: String,
}

/// A cumulative search over batch files.
#[derive(Debug, Clone, Default)]
pub struct LookupSession {
    employees: Vec<Employee>,
    found: BTreeMap<usize, LookupMatch>,
}

impl LookupSession {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self {
            employees,
            found: BTreeMap::new(),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Search one batch for employees not yet found; returns how many were
    /// found in this pass.
    pub fn search(&mut self, batch: &str, dataset: &Dataset, columns: &BatchColumns) -> Result<usize> {
        let span = info_span!("lookup_search", batch);
        let _guard = span.enter();

        columns.validate(batch, dataset)?;

        let mut newly_found = 0;
        for (index, employee) in self.employees.iter().enumerate() {
            if self.found.contains_key(&index) {
                continue;
            }
            let hit = dataset.records().enumerate().find(|(_, record)| {
                parse_loc_amount(record.value(&columns.loc)).is_some_and(|loc| {
                    employee.matches(
                        record.value(&columns.first_name),
                        record.value(&columns.last_name),
                        loc,
                    )
                })
            });
            if let Some((row, record)) = hit {
                debug!(employee = index, row, "employee found");
                self.found.insert(
                    index,
                    LookupMatch {
                        batch: batch.to_string(),
                        row,
                        entity: columns.entity_value(record),
                    },
                );
                newly_found += 1;
            }
        }

        info!(
            rows = dataset.row_count(),
            found = newly_found,
            missing = self.employees.len() - self.found.len(),
            "batch searched"
        );
        Ok(newly_found)
    }

    /// Found employees with their match, in input order.
    pub fn found(&self) -> impl Iterator<Item = (&Employee, &LookupMatch)> {
        self.found
            .iter()
            .filter_map(|(index, found)| self.employees.get(*index).map(|e| (e, found)))
    }

    /// Employees not found in any batch so far, in input order.
    pub fn missing(&self) -> impl Iterator<Item = &Employee> {
        self.employees
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.found.contains_key(index))
            .map(|(_, employee)| employee)
    }

    pub fn is_complete(&self) -> bool {
        self.found.len() == self.employees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn single_name_matches_either_column() {
        let employee = Employee::new("", "Smith", 250.0);
        assert!(employee.matches("Smith", "Jones", 250.004));
        assert!(employee.matches("Anna", "SMITH", 250.0));
        assert!(!employee.matches("Anna", "Smith", 251.0));
    }

    #[test]
    fn both_names_must_match_in_place() {
        let employee = Employee::new("Anna", "Smith", 100.0);
        assert!(employee.matches(" anna ", "smith", 100.0));
        assert!(!employee.matches("Smith", "Anna", 100.0));
    }

    #[test]
    fn auto_assigns_roles_from_headers() {
        let columns = BatchColumns::auto_assign(
            "batch.csv",
            &headers(&["Forename", "Surname", "Voucher Value", "Company", "Site", "Email"]),
        )
        .unwrap();
        assert_eq!(columns.first_name, "Forename");
        assert_eq!(columns.last_name, "Surname");
        assert_eq!(columns.loc, "Voucher Value");
        assert_eq!(columns.entity, headers(&["Company", "Site"]));
    }

    #[test]
    fn auto_assign_reports_missing_role() {
        let err = BatchColumns::auto_assign("b.csv", &headers(&["Forename", "Surname"])).unwrap_err();
        assert_eq!(
            err,
            MatchError::UnassignedColumn {
                batch: "b.csv".to_string(),
                missing: "LOC amount",
            }
        );
    }
}
