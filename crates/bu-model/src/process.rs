//! Saved mapping configurations ("processes").
//!
//! A process is scoped to one company: it records which source column feeds
//! each output column, how Additional Details is composed, and how emails and
//! LOC amounts are post-processed. Processes are serialized as camelCase JSON
//! so exports can be exchanged between installations.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ModelError, OutputColumn, Result};

/// Separator used by Additional Details when none is configured.
pub const DEFAULT_SEPARATOR: &str = "/";

/// Opaque process identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
            return Err(ModelError::InvalidProcessId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output column to source column assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<OutputColumn, String>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a source column. Blank names clear the assignment.
    pub fn set(&mut self, column: OutputColumn, source: impl Into<String>) -> Result<()> {
        if !column.is_mappable() {
            return Err(ModelError::NotMappable(column));
        }
        let source = source.into();
        if source.trim().is_empty() {
            self.0.remove(&column);
        } else {
            self.0.insert(column, source);
        }
        Ok(())
    }

    /// Builder-style [`Self::set`] for fixtures.
    pub fn with(mut self, column: OutputColumn, source: impl Into<String>) -> Result<Self> {
        self.set(column, source)?;
        Ok(self)
    }

    /// Source column for an output column, if one is configured.
    pub fn get(&self, column: OutputColumn) -> Option<&str> {
        self.0
            .get(&column)
            .map(String::as_str)
            .filter(|source| !source.trim().is_empty())
    }

    pub fn remove(&mut self, column: OutputColumn) -> Option<String> {
        self.0.remove(&column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputColumn, &str)> {
        self.0.iter().map(|(column, source)| (*column, source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// Recipe for the derived Additional Details column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalDetailsConfig {
    #[serde(default)]
    pub include_company: bool,
    #[serde(default)]
    pub include_entity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_column: Option<String>,
    #[serde(default)]
    pub fixed_prefix: String,
    #[serde(default)]
    pub fixed_suffix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for AdditionalDetailsConfig {
    fn default() -> Self {
        Self {
            include_company: false,
            include_entity: false,
            reference_column: None,
            entity_column: None,
            fixed_prefix: String::new(),
            fixed_suffix: String::new(),
            separator: default_separator(),
        }
    }
}

/// Post-processing applied to emails and LOC amounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    /// Round LOC amounts up to a whole number.
    #[serde(default, rename = "roundLOCAmount")]
    pub round_loc_amount: bool,
    /// Address used when neither primary nor secondary email is usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_email_column: Option<String>,
    /// Case-insensitive substrings that mark an email as unusable.
    #[serde(default)]
    pub email_keywords_to_replace: Vec<String>,
    #[serde(default, rename = "locMinimum", skip_serializing_if = "Option::is_none")]
    pub loc_minimum: Option<f64>,
    #[serde(default, rename = "locMaximum", skip_serializing_if = "Option::is_none")]
    pub loc_maximum: Option<f64>,
}

impl OutputOptions {
    /// Whether a cleaned LOC amount falls inside the configured range.
    ///
    /// Bounds are inclusive; an absent bound never excludes.
    pub fn loc_in_range(&self, amount: f64) -> bool {
        self.loc_minimum.is_none_or(|min| amount >= min)
            && self.loc_maximum.is_none_or(|max| amount <= max)
    }

    pub fn has_loc_range(&self) -> bool {
        self.loc_minimum.is_some() || self.loc_maximum.is_some()
    }
}

/// Remembered row settings for files from the same company (1-indexed rows).
///
/// `header_row` is always `start_row - 1`; zero means the file has no header
/// row and every column name is synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    pub header_row: usize,
    pub start_row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_row: Option<usize>,
}

impl DataConfig {
    pub fn new(start_row: usize, end_row: Option<usize>) -> Self {
        Self {
            header_row: start_row.saturating_sub(1),
            start_row,
            end_row,
        }
    }

    /// Move the first data row, keeping the header directly above it.
    pub fn with_start_row(self, start_row: usize) -> Self {
        Self::new(start_row, self.end_row)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self::new(2, None)
    }
}

/// A saved, company-scoped mapping record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProcessId>,
    /// Matching key for company resolution.
    pub company_name: String,
    /// Label shown to operators.
    #[serde(default)]
    pub display_name: String,
    /// Short entity code used in Additional Details.
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub fields: FieldMapping,
    #[serde(default)]
    pub additional_details: AdditionalDetailsConfig,
    #[serde(default)]
    pub output_options: OutputOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_provider: Option<String>,
    /// Alternate company names that resolve to this process.
    #[serde(default)]
    pub linked_companies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_config: Option<DataConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Process {
    pub fn new(company_name: impl Into<String>) -> Self {
        let company_name = company_name.into();
        Self {
            id: None,
            display_name: company_name.clone(),
            company_name,
            entity: String::new(),
            fields: FieldMapping::default(),
            additional_details: AdditionalDetailsConfig::default(),
            output_options: OutputOptions::default(),
            benefit_provider: None,
            linked_companies: Vec::new(),
            data_config: None,
            updated_at: None,
        }
    }

    /// Label for display: the display name, or the company name when blank.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.company_name
        } else {
            &self.display_name
        }
    }

    /// Record an alternate company name.
    ///
    /// The list is append-only and deduplicated case-insensitively; names equal
    /// to the process's own company name are ignored. Returns true when added.
    pub fn link_company(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(self.company_name.trim()) {
            return false;
        }
        if self.is_linked(name) {
            return false;
        }
        self.linked_companies.push(name.to_string());
        true
    }

    pub fn is_linked(&self, name: &str) -> bool {
        let name = name.trim();
        self.linked_companies
            .iter()
            .any(|linked| linked.trim().eq_ignore_ascii_case(name))
    }

    /// Copy suitable for "save as new": same configuration, no identity.
    pub fn forked(&self) -> Self {
        Self {
            id: None,
            updated_at: None,
            ..self.clone()
        }
    }
}
