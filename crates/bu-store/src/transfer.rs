//! Export and import of saved processes.
//!
//! Exports are a JSON envelope `{ version, exportedAt, processes }`. Imports
//! accept that envelope or a bare array of processes. Imported processes
//! always receive fresh ids; collisions with existing processes (same
//! company or display name, ignoring case) are settled by a
//! [`CollisionResolver`].

use bu_model::Process;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::store::{ProcessStore, SaveMode};

/// Envelope version written by [`export_all`].
pub const EXPORT_VERSION: u32 = 1;

/// Exported process set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub processes: Vec<Process>,
}

/// What to do with an imported process that collides with a saved one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionAction {
    /// Replace the saved process's configuration, keeping its id.
    Overwrite,
    /// Import under a new name with a ` (2)`, ` (3)`, ... suffix.
    Rename,
    Skip,
}

/// A resolver's answer, optionally applied to every later collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionDecision {
    pub action: CollisionAction,
    pub apply_to_all: bool,
}

impl CollisionDecision {
    pub fn once(action: CollisionAction) -> Self {
        Self {
            action,
            apply_to_all: false,
        }
    }

    pub fn always(action: CollisionAction) -> Self {
        Self {
            action,
            apply_to_all: true,
        }
    }
}

/// Decides how to import a colliding process.
pub trait CollisionResolver {
    fn resolve(&mut self, incoming: &Process, existing: &Process) -> CollisionDecision;
}

/// A fixed action for every collision.
impl CollisionResolver for CollisionAction {
    fn resolve(&mut self, _incoming: &Process, _existing: &Process) -> CollisionDecision {
        CollisionDecision::always(*self)
    }
}

/// Counts from an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub overwritten: usize,
    pub renamed: usize,
    pub skipped: usize,
}

impl ImportSummary {
    pub fn imported(&self) -> usize {
        self.created + self.overwritten + self.renamed
    }
}

/// Serialize every saved process into an export envelope.
pub fn export_all(store: &ProcessStore) -> Result<String> {
    let envelope = ExportEnvelope {
        version: EXPORT_VERSION,
        exported_at: Utc::now(),
        processes: store.list()?,
    };
    info!(processes = envelope.processes.len(), "processes exported");
    serde_json::to_string_pretty(&envelope).map_err(|source| StoreError::Serialization { source })
}

/// Parse an export envelope or a bare process array.
pub fn parse_import(json: &str) -> Result<Vec<Process>> {
    let value: Value = serde_json::from_str(json)
        .map_err(|source| StoreError::Deserialization { path: None, source })?;
    let processes = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => {
            if let Some(version) = object.get("version").and_then(Value::as_u64)
                && version > u64::from(EXPORT_VERSION)
            {
                return Err(StoreError::InvalidImport {
                    reason: format!("export version {version} is newer than {EXPORT_VERSION}"),
                });
            }
            object
                .remove("processes")
                .ok_or_else(|| StoreError::InvalidImport {
                    reason: "object has no 'processes' array".to_string(),
                })?
        }
        _ => {
            return Err(StoreError::InvalidImport {
                reason: "expected an export object or an array of processes".to_string(),
            });
        }
    };
    serde_json::from_value(processes)
        .map_err(|source| StoreError::Deserialization { path: None, source })
}

fn same_name(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
}

fn collides(incoming: &Process, existing: &Process) -> bool {
    same_name(&incoming.company_name, &existing.company_name)
        || same_name(incoming.label(), existing.label())
}

/// First ` (n)` suffix, from 2, not used by any saved company or label.
fn unique_name(base: &str, saved: &[Process]) -> String {
    (2..)
        .map(|n| format!("{} ({n})", base.trim()))
        .find(|candidate| {
            !saved.iter().any(|p| {
                same_name(candidate, &p.company_name) || same_name(candidate, p.label())
            })
        })
        .unwrap_or_else(|| base.to_string())
}

/// Import processes into the store.
pub fn import_all(
    store: &mut ProcessStore,
    json: &str,
    resolver: &mut dyn CollisionResolver,
) -> Result<ImportSummary> {
    let incoming = parse_import(json)?;
    let mut saved = store.list()?;
    let mut summary = ImportSummary::default();
    let mut standing: Option<CollisionAction> = None;

    for process in incoming {
        let process = process.forked();
        let Some(existing) = saved.iter().find(|p| collides(&process, p)).cloned() else {
            saved.push(store.save(&process, SaveMode::SaveAsNew)?);
            summary.created += 1;
            continue;
        };

        let action = match standing {
            Some(action) => action,
            None => {
                let decision = resolver.resolve(&process, &existing);
                if decision.apply_to_all {
                    standing = Some(decision.action);
                }
                decision.action
            }
        };

        match action {
            CollisionAction::Overwrite => {
                let replacement = Process {
                    id: existing.id.clone(),
                    ..process
                };
                let stored = store.save(&replacement, SaveMode::Update)?;
                if let Some(slot) = saved.iter_mut().find(|p| p.id == stored.id) {
                    *slot = stored;
                }
                summary.overwritten += 1;
            }
            CollisionAction::Rename => {
                let company_name = unique_name(&process.company_name, &saved);
                let display_name = if same_name(&process.display_name, &process.company_name)
                    || process.display_name.trim().is_empty()
                {
                    company_name.clone()
                } else {
                    unique_name(&process.display_name, &saved)
                };
                let renamed = Process {
                    company_name,
                    display_name,
                    ..process
                };
                saved.push(store.save(&renamed, SaveMode::SaveAsNew)?);
                summary.renamed += 1;
            }
            CollisionAction::Skip => {
                warn!(company = %process.company_name, "import skipped existing process");
                summary.skipped += 1;
            }
        }
    }

    info!(
        created = summary.created,
        overwritten = summary.overwritten,
        renamed = summary.renamed,
        skipped = summary.skipped,
        "processes imported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_arrays_and_envelopes() {
        let bare = r#"[{"companyName": "Acme"}]"#;
        assert_eq!(parse_import(bare).unwrap()[0].company_name, "Acme");

        let envelope = r#"{"version": 1, "exportedAt": "2024-01-01T00:00:00Z",
            "processes": [{"companyName": "Globex"}]}"#;
        assert_eq!(parse_import(envelope).unwrap()[0].company_name, "Globex");
    }

    #[test]
    fn rejects_unexpected_shapes() {
        assert!(matches!(parse_import("42"), Err(StoreError::InvalidImport { .. })));
        assert!(matches!(
            parse_import(r#"{"version": 1}"#),
            Err(StoreError::InvalidImport { .. })
        ));
        assert!(matches!(
            parse_import(r#"{"version": 9, "processes": []}"#),
            Err(StoreError::InvalidImport { .. })
        ));
        assert!(matches!(
            parse_import("not json"),
            Err(StoreError::Deserialization { path: None, .. })
        ));
    }

    #[test]
    fn unique_name_skips_taken_suffixes() {
        let saved = vec![Process::new("Acme"), Process::new("acme (2)")];
        assert_eq!(unique_name("Acme", &saved), "Acme (3)");
    }
}
