//! Process store with a local fallback.

use bu_model::{Process, ProcessId};
use rapidfuzz::distance::jaro_winkler;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::ProcessBackend;
use crate::error::{Result, StoreError};

/// Minimum Jaro-Winkler similarity for a fuzzy company match.
pub const FUZZY_COMPANY_THRESHOLD: f64 = 0.92;

/// How a save treats an existing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Replace the stored record (create when the process has no id).
    Update,
    /// Store a copy under a new id, leaving the original untouched.
    SaveAsNew,
}

/// Which rule resolved a company name to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Exact,
    Linked,
    DisplayName,
    Substring,
    Fuzzy,
}

/// A process found for a company name.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub process: Process,
    pub kind: ResolutionKind,
    /// 1.0 except for fuzzy matches.
    pub score: f64,
}

fn fold(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Pick the process a company name refers to.
///
/// Rules in order, first hit wins: exact company name, linked company,
/// display name, substring either way (longest company name first), then the
/// best Jaro-Winkler score at or above [`FUZZY_COMPANY_THRESHOLD`]. All
/// comparisons ignore case and repeated whitespace.
pub fn resolve_in(processes: &[Process], name: &str) -> Option<Resolution> {
    let query = fold(name);
    if query.is_empty() {
        return None;
    }
    let found = |process: &Process, kind| Resolution {
        process: process.clone(),
        kind,
        score: 1.0,
    };

    if let Some(process) = processes.iter().find(|p| fold(&p.company_name) == query) {
        return Some(found(process, ResolutionKind::Exact));
    }
    if let Some(process) = processes
        .iter()
        .find(|p| p.linked_companies.iter().any(|linked| fold(linked) == query))
    {
        return Some(found(process, ResolutionKind::Linked));
    }
    if let Some(process) = processes.iter().find(|p| fold(&p.display_name) == query) {
        return Some(found(process, ResolutionKind::DisplayName));
    }
    if let Some(process) = processes
        .iter()
        .filter(|p| {
            let company = fold(&p.company_name);
            !company.is_empty() && (company.contains(&query) || query.contains(&company))
        })
        .max_by_key(|p| fold(&p.company_name).len())
    {
        return Some(found(process, ResolutionKind::Substring));
    }

    processes
        .iter()
        .map(|p| {
            let score = jaro_winkler::similarity(query.chars(), fold(&p.company_name).chars());
            (p, score)
        })
        .filter(|(_, score)| *score >= FUZZY_COMPANY_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(process, score)| Resolution {
            process: process.clone(),
            kind: ResolutionKind::Fuzzy,
            score,
        })
}

/// Saved processes behind a primary backend and an optional local fallback.
///
/// Every operation runs against the primary first. When it fails, the error
/// is logged and the operation is retried on the fallback.
pub struct ProcessStore {
    primary: Box<dyn ProcessBackend>,
    fallback: Option<Box<dyn ProcessBackend>>,
}

impl ProcessStore {
    pub fn new(primary: Box<dyn ProcessBackend>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn ProcessBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn read<T>(&self, operation: &str, run: impl Fn(&dyn ProcessBackend) -> Result<T>) -> Result<T> {
        match run(self.primary.as_ref()) {
            Ok(value) => Ok(value),
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        operation,
                        backend = self.primary.name(),
                        fallback = fallback.name(),
                        error = %err,
                        "primary store failed; using fallback"
                    );
                    run(fallback.as_ref())
                }
                None => Err(err),
            },
        }
    }

    fn write<T>(
        &mut self,
        operation: &str,
        run: impl Fn(&mut dyn ProcessBackend) -> Result<T>,
    ) -> Result<T> {
        self.write_or(operation, &run, &run)
    }

    /// Run `on_primary`, then `on_fallback` against the fallback if the
    /// primary fails.
    fn write_or<T>(
        &mut self,
        operation: &str,
        on_primary: impl FnOnce(&mut dyn ProcessBackend) -> Result<T>,
        on_fallback: impl FnOnce(&mut dyn ProcessBackend) -> Result<T>,
    ) -> Result<T> {
        match on_primary(self.primary.as_mut()) {
            Ok(value) => Ok(value),
            Err(err) => match self.fallback.as_mut() {
                Some(fallback) => {
                    warn!(
                        operation,
                        backend = self.primary.name(),
                        fallback = fallback.name(),
                        error = %err,
                        "primary store failed; using fallback"
                    );
                    on_fallback(fallback.as_mut())
                }
                None => Err(err),
            },
        }
    }

    /// Replace a stored process. The fallback only holds what this session
    /// wrote to it, so a miss there stores the record under its own id.
    fn replace(&mut self, operation: &str, process: &Process) -> Result<Process> {
        self.write_or(
            operation,
            |backend| backend.update(process.clone()),
            |fallback| match fallback.update(process.clone()) {
                Err(StoreError::NotFound(id)) => {
                    debug!(id = %id, "process not held by fallback; inserting");
                    fallback.insert(process.clone())
                }
                other => other,
            },
        )
    }

    pub fn list(&self) -> Result<Vec<Process>> {
        self.read("list", |backend| backend.list())
    }

    pub fn get(&self, id: &ProcessId) -> Result<Process> {
        self.read("get", |backend| backend.get(id))
    }

    pub fn delete(&mut self, id: &ProcessId) -> Result<()> {
        self.write_or(
            "delete",
            |backend| backend.delete(id),
            |fallback| match fallback.delete(id) {
                Err(StoreError::NotFound(_)) => {
                    debug!(id = %id, "process not held by fallback");
                    Ok(())
                }
                other => other,
            },
        )
    }

    /// Save a process and return the stored record.
    pub fn save(&mut self, process: &Process, mode: SaveMode) -> Result<Process> {
        let saved = match (mode, process.id.is_some()) {
            (SaveMode::Update, true) => self.replace("update", process)?,
            (SaveMode::Update, false) => self.write("create", |backend| backend.create(process.clone()))?,
            (SaveMode::SaveAsNew, _) => {
                self.write("create", |backend| backend.create(process.forked()))?
            }
        };
        info!(company = %saved.company_name, ?mode, "process saved");
        Ok(saved)
    }

    /// Resolve a company name (typically extracted from a filename).
    pub fn resolve_company(&self, name: &str) -> Result<Option<Resolution>> {
        let processes = self.list()?;
        let resolution = resolve_in(&processes, name);
        match &resolution {
            Some(found) => debug!(
                query = name,
                company = %found.process.company_name,
                kind = ?found.kind,
                score = found.score,
                "company resolved"
            ),
            None => debug!(query = name, "no process for company"),
        }
        Ok(resolution)
    }

    /// Add an alternate company name to a process. Returns false when the
    /// name was already linked or is the process's own company.
    pub fn link_company(&mut self, id: &ProcessId, name: &str) -> Result<bool> {
        let mut process = self.get(id)?;
        if !process.link_company(name) {
            return Ok(false);
        }
        self.replace("link", &process)?;
        info!(id = %id, linked = name, "company linked");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn processes() -> Vec<Process> {
        let mut acme = Process::new("Acme Widgets");
        acme.link_company("Acme Group");
        let mut globex = Process::new("Globex");
        globex.display_name = "Globex Corporation UK".to_string();
        vec![acme, globex, Process::new("Initech Holdings"), Process::new("Initech")]
    }

    fn resolve(name: &str) -> Option<(String, ResolutionKind)> {
        resolve_in(&processes(), name).map(|r| (r.process.company_name, r.kind))
    }

    #[test]
    fn resolution_order() {
        assert_eq!(resolve("acme  widgets"), Some(("Acme Widgets".into(), ResolutionKind::Exact)));
        assert_eq!(resolve("ACME GROUP"), Some(("Acme Widgets".into(), ResolutionKind::Linked)));
        assert_eq!(
            resolve("Globex Corporation UK"),
            Some(("Globex".into(), ResolutionKind::DisplayName))
        );
        assert_eq!(
            resolve("Initech Holdings Europe"),
            Some(("Initech Holdings".into(), ResolutionKind::Substring))
        );
        assert_eq!(resolve("Acme Widgetz"), Some(("Acme Widgets".into(), ResolutionKind::Fuzzy)));
        assert_eq!(resolve("Umbrella"), None);
        assert_eq!(resolve("  "), None);
    }

    #[test]
    fn save_as_new_keeps_original() {
        let mut store = ProcessStore::new(Box::new(MemoryBackend::new()));
        let original = store.save(&Process::new("Acme"), SaveMode::Update).unwrap();
        let copy = store.save(&original, SaveMode::SaveAsNew).unwrap();
        assert_ne!(original.id, copy.id);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn link_company_persists() {
        let mut store = ProcessStore::new(Box::new(MemoryBackend::new()));
        let saved = store.save(&Process::new("Acme"), SaveMode::Update).unwrap();
        let id = saved.id.unwrap();
        assert!(store.link_company(&id, "Acme Group").unwrap());
        assert!(!store.link_company(&id, "acme group").unwrap());
        assert_eq!(store.get(&id).unwrap().linked_companies, vec!["Acme Group".to_string()]);
    }
}
