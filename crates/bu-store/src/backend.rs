//! Storage backends for saved processes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use bu_model::{Process, ProcessId};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};

/// A place processes can be kept.
///
/// `create` assigns a fresh id and timestamp; `update` replaces an existing
/// record and refreshes its timestamp; `insert` stores a record under the id
/// it already carries, existing or not. All three return the stored record.
pub trait ProcessBackend {
    /// Short name for logs and errors.
    fn name(&self) -> &str;

    /// All processes, ordered by company name.
    fn list(&self) -> Result<Vec<Process>>;

    fn get(&self, id: &ProcessId) -> Result<Process>;

    fn create(&mut self, process: Process) -> Result<Process>;

    fn update(&mut self, process: Process) -> Result<Process>;

    fn insert(&mut self, process: Process) -> Result<Process>;

    fn delete(&mut self, id: &ProcessId) -> Result<()>;
}

fn sort_by_company(processes: &mut [Process]) {
    processes.sort_by(|a, b| {
        a.company_name
            .to_lowercase()
            .cmp(&b.company_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn required_id(process: &Process) -> Result<ProcessId> {
    process.id.clone().ok_or_else(|| StoreError::MissingId {
        company: process.company_name.clone(),
    })
}

/// Processes held in memory; used as the local fallback and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    processes: BTreeMap<ProcessId, Process>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn list(&self) -> Result<Vec<Process>> {
        let mut processes: Vec<Process> = self.processes.values().cloned().collect();
        sort_by_company(&mut processes);
        Ok(processes)
    }

    fn get(&self, id: &ProcessId) -> Result<Process> {
        self.processes
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn create(&mut self, mut process: Process) -> Result<Process> {
        let id = ProcessId::generate();
        process.id = Some(id.clone());
        process.updated_at = Some(Utc::now());
        self.processes.insert(id, process.clone());
        Ok(process)
    }

    fn update(&mut self, mut process: Process) -> Result<Process> {
        let id = required_id(&process)?;
        if !self.processes.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        process.updated_at = Some(Utc::now());
        self.processes.insert(id, process.clone());
        Ok(process)
    }

    fn insert(&mut self, mut process: Process) -> Result<Process> {
        let id = required_id(&process)?;
        process.updated_at = Some(Utc::now());
        self.processes.insert(id, process.clone());
        Ok(process)
    }

    fn delete(&mut self, id: &ProcessId) -> Result<()> {
        self.processes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

/// One pretty-printed JSON file per process in a directory.
///
/// Files are named `<id>.json` and written atomically (temp file + rename).
#[derive(Debug, Clone)]
pub struct JsonDirBackend {
    dir: PathBuf,
}

impl JsonDirBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ProcessId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read(&self, path: &Path) -> Result<Process> {
        let text = fs::read_to_string(path).map_err(|e| StoreError::io("read", path, e))?;
        serde_json::from_str(&text).map_err(|source| StoreError::Deserialization {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    fn write(&self, process: &Process, id: &ProcessId) -> Result<()> {
        let json = serde_json::to_string_pretty(process)
            .map_err(|source| StoreError::Serialization { source })?;
        let path = self.path_for(id);
        write_atomic(&path, json.as_bytes())?;
        debug!(path = %path.display(), "process written");
        Ok(())
    }
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io("create directory", parent, e))?;
    }
    let temp_path = path.with_extension("json.tmp");

    let mut file = File::create(&temp_path).map_err(|e| StoreError::io("create", &temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| StoreError::io("write", &temp_path, e))?;
    file.sync_all()
        .map_err(|e| StoreError::io("sync", &temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|source| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source,
    })
}

impl ProcessBackend for JsonDirBackend {
    fn name(&self) -> &str {
        "json"
    }

    fn list(&self) -> Result<Vec<Process>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("read directory", &self.dir, e)),
        };

        let mut processes = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| StoreError::io("read directory", &self.dir, e))?
                .path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match self.read(&path) {
                Ok(process) => processes.push(process),
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable process file"),
            }
        }
        sort_by_company(&mut processes);
        Ok(processes)
    }

    fn get(&self, id: &ProcessId) -> Result<Process> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.read(&path)
    }

    fn create(&mut self, mut process: Process) -> Result<Process> {
        let id = ProcessId::generate();
        process.id = Some(id.clone());
        process.updated_at = Some(Utc::now());
        self.write(&process, &id)?;
        info!(id = %id, company = %process.company_name, "process created");
        Ok(process)
    }

    fn update(&mut self, mut process: Process) -> Result<Process> {
        let id = required_id(&process)?;
        if !self.path_for(&id).exists() {
            return Err(StoreError::NotFound(id));
        }
        process.updated_at = Some(Utc::now());
        self.write(&process, &id)?;
        info!(id = %id, company = %process.company_name, "process updated");
        Ok(process)
    }

    fn insert(&mut self, mut process: Process) -> Result<Process> {
        let id = required_id(&process)?;
        process.updated_at = Some(Utc::now());
        self.write(&process, &id)?;
        info!(id = %id, company = %process.company_name, "process stored");
        Ok(process)
    }

    fn delete(&mut self, id: &ProcessId) -> Result<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(id = %id, "process deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(id.clone())),
            Err(e) => Err(StoreError::io("delete", path, e)),
        }
    }
}
