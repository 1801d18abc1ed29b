//! Integration tests for the process store.

use bu_model::{FieldMapping, OutputColumn, Process, ProcessId};
use bu_store::{
    CollisionAction, CollisionDecision, CollisionResolver, JsonDirBackend, MemoryBackend,
    ProcessBackend, ProcessStore, ResolutionKind, SaveMode, StoreError, export_all, import_all,
};
use tempfile::tempdir;

/// Backend that fails every call, standing in for an unreachable remote store.
struct Offline;

impl Offline {
    fn err() -> StoreError {
        StoreError::Unavailable {
            backend: "remote".to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

impl ProcessBackend for Offline {
    fn name(&self) -> &str {
        "remote"
    }
    fn list(&self) -> bu_store::Result<Vec<Process>> {
        Err(Self::err())
    }
    fn get(&self, _id: &ProcessId) -> bu_store::Result<Process> {
        Err(Self::err())
    }
    fn create(&mut self, _process: Process) -> bu_store::Result<Process> {
        Err(Self::err())
    }
    fn update(&mut self, _process: Process) -> bu_store::Result<Process> {
        Err(Self::err())
    }
    fn insert(&mut self, _process: Process) -> bu_store::Result<Process> {
        Err(Self::err())
    }
    fn delete(&mut self, _id: &ProcessId) -> bu_store::Result<()> {
        Err(Self::err())
    }
}

fn configured(company: &str) -> Process {
    let mut process = Process::new(company);
    process.entity = "ENT".to_string();
    process.fields = FieldMapping::new()
        .with(OutputColumn::Firstname, "First Name")
        .unwrap()
        .with(OutputColumn::Email, "Work Email")
        .unwrap();
    process.output_options.round_loc_amount = true;
    process.output_options.loc_minimum = Some(100.0);
    process
}

/// Processes without store-assigned identity, for comparing process sets.
fn comparable(mut processes: Vec<Process>) -> Vec<Process> {
    for process in &mut processes {
        process.id = None;
        process.updated_at = None;
    }
    processes.sort_by(|a, b| a.company_name.cmp(&b.company_name));
    processes
}

#[test]
fn test_fallback_serves_reads_and_writes() {
    let mut store = ProcessStore::new(Box::new(Offline)).with_fallback(Box::new(MemoryBackend::new()));
    let saved = store.save(&configured("Acme"), SaveMode::Update).unwrap();
    let id = saved.id.clone().unwrap();

    assert_eq!(store.get(&id).unwrap().company_name, "Acme");
    assert_eq!(store.list().unwrap().len(), 1);
    store.delete(&id).unwrap();
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_fallback_accepts_processes_loaded_before_outage() {
    let mut store = ProcessStore::new(Box::new(Offline)).with_fallback(Box::new(MemoryBackend::new()));
    let mut loaded = configured("Acme");
    let id = ProcessId::generate();
    loaded.id = Some(id.clone());
    loaded.entity = "ACM".to_string();

    let saved = store.save(&loaded, SaveMode::Update).unwrap();
    assert_eq!(saved.id.as_ref(), Some(&id));
    assert_eq!(store.get(&id).unwrap().entity, "ACM");

    assert!(store.link_company(&id, "Acme Group").unwrap());
    assert_eq!(store.get(&id).unwrap().linked_companies, vec!["Acme Group".to_string()]);

    store.delete(&ProcessId::generate()).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_without_fallback_errors_surface() {
    let store = ProcessStore::new(Box::new(Offline));
    let err = store.list().unwrap_err();
    assert!(matches!(err, StoreError::Unavailable { .. }));
    assert!(err.suggestion().is_some());
}

#[test]
fn test_export_import_round_trip() {
    let dir = tempdir().unwrap();
    let mut source = ProcessStore::new(Box::new(JsonDirBackend::new(dir.path().join("a"))));
    let mut acme = configured("Acme");
    acme.link_company("Acme Group");
    source.save(&acme, SaveMode::Update).unwrap();
    source.save(&configured("Globex"), SaveMode::Update).unwrap();

    let json = export_all(&source).unwrap();
    assert!(json.contains("\"exportedAt\""));

    let mut target = ProcessStore::new(Box::new(JsonDirBackend::new(dir.path().join("b"))));
    let summary = import_all(&mut target, &json, &mut CollisionAction::Skip).unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.imported(), 2);

    let original = source.list().unwrap();
    let imported = target.list().unwrap();
    let original_ids: Vec<_> = original.iter().map(|p| p.id.clone()).collect();
    assert!(imported.iter().all(|p| !original_ids.contains(&p.id)));
    assert_eq!(comparable(imported), comparable(original));
}

#[test]
fn test_import_collisions_follow_resolver() {
    let mut store = ProcessStore::new(Box::new(MemoryBackend::new()));
    let existing = store.save(&Process::new("Acme"), SaveMode::Update).unwrap();

    let json = serde_json::to_string(&vec![configured("ACME"), configured("acme")]).unwrap();

    let summary = import_all(&mut store, &json, &mut CollisionAction::Rename).unwrap();
    assert_eq!(summary.renamed, 2);
    let mut names: Vec<_> = store.list().unwrap().into_iter().map(|p| p.company_name).collect();
    names.sort();
    assert_eq!(names, vec!["ACME (2)", "Acme", "acme (3)"]);

    let summary = import_all(&mut store, &json, &mut CollisionAction::Skip).unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(store.list().unwrap().len(), 3);

    let single = serde_json::to_string(&vec![configured("Acme")]).unwrap();
    let summary = import_all(&mut store, &single, &mut CollisionAction::Overwrite).unwrap();
    assert_eq!(summary.overwritten, 1);
    let id = existing.id.unwrap();
    assert_eq!(store.get(&id).unwrap().entity, "ENT");
}

/// Answers from a script, recording how often it was asked.
struct Scripted {
    answers: Vec<CollisionDecision>,
    asked: usize,
}

impl CollisionResolver for Scripted {
    fn resolve(&mut self, _incoming: &Process, _existing: &Process) -> CollisionDecision {
        let answer = self.answers[self.asked.min(self.answers.len() - 1)];
        self.asked += 1;
        answer
    }
}

#[test]
fn test_apply_to_all_stops_asking() {
    let mut store = ProcessStore::new(Box::new(MemoryBackend::new()));
    for name in ["Acme", "Globex", "Initech"] {
        store.save(&Process::new(name), SaveMode::Update).unwrap();
    }
    let json = serde_json::to_string(&vec![
        configured("Acme"),
        configured("Globex"),
        configured("Initech"),
        configured("Umbrella"),
    ])
    .unwrap();

    let mut resolver = Scripted {
        answers: vec![
            CollisionDecision::once(CollisionAction::Overwrite),
            CollisionDecision::always(CollisionAction::Skip),
        ],
        asked: 0,
    };
    let summary = import_all(&mut store, &json, &mut resolver).unwrap();
    assert_eq!(resolver.asked, 2);
    assert_eq!(summary.overwritten, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.created, 1);
}

#[test]
fn test_resolve_company_through_store() {
    let dir = tempdir().unwrap();
    let mut store = ProcessStore::new(Box::new(JsonDirBackend::new(dir.path())));
    let saved = store.save(&configured("Technip Energies"), SaveMode::Update).unwrap();
    store.link_company(saved.id.as_ref().unwrap(), "TechnipFMC").unwrap();

    let found = store.resolve_company("technipfmc").unwrap().unwrap();
    assert_eq!(found.kind, ResolutionKind::Linked);
    assert_eq!(found.process.id, saved.id);
    assert!(store.resolve_company("Unknown Company").unwrap().is_none());
}
