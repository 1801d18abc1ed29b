use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use tracing::{error, info, info_span, warn};

use bu_ingest::{DateRange, FileKind, configure, detect_date_columns, detect_first_data_row};
use bu_map::{EntityInfo, extract_from_cell, extract_from_filename, suggest_fields};
use bu_match::{
    BatchColumns, DuplicateOptions, DuplicateReview, LookupSession, find_duplicates,
    parse_invoice_employees, parse_manual_employees,
};
use bu_model::{DataConfig, Process, ProcessId};
use bu_output::render_dataset;
use bu_store::{
    CollisionAction, CollisionDecision, CollisionResolver, JsonDirBackend, MemoryBackend,
    ProcessStore, SaveMode, export_all, import_all,
};

use bu_cli::pipeline::{
    DateFilter, FileReport, RunOptions, choose_data_config, load_dataset, load_raw, run_file,
    suggested_process,
};
use bu_cli::settings::Settings;

use crate::cli::{ConflictArg, DuplicatesArgs, InspectArgs, LookupArgs, ProcessCommand, RunArgs};
use crate::summary::{
    print_duplicates, print_import_summary, print_lookup, print_processes, print_run_summary,
    print_suggestions,
};

/// Files that mapped, and files that failed with their error.
pub struct RunResult {
    pub reports: Vec<FileReport>,
    pub failures: Vec<(String, String)>,
}

impl RunResult {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// JSON directory store with a session-local fallback.
pub fn open_store(settings: &Settings) -> ProcessStore {
    let dir = settings.store_dir();
    info!(dir = %dir.display(), "opening process store");
    ProcessStore::new(Box::new(JsonDirBackend::new(dir))).with_fallback(Box::new(MemoryBackend::new()))
}

fn duplicate_options(settings: &Settings) -> DuplicateOptions {
    DuplicateOptions {
        extra_common_words: settings.matching.extra_common_words.clone(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let name = display_name(&args.file);
    let kind = FileKind::from_path(&args.file)?;
    let raw = load_raw(&args.file)?;
    let config = choose_data_config(&raw, args.start_row, None, None);
    let dataset =
        configure(&raw, &config).with_context(|| format!("configure rows of {name}"))?;

    println!("File: {name} ({kind:?})");
    println!("Raw rows: {}  Widest row: {}", raw.len(), raw.max_width());
    println!(
        "Detected first data row: {}",
        detect_first_data_row(&raw.rows)
    );
    println!(
        "Header row: {}  Data rows: {}",
        config.header_row,
        dataset.row_count()
    );
    println!("Columns: {}", dataset.columns().join(" | "));
    let dates = detect_date_columns(&dataset);
    if !dates.is_empty() {
        println!("Date columns: {}", dates.join(", "));
    }

    let entity = match args.entity_cell {
        Some(cell) => extract_from_cell(&raw, cell).unwrap_or_else(|| {
            warn!(row = cell.row, column = cell.column, "entity cell is empty");
            extract_from_filename(&name)
        }),
        None => extract_from_filename(&name),
    };
    print_entity(&entity);
    print_suggestions(&suggest_fields(dataset.columns()));
    Ok(())
}

fn print_entity(entity: &EntityInfo) {
    match &entity.entity {
        Some(code) => println!("Company: {}  Entity: {code}", entity.company),
        None => println!("Company: {}", entity.company),
    }
}

pub fn run_upload(args: &RunArgs, settings: &Settings) -> Result<RunResult> {
    let span = info_span!("run", files = args.files.len());
    let _guard = span.enter();

    let process = args
        .process
        .as_deref()
        .map(ProcessId::new)
        .transpose()
        .context("invalid --process id")?;
    let date_filter = args.date_column.clone().map(|column| DateFilter {
        column,
        range: DateRange {
            from: args.from,
            to: args.to,
        },
    });
    let options = RunOptions {
        process,
        start_row: args.start_row,
        end_row: args.end_row,
        date_filter,
        previous: args.previous.clone(),
        exclude_potential: args.exclude_potential,
        sftp: args.sftp,
        personal_group: args.personal_group,
        output_dir: settings.output_dir(args.output_dir.as_deref()),
        dry_run: args.dry_run,
        duplicate_options: duplicate_options(settings),
        upload_date: args.date.unwrap_or_else(|| Local::now().date_naive()),
    };

    let store = open_store(settings);
    let mut result = RunResult {
        reports: Vec::new(),
        failures: Vec::new(),
    };
    for file in &args.files {
        match run_file(file, &store, &options) {
            Ok(report) => {
                info!(
                    file = %display_name(file),
                    rows = report.outcome.rows.len(),
                    invalid = report.outcome.invalid_row_count(),
                    "file mapped"
                );
                result.reports.push(report);
            }
            Err(err) => {
                error!(file = %display_name(file), error = %format!("{err:#}"), "file failed");
                result.failures.push((display_name(file), format!("{err:#}")));
            }
        }
    }
    print_run_summary(&result.reports, &result.failures);
    Ok(result)
}

pub fn run_process(command: &ProcessCommand, settings: &Settings) -> Result<()> {
    let mut store = open_store(settings);
    match command {
        ProcessCommand::List => {
            let mut processes = store.list().context("list processes")?;
            processes.sort_by(|a, b| a.label().to_lowercase().cmp(&b.label().to_lowercase()));
            print_processes(&processes);
        }
        ProcessCommand::Show { id } => {
            let process = store.get(&ProcessId::new(id.as_str())?)?;
            println!("{}", serde_json::to_string_pretty(&process)?);
        }
        ProcessCommand::Delete { id } => {
            let id = ProcessId::new(id.as_str())?;
            store.delete(&id).with_context(|| format!("delete process {id}"))?;
            println!("Deleted {id}");
        }
        ProcessCommand::Export { output } => {
            let json = export_all(&store).context("export processes")?;
            match output {
                Some(path) => {
                    fs::write(path, json)
                        .with_context(|| format!("write {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        ProcessCommand::Import { file, on_conflict } => {
            let json = fs::read_to_string(file)
                .with_context(|| format!("read {}", file.display()))?;
            let summary = match on_conflict {
                ConflictArg::Overwrite => {
                    import_all(&mut store, &json, &mut CollisionAction::Overwrite)
                }
                ConflictArg::Rename => import_all(&mut store, &json, &mut CollisionAction::Rename),
                ConflictArg::Skip => import_all(&mut store, &json, &mut CollisionAction::Skip),
                ConflictArg::Ask => {
                    let stdin = io::stdin();
                    import_all(&mut store, &json, &mut PromptResolver::new(stdin.lock()))
                }
            }
            .with_context(|| format!("import {}", file.display()))?;
            print_import_summary(&summary);
        }
        ProcessCommand::Save { file, as_new } => {
            let json = fs::read_to_string(file)
                .with_context(|| format!("read {}", file.display()))?;
            let process: Process = serde_json::from_str(&json)
                .with_context(|| format!("parse process {}", file.display()))?;
            let mode = if *as_new {
                SaveMode::SaveAsNew
            } else {
                SaveMode::Update
            };
            let saved = store.save(&process, mode)?;
            print_saved(&saved);
        }
        ProcessCommand::Link { id, company } => {
            let id = ProcessId::new(id.as_str())?;
            if store.link_company(&id, company)? {
                println!("Linked '{company}' to {id}");
            } else {
                println!("'{company}' was already linked to {id}");
            }
        }
        ProcessCommand::Suggest {
            file,
            start_row,
            company,
            save,
        } => {
            let raw = load_raw(file)?;
            let config = choose_data_config(&raw, *start_row, None, None);
            let dataset = configure(&raw, &config)
                .with_context(|| format!("configure rows of {}", file.display()))?;
            let mut entity = extract_from_filename(&display_name(file));
            if let Some(company) = company {
                entity.company = company.clone();
            }
            if entity.is_unknown() && *save {
                bail!("no company in the filename; pass --company");
            }
            print_entity(&entity);
            print_suggestions(&suggest_fields(dataset.columns()));

            if *save {
                let mut process = suggested_process(&entity, dataset.columns());
                process.data_config = Some(DataConfig::new(config.start_row, None));
                let saved = store.save(&process, SaveMode::SaveAsNew)?;
                print_saved(&saved);
            }
        }
    }
    Ok(())
}

fn print_saved(process: &Process) {
    match &process.id {
        Some(id) => println!("Saved '{}' as {id}", process.label()),
        None => println!("Saved '{}'", process.label()),
    }
}

/// Asks on stderr/stdin how to handle each import collision.
///
/// `o`, `r`, `s` choose overwrite, rename, skip; the uppercase letter applies
/// the choice to every later collision. End of input skips.
struct PromptResolver<R> {
    input: R,
}

impl<R: BufRead> PromptResolver<R> {
    fn new(input: R) -> Self {
        Self { input }
    }

    fn ask(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead> CollisionResolver for PromptResolver<R> {
    fn resolve(&mut self, incoming: &Process, existing: &Process) -> CollisionDecision {
        loop {
            eprint!(
                "'{}' already exists as '{}'. [o]verwrite, [r]ename, [s]kip (uppercase = all): ",
                incoming.company_name,
                existing.label()
            );
            let _ = io::stderr().flush();
            let Some(answer) = self.ask() else {
                return CollisionDecision::once(CollisionAction::Skip);
            };
            let apply_to_all = answer.chars().next().is_some_and(char::is_uppercase);
            let action = match answer.to_lowercase().as_str() {
                "o" | "overwrite" => CollisionAction::Overwrite,
                "r" | "rename" => CollisionAction::Rename,
                "s" | "skip" => CollisionAction::Skip,
                _ => continue,
            };
            return CollisionDecision {
                action,
                apply_to_all,
            };
        }
    }
}

pub fn run_duplicates(args: &DuplicatesArgs, settings: &Settings) -> Result<()> {
    let span = info_span!("duplicates", current = %display_name(&args.current));
    let _guard = span.enter();

    let current = load_dataset(&args.current, None)?;
    let previous = load_dataset(&args.previous, None)?;
    let report = find_duplicates(&current, &previous, &duplicate_options(settings));
    print_duplicates(&report);

    if let Some(output) = &args.output {
        let mut review = DuplicateReview::new(report);
        if args.exclude_potential {
            review.exclude_all_potential();
        }
        let kept = review.apply(&current);
        fs::write(output, render_dataset(&kept)?)
            .with_context(|| format!("write {}", output.display()))?;
        println!(
            "Removed {} rows; wrote {} rows to {}",
            current.row_count() - kept.row_count(),
            kept.row_count(),
            output.display()
        );
    }
    Ok(())
}

pub fn run_lookup(args: &LookupArgs) -> Result<()> {
    let employees = if args.invoice {
        let raw = load_raw(&args.employees)?;
        parse_invoice_employees(&raw)
            .with_context(|| format!("read invoice {}", args.employees.display()))?
    } else {
        let text = fs::read_to_string(&args.employees)
            .with_context(|| format!("read {}", args.employees.display()))?;
        parse_manual_employees(&text)?
    };
    if employees.is_empty() {
        bail!("no employees found in {}", args.employees.display());
    }

    let mut session = LookupSession::new(employees);
    for batch in &args.batches {
        if session.is_complete() {
            break;
        }
        let name = display_name(batch);
        let dataset = load_dataset(batch, None)?;
        let columns = BatchColumns::auto_assign(&name, dataset.columns())
            .with_context(|| format!("assign columns for {name}"))?;
        let found = session.search(&name, &dataset, &columns)?;
        info!(batch = %name, found, "batch searched");
    }
    print_lookup(&session);
    Ok(())
}
