//! The per-file upload pipeline.
//!
//! decode → configure → resolve process → date filter → duplicate removal →
//! map → render → write. Each stage logs its counts; applicant values only
//! pass through [`redact_value`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bu_ingest::{DateRange, configure, decode_file, detect_first_data_row, filter_by_date_range};
use bu_map::{
    EntityInfo, MappingContext, MappingOutcome, apply_mapping, extract_from_filename,
    suggested_mapping,
};
use bu_match::{DuplicateOptions, DuplicateReview, find_duplicates};
use bu_model::{DataConfig, Dataset, OutputColumn, Process, ProcessId, RawTable};
use bu_output::{
    personal_group_filename, render_personal_group, render_sftp, render_standard, sftp_filename,
    standard_filename, write_output,
};
use bu_store::{ProcessStore, ResolutionKind};
use chrono::NaiveDate;
use tracing::{info, info_span, trace, warn};

use crate::logging::redact_value;

/// Date column filter for a run.
#[derive(Debug, Clone)]
pub struct DateFilter {
    pub column: String,
    pub range: DateRange,
}

/// Options shared by every file of a `run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub process: Option<ProcessId>,
    pub start_row: Option<usize>,
    pub end_row: Option<usize>,
    pub date_filter: Option<DateFilter>,
    pub previous: Option<PathBuf>,
    pub exclude_potential: bool,
    pub sftp: bool,
    pub personal_group: bool,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub duplicate_options: DuplicateOptions,
    pub upload_date: NaiveDate,
}

/// How the process for a file was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSource {
    /// Named with `--process`.
    Selected,
    /// Found from the filename's company.
    Resolved(ResolutionKind),
    /// No saved process; mapping suggested from headers.
    Suggested,
}

/// Duplicate check counts for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateSummary {
    pub confirmed: usize,
    pub potential: usize,
    pub excluded: usize,
    pub removed: usize,
}

/// Everything a run learned about one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: PathBuf,
    pub company: String,
    pub entity: String,
    pub process_label: String,
    pub process_source: ProcessSource,
    pub data_config: DataConfig,
    pub source_rows: usize,
    pub date_filtered: usize,
    pub duplicates: Option<DuplicateSummary>,
    pub outcome: MappingOutcome,
    pub written: Vec<PathBuf>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decode a file with its path in the error context.
pub fn load_raw(path: &Path) -> Result<RawTable> {
    decode_file(path).with_context(|| format!("decode {}", path.display()))
}

/// Row configuration for a file: explicit rows first, then the process's
/// remembered rows, then detection.
pub fn choose_data_config(
    raw: &RawTable,
    start_row: Option<usize>,
    end_row: Option<usize>,
    remembered: Option<&DataConfig>,
) -> DataConfig {
    match (start_row, remembered) {
        (Some(start), _) => DataConfig::new(start, end_row),
        (None, Some(remembered)) => {
            DataConfig::new(remembered.start_row, end_row.or(remembered.end_row))
        }
        (None, None) => DataConfig::new(detect_first_data_row(&raw.rows), end_row),
    }
}

/// Decode and configure a file using detection for the start row.
pub fn load_dataset(path: &Path, start_row: Option<usize>) -> Result<Dataset> {
    let raw = load_raw(path)?;
    let config = choose_data_config(&raw, start_row, None, None);
    configure(&raw, &config).with_context(|| format!("configure rows of {}", path.display()))
}

/// A process built from header suggestions, not saved.
pub fn suggested_process(entity: &EntityInfo, columns: &[String]) -> Process {
    let mut process = Process::new(entity.company.clone());
    process.entity = entity.entity.clone().unwrap_or_default();
    process.fields = suggested_mapping(columns);
    process
}

fn find_process(
    store: &ProcessStore,
    explicit: Option<&ProcessId>,
    entity: &EntityInfo,
) -> Result<Option<(Process, ProcessSource)>> {
    if let Some(id) = explicit {
        let process = store.get(id).with_context(|| format!("load process {id}"))?;
        return Ok(Some((process, ProcessSource::Selected)));
    }
    if entity.is_unknown() {
        return Ok(None);
    }
    let resolution = store
        .resolve_company(&entity.company)
        .context("resolve company")?;
    Ok(resolution.map(|found| (found.process, ProcessSource::Resolved(found.kind))))
}

fn remove_duplicates(
    current: &Dataset,
    previous_path: &Path,
    options: &RunOptions,
) -> Result<(Dataset, DuplicateSummary)> {
    let previous = load_dataset(previous_path, None)?;
    let report = find_duplicates(current, &previous, &options.duplicate_options);
    let mut review = DuplicateReview::new(report);
    if options.exclude_potential {
        review.exclude_all_potential();
    }
    let kept = review.apply(current);
    let summary = DuplicateSummary {
        confirmed: review.report().confirmed.len(),
        potential: review.report().potential.len(),
        excluded: if options.exclude_potential {
            review.report().potential.len()
        } else {
            0
        },
        removed: current.row_count() - kept.row_count(),
    };
    info!(
        confirmed = summary.confirmed,
        potential = summary.potential,
        removed = summary.removed,
        "duplicates removed"
    );
    Ok((kept, summary))
}

/// Run the full pipeline for one file.
pub fn run_file(path: &Path, store: &ProcessStore, options: &RunOptions) -> Result<FileReport> {
    let name = file_name(path);
    let span = info_span!("file", file = %name);
    let _guard = span.enter();

    let raw = load_raw(path)?;
    let entity = extract_from_filename(&name);
    let found = find_process(store, options.process.as_ref(), &entity)?;

    let remembered = found.as_ref().and_then(|(process, _)| process.data_config.as_ref());
    let data_config = choose_data_config(&raw, options.start_row, options.end_row, remembered);
    let configured = configure(&raw, &data_config)
        .with_context(|| format!("configure rows of {}", path.display()))?;
    let source_rows = configured.row_count();

    let (process, process_source) = match found {
        Some(found) => found,
        None => {
            warn!(company = %entity.company, "no saved process; using suggested mapping");
            (
                suggested_process(&entity, configured.columns()),
                ProcessSource::Suggested,
            )
        }
    };
    if process.fields.is_empty() {
        bail!("process '{}' maps no columns", process.label());
    }

    let dated = match &options.date_filter {
        Some(filter) => filter_by_date_range(&configured, &filter.column, filter.range)
            .with_context(|| format!("filter {} by date", path.display()))?,
        None => configured,
    };
    let date_filtered = source_rows - dated.row_count();

    let (deduplicated, duplicates) = match &options.previous {
        Some(previous) => {
            let (kept, summary) = remove_duplicates(&dated, previous, options)?;
            (kept, Some(summary))
        }
        None => (dated.clone(), None),
    };

    let entity_code = if process.entity.trim().is_empty() {
        entity.entity.clone().unwrap_or_default()
    } else {
        process.entity.clone()
    };
    let context = MappingContext::new(process.company_name.clone(), entity_code.clone());
    let outcome = apply_mapping(&deduplicated, &process, &context)
        .with_context(|| format!("map {} with process '{}'", name, process.label()))?;
    for (index, row) in outcome.rows.iter().enumerate() {
        trace!(
            row = index + 1,
            firstname = redact_value(row.get(OutputColumn::Firstname)),
            email = redact_value(row.get(OutputColumn::Email)),
            loc = redact_value(row.get(OutputColumn::LocAmount)),
            "output row"
        );
    }

    let company = process.company_name.clone();
    let mut files = vec![(
        standard_filename(&company, options.upload_date),
        render_standard(&outcome.rows)?,
    )];
    if options.sftp {
        files.push((
            sftp_filename(&company, options.upload_date),
            render_sftp(&outcome.rows, &company)?,
        ));
    }
    if options.personal_group {
        match process.fields.get(OutputColumn::Email) {
            Some(email_column) => files.push((
                personal_group_filename(&company, options.upload_date),
                render_personal_group(&dated, email_column, &outcome.rows, options.upload_date)?,
            )),
            None => warn!("personal-group output needs a mapped Email column; skipped"),
        }
    }

    let mut written = Vec::new();
    if options.dry_run {
        info!(files = files.len(), "dry run; nothing written");
    } else {
        for (file_name, contents) in &files {
            written.push(write_output(&options.output_dir, file_name, contents)?);
        }
    }

    Ok(FileReport {
        file: path.to_path_buf(),
        company,
        entity: entity_code,
        process_label: process.label().to_string(),
        process_source,
        data_config,
        source_rows,
        date_filtered,
        duplicates,
        outcome,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_data_config_precedence() {
        let table = raw(&[
            &["Acme export"],
            &["First Name", "Surname", "Email"],
            &["Jane", "Doe", "jane@acme.com"],
        ]);
        let remembered = DataConfig::new(5, Some(9));

        assert_eq!(choose_data_config(&table, Some(4), None, Some(&remembered)), DataConfig::new(4, None));
        assert_eq!(choose_data_config(&table, None, None, Some(&remembered)), remembered);
        assert_eq!(
            choose_data_config(&table, None, Some(12), Some(&remembered)),
            DataConfig::new(5, Some(12))
        );
        assert_eq!(choose_data_config(&table, None, None, None), DataConfig::new(3, None));
    }
}
