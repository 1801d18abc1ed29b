//! Terminal tables for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use bu_cli::pipeline::{FileReport, ProcessSource};
use bu_map::FieldSuggestion;
use bu_match::{DuplicateMatch, DuplicateReport, LookupSession};
use bu_model::Process;
use bu_store::{ImportSummary, ResolutionKind};

/// Rows of the validation table before it is cut short.
const MAX_ISSUE_ROWS: usize = 50;

pub fn print_run_summary(reports: &[FileReport], failures: &[(String, String)]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Company"),
        header_cell("Process"),
        header_cell("Rows"),
        header_cell("Date filtered"),
        header_cell("Duplicates removed"),
        header_cell("LOC filtered"),
        header_cell("Output"),
        header_cell("Invalid rows"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..=8 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_output = 0usize;
    let mut total_invalid = 0usize;
    for report in reports {
        let output_rows = report.outcome.rows.len();
        let invalid = report.outcome.invalid_row_count();
        total_output += output_rows;
        total_invalid += invalid;
        table.add_row(vec![
            Cell::new(file_label(report)).fg(Color::Blue),
            Cell::new(&report.company),
            process_cell(report),
            Cell::new(report.source_rows),
            dim_zero_cell(report.date_filtered),
            match report.duplicates {
                Some(summary) => dim_zero_cell(summary.removed),
                None => dim_cell("-"),
            },
            dim_zero_cell(report.outcome.filtered),
            Cell::new(output_rows),
            count_cell(Some(invalid), Color::Yellow),
        ]);
    }
    if reports.len() > 1 {
        table.add_row(vec![
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            Cell::new(total_output).add_attribute(Attribute::Bold),
            count_cell(Some(total_invalid), Color::Yellow).add_attribute(Attribute::Bold),
        ]);
    }
    if !reports.is_empty() {
        println!("{table}");
    }

    for report in reports {
        for path in &report.written {
            println!("Wrote: {}", path.display());
        }
    }
    for report in reports {
        print_issue_table(report);
    }
    if !failures.is_empty() {
        eprintln!("Failed files:");
        for (file, error) in failures {
            eprintln!("- {file}: {error}");
        }
    }
}

fn file_label(report: &FileReport) -> String {
    report
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.file.display().to_string())
}

fn process_cell(report: &FileReport) -> Cell {
    match report.process_source {
        ProcessSource::Selected => Cell::new(&report.process_label),
        ProcessSource::Resolved(kind) => {
            let cell = Cell::new(format!(
                "{} ({})",
                report.process_label,
                resolution_label(kind)
            ));
            if kind == ResolutionKind::Fuzzy {
                cell.fg(Color::Yellow)
            } else {
                cell
            }
        }
        ProcessSource::Suggested => Cell::new("suggested").fg(Color::Yellow),
    }
}

fn resolution_label(kind: ResolutionKind) -> &'static str {
    match kind {
        ResolutionKind::Exact => "exact",
        ResolutionKind::Linked => "linked",
        ResolutionKind::DisplayName => "display name",
        ResolutionKind::Substring => "partial",
        ResolutionKind::Fuzzy => "fuzzy",
    }
}

fn print_issue_table(report: &FileReport) {
    let issues = &report.outcome.validation;
    if issues.is_empty() {
        return;
    }
    println!(
        "{}: {} rows need attention",
        file_label(report),
        report.outcome.invalid_row_count()
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Column"),
        header_cell("Issue"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for issue in issues.iter().take(MAX_ISSUE_ROWS) {
        table.add_row(vec![
            Cell::new(issue.row),
            Cell::new(issue.column.header()).fg(Color::Yellow),
            Cell::new(&issue.message),
        ]);
    }
    if issues.len() > MAX_ISSUE_ROWS {
        table.add_row(vec![
            dim_cell("…"),
            dim_cell("…"),
            dim_cell(format!("{} more", issues.len() - MAX_ISSUE_ROWS)),
        ]);
    }
    println!("{table}");
}

pub fn print_processes(processes: &[Process]) {
    if processes.is_empty() {
        println!("No saved processes.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Company"),
        header_cell("Entity"),
        header_cell("Fields"),
        header_cell("Linked"),
        header_cell("Updated"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    for process in processes {
        table.add_row(vec![
            match &process.id {
                Some(id) => dim_cell(id),
                None => dim_cell("-"),
            },
            Cell::new(process.label()).fg(Color::Blue),
            Cell::new(&process.company_name),
            Cell::new(&process.entity),
            Cell::new(process.fields.len()),
            Cell::new(process.linked_companies.join(", ")),
            match process.updated_at {
                Some(at) => Cell::new(at.format("%Y-%m-%d %H:%M")),
                None => dim_cell("-"),
            },
        ]);
    }
    println!("{table}");
}

pub fn print_import_summary(summary: &ImportSummary) {
    println!(
        "Imported {} processes ({} new, {} overwritten, {} renamed), skipped {}.",
        summary.imported(),
        summary.created,
        summary.overwritten,
        summary.renamed,
        summary.skipped
    );
}

pub fn print_suggestions(suggestions: &[FieldSuggestion]) {
    if suggestions.is_empty() {
        println!("No columns could be suggested.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Output column"),
        header_cell("Source column"),
        header_cell("Confidence"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for suggestion in suggestions {
        let confidence = Cell::new(format!("{:.0}%", suggestion.confidence * 100.0));
        table.add_row(vec![
            Cell::new(suggestion.column.header()).fg(Color::Cyan),
            Cell::new(&suggestion.source_column),
            if suggestion.confidence < 0.9 {
                confidence.fg(Color::Yellow)
            } else {
                confidence.fg(Color::Green)
            },
        ]);
    }
    println!("{table}");
}

pub fn print_duplicates(report: &DuplicateReport) {
    println!(
        "Confirmed: {}  Potential: {}  (pairs compared: {})",
        report.confirmed.len(),
        report.potential.len(),
        report.comparisons
    );
    if !report.confirmed.is_empty() {
        println!("Confirmed duplicates");
        println!("{}", duplicate_table(&report.confirmed, false));
    }
    if !report.potential.is_empty() {
        println!("Potential duplicates (LOC amount differs)");
        println!("{}", duplicate_table(&report.potential, true));
    }
}

fn duplicate_table(matches: &[DuplicateMatch], with_loc: bool) -> Table {
    let mut table = Table::new();
    let mut header = vec![
        header_cell("#"),
        header_cell("Current row"),
        header_cell("Previous row"),
        header_cell("Matched on"),
    ];
    if with_loc {
        header.push(header_cell("Current LOC"));
        header.push(header_cell("Previous LOC"));
    }
    table.set_header(header);
    apply_table_style(&mut table);
    for index in [0, 1, 2, 4, 5] {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (index, found) in matches.iter().enumerate() {
        let matched = found
            .matches
            .iter()
            .map(|m| {
                if m.current_column == m.previous_column {
                    format!("{}: {}", m.current_column, m.value)
                } else {
                    format!("{} / {}: {}", m.current_column, m.previous_column, m.value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let mut row = vec![
            dim_cell(index),
            Cell::new(found.current_row + 1),
            Cell::new(found.previous_row + 1),
            Cell::new(matched),
        ];
        if with_loc {
            row.push(loc_cell(found.current_loc));
            row.push(loc_cell(found.previous_loc));
        }
        table.add_row(row);
    }
    table
}

fn loc_cell(value: Option<f64>) -> Cell {
    match value {
        Some(amount) => Cell::new(format!("{amount:.2}")),
        None => dim_cell("-"),
    }
}

pub fn print_lookup(session: &LookupSession) {
    let found: Vec<_> = session.found().collect();
    if !found.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Employee"),
            header_cell("LOC"),
            header_cell("Batch"),
            header_cell("Row"),
            header_cell("Entity"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Right);
        align_column(&mut table, 3, CellAlignment::Right);
        for (employee, found) in found {
            table.add_row(vec![
                Cell::new(employee.display_name()),
                Cell::new(format!("{:.2}", employee.loc)),
                Cell::new(&found.batch).fg(Color::Blue),
                Cell::new(found.row + 1),
                Cell::new(&found.entity).fg(Color::Green),
            ]);
        }
        println!("Found");
        println!("{table}");
    }

    let missing: Vec<_> = session.missing().collect();
    if missing.is_empty() {
        println!("All {} employees found.", session.employees().len());
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Employee"), header_cell("LOC")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for employee in missing {
        table.add_row(vec![
            Cell::new(employee.display_name()).fg(Color::Red),
            Cell::new(format!("{:.2}", employee.loc)),
        ]);
    }
    println!("Not found");
    println!("{table}");
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(0) => dim_cell(0),
        Some(value) => Cell::new(value).fg(color),
        None => dim_cell("-"),
    }
}

fn dim_zero_cell(count: usize) -> Cell {
    if count == 0 {
        dim_cell(0)
    } else {
        Cell::new(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
