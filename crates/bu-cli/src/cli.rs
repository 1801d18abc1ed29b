//! CLI argument definitions for `bupload`.

use std::path::PathBuf;

use bu_map::CellRef;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bupload",
    version,
    about = "Map benefit applicant files into upload CSVs",
    long_about = "Map employer applicant exports (CSV, Excel, PDF) into the 13-column \
                  benefit upload format.\n\n\
                  Saved processes remember each company's column mapping; duplicate \
                  checks compare a file against a previous upload."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow applicant names, emails, and amounts in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Settings file (default: platform config folder).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show how a file decodes and what the mapper would suggest.
    Inspect(InspectArgs),

    /// Map files into upload CSVs.
    Run(RunArgs),

    /// Manage saved processes.
    #[command(subcommand)]
    Process(ProcessCommand),

    /// Compare a file against a previous upload.
    Duplicates(DuplicatesArgs),

    /// Find listed employees across batch files.
    Lookup(LookupArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// First data row (1-indexed); detected when omitted.
    #[arg(long = "start-row", value_name = "ROW")]
    pub start_row: Option<usize>,

    /// Title cell holding the company and entity, e.g. `A1`.
    #[arg(long = "entity-cell", value_name = "CELL")]
    pub entity_cell: Option<CellRef>,
}

#[derive(Args)]
pub struct RunArgs {
    /// Applicant files to map.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Process id to use instead of resolving from the filename.
    #[arg(long = "process", value_name = "ID")]
    pub process: Option<String>,

    /// First data row (1-indexed); the header is the row above.
    #[arg(long = "start-row", value_name = "ROW")]
    pub start_row: Option<usize>,

    /// Last data row (1-indexed, inclusive).
    #[arg(long = "end-row", value_name = "ROW")]
    pub end_row: Option<usize>,

    /// Column to filter by date.
    #[arg(long = "date-column", value_name = "COLUMN")]
    pub date_column: Option<String>,

    /// Earliest date kept (YYYY-MM-DD).
    #[arg(long = "from", value_name = "DATE", requires = "date_column")]
    pub from: Option<NaiveDate>,

    /// Latest date kept (YYYY-MM-DD).
    #[arg(long = "to", value_name = "DATE", requires = "date_column")]
    pub to: Option<NaiveDate>,

    /// Previous upload to remove duplicates against.
    #[arg(long = "previous", value_name = "FILE")]
    pub previous: Option<PathBuf>,

    /// Also remove potential duplicates (different LOC amount).
    #[arg(long = "exclude-potential", requires = "previous")]
    pub exclude_potential: bool,

    /// Also write the SFTP variant.
    #[arg(long = "sftp")]
    pub sftp: bool,

    /// Also write the personal-group tracking file.
    #[arg(long = "personal-group")]
    pub personal_group: bool,

    /// Output directory (default: settings, then the current directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Upload date used in file names (default: today).
    #[arg(long = "date", value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Map and report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum ProcessCommand {
    /// List saved processes.
    List,

    /// Print a process as JSON.
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a process.
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Export every process as a JSON envelope.
    Export {
        /// Write to a file instead of stdout.
        #[arg(long = "output", value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Import processes from an export file.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// What to do when a company name already exists.
        #[arg(long = "on-conflict", value_enum, default_value = "ask")]
        on_conflict: ConflictArg,
    },

    /// Save a process from a JSON file.
    Save {
        #[arg(value_name = "JSON")]
        file: PathBuf,

        /// Save as a new process even when the file carries an id.
        #[arg(long = "as-new")]
        as_new: bool,
    },

    /// Link an alternate company name to a process.
    Link {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(value_name = "COMPANY")]
        company: String,
    },

    /// Suggest a process from a file's headers.
    Suggest {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// First data row (1-indexed); detected when omitted.
        #[arg(long = "start-row", value_name = "ROW")]
        start_row: Option<usize>,

        /// Company name (default: taken from the filename).
        #[arg(long = "company", value_name = "NAME")]
        company: Option<String>,

        /// Save the suggestion as a new process.
        #[arg(long = "save")]
        save: bool,
    },
}

#[derive(Args)]
pub struct DuplicatesArgs {
    #[arg(value_name = "CURRENT")]
    pub current: PathBuf,

    #[arg(value_name = "PREVIOUS")]
    pub previous: PathBuf,

    /// Write the de-duplicated current file to this path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also remove potential duplicates when writing `--output`.
    #[arg(long = "exclude-potential", requires = "output")]
    pub exclude_potential: bool,
}

#[derive(Args)]
pub struct LookupArgs {
    /// Employee list: `first,last,amount` lines, or an invoice with `--invoice`.
    #[arg(long = "employees", value_name = "FILE")]
    pub employees: PathBuf,

    /// Read employees from an invoice table.
    #[arg(long = "invoice")]
    pub invoice: bool,

    /// Batch files to search, in order.
    #[arg(long = "batch", value_name = "FILE", required = true)]
    pub batches: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConflictArg {
    Overwrite,
    Rename,
    Skip,
    /// Prompt on stdin for each collision.
    Ask,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
