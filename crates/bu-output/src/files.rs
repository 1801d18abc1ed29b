//! Output file names and writing.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::{OutputError, Result};
use crate::render::short_date;

/// Company name made safe for use in a file name.
fn file_safe(company: &str) -> String {
    let cleaned: String = company
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => ' ',
            ch if ch.is_control() => ' ',
            ch => ch,
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `{company} {DD.MM.YY}.csv`
pub fn standard_filename(company: &str, date: NaiveDate) -> String {
    format!("{} {}.csv", file_safe(company), short_date(date))
}

/// `{company} SFTP {DD.MM.YY}.csv`
pub fn sftp_filename(company: &str, date: NaiveDate) -> String {
    format!("{} SFTP {}.csv", file_safe(company), short_date(date))
}

/// `Uploaded {company} {DD.MM.YY}.csv`
pub fn personal_group_filename(company: &str, date: NaiveDate) -> String {
    format!("Uploaded {} {}.csv", file_safe(company), short_date(date))
}

/// Write `contents` to `dir/name` through a temp file and a rename.
pub fn write_output(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(OutputError::InvalidFileName(name.to_string()));
    }
    fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        operation: "create directory",
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(name);
    let temp_path = dir.join(format!(".{name}.tmp"));
    let io = |operation: &'static str, source: std::io::Error| OutputError::Io {
        operation,
        path: temp_path.clone(),
        source,
    };
    let mut file = File::create(&temp_path).map_err(|e| io("create", e))?;
    file.write_all(contents.as_bytes()).map_err(|e| io("write", e))?;
    file.sync_all().map_err(|e| io("sync", e))?;

    fs::rename(&temp_path, &path).map_err(|source| OutputError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(path)
}
