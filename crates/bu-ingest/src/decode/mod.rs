//! Turning source files into raw cell grids.
//!
//! Decoding never assumes a header row: the output is a [`RawTable`] whose
//! rows are trimmed cell strings, possibly ragged. Which row holds headers
//! is decided later by the row configurator.

mod delimited;
mod pdf;
mod spreadsheet;

use std::path::{Path, PathBuf};

use bu_model::RawTable;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

pub use delimited::{read_delimited, sniff_delimiter};
pub use pdf::{PdfEngine, TEMPLATE_HEADERS};

/// Maximum accepted input size (50 MB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Source formats the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Delimited text; the delimiter is sniffed from the content.
    Delimited,
    /// Tab-separated text.
    Tsv,
    /// Any workbook format calamine reads.
    Spreadsheet,
    Pdf,
}

impl FileKind {
    /// Classify a file by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Ok(Self::Delimited),
            "tsv" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            "pdf" => Ok(Self::Pdf),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Check file size before loading.
pub fn check_file_size(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    ensure_size(path, metadata.len())
}

fn ensure_size(path: &Path, size: u64) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

/// Decode a file from disk into raw rows.
pub fn decode_file(path: &Path) -> Result<RawTable> {
    let kind = FileKind::from_path(path)?;
    check_file_size(path)?;
    let bytes = std::fs::read(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    decode_kind(path, kind, bytes)
}

/// Decode in-memory file contents; `file_name` selects the format.
pub fn decode_bytes(file_name: &str, bytes: Vec<u8>) -> Result<RawTable> {
    let path = PathBuf::from(file_name);
    let kind = FileKind::from_path(&path)?;
    ensure_size(&path, bytes.len() as u64)?;
    decode_kind(&path, kind, bytes)
}

fn decode_kind(path: &Path, kind: FileKind, bytes: Vec<u8>) -> Result<RawTable> {
    debug!(path = %path.display(), ?kind, bytes = bytes.len(), "decoding file");
    let mut rows = match kind {
        FileKind::Delimited => {
            let delimiter = sniff_delimiter(&bytes);
            read_delimited(path, &bytes, delimiter)?
        }
        FileKind::Tsv => read_delimited(path, &bytes, b'\t')?,
        FileKind::Spreadsheet => spreadsheet::read_first_sheet(path, bytes)?,
        FileKind::Pdf => PdfEngine::ensure_loaded().decode(path, &bytes)?,
    };
    trim_trailing_empty_rows(&mut rows);
    if rows.is_empty() {
        return Err(IngestError::EmptyFile {
            path: path.to_path_buf(),
        });
    }
    let table = RawTable::new(rows);
    info!(
        path = %path.display(),
        rows = table.len(),
        width = table.max_width(),
        "decoded file"
    );
    Ok(table)
}

pub(crate) fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

fn trim_trailing_empty_rows(rows: &mut Vec<Vec<String>>) {
    while rows
        .last()
        .is_some_and(|row| row.iter().all(|cell| cell.trim().is_empty()))
    {
        rows.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(
            FileKind::from_path(Path::new("Staff.XLSX")).unwrap(),
            FileKind::Spreadsheet
        );
        assert_eq!(
            FileKind::from_path(Path::new("a.tsv")).unwrap(),
            FileKind::Tsv
        );
        assert!(matches!(
            FileKind::from_path(Path::new("notes.docx")),
            Err(IngestError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn rejects_oversized_input() {
        let err = ensure_size(Path::new("big.csv"), MAX_FILE_SIZE + 1).unwrap_err();
        assert!(matches!(err, IngestError::FileTooLarge { .. }));
    }

    #[test]
    fn drops_trailing_blank_rows_only() {
        let mut rows = vec![
            vec![String::new()],
            vec!["a".to_string()],
            vec![String::new(), " ".to_string()],
        ];
        trim_trailing_empty_rows(&mut rows);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn decodes_csv_bytes() {
        let table = decode_bytes("staff.csv", b"Name,Email\nAnn,ann@x.com\n\n".to_vec()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), "ann@x.com");
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = decode_bytes("empty.csv", Vec::new()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyFile { .. }));
    }
}
