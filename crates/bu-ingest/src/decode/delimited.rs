use std::path::Path;

use csv::ReaderBuilder;

use super::normalize_cell;
use crate::error::{IngestError, Result};

const CANDIDATES: [u8; 4] = [b'\t', b';', b'|', b','];

/// Guess the delimiter from the first non-empty line.
///
/// Delimiters inside double-quoted fields are ignored. The candidate with the
/// most occurrences wins; ties go to tab, then semicolon, then pipe. Text with
/// no candidate at all is read as comma-separated.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let Some(line) = bytes
        .split(|byte| *byte == b'\n')
        .find(|line| line.iter().any(|byte| !byte.is_ascii_whitespace()))
    else {
        return b',';
    };

    let mut counts = [0usize; CANDIDATES.len()];
    let mut in_quotes = false;
    for byte in line {
        if *byte == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(slot) = CANDIDATES.iter().position(|candidate| candidate == byte) {
            counts[slot] += 1;
        }
    }

    let mut best = (b',', 0usize);
    for (candidate, count) in CANDIDATES.iter().zip(counts) {
        if count > best.1 {
            best = (*candidate, count);
        }
    }
    best.0
}

/// Parse delimited text into raw rows.
///
/// Invalid UTF-8 is replaced rather than rejected so legacy exports still load.
pub fn read_delimited(path: &Path, bytes: &[u8], delimiter: u8) -> Result<Vec<Vec<String>>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let row: Vec<String> = record
            .iter()
            .map(|field| normalize_cell(&String::from_utf8_lossy(field)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter(b"a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter(b"a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter(b"a|b"), b'|');
        assert_eq!(sniff_delimiter(b"a,b"), b',');
        assert_eq!(sniff_delimiter(b"single"), b',');
    }

    #[test]
    fn ignores_delimiters_inside_quotes() {
        assert_eq!(sniff_delimiter(b"\"Smith; John\",x,y"), b',');
    }

    #[test]
    fn skips_leading_blank_lines_when_sniffing() {
        assert_eq!(sniff_delimiter(b"\n  \na;b"), b';');
    }

    #[test]
    fn reads_ragged_rows_and_strips_bom() {
        let rows = read_delimited(
            Path::new("x.csv"),
            b"\xEF\xBB\xBFName , Email\n Ann \nBob,bob@x.com,extra\n",
            b',',
        )
        .unwrap();
        assert_eq!(rows[0], vec!["Name", "Email"]);
        assert_eq!(rows[1], vec!["Ann"]);
        assert_eq!(rows[2].len(), 3);
    }

    #[test]
    fn replaces_invalid_utf8() {
        let rows = read_delimited(Path::new("x.csv"), b"caf\xE9,1\n", b',').unwrap();
        assert_eq!(rows[0][0], "caf\u{fffd}");
    }
}
