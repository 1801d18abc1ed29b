//! Employee lists for lookup: invoice tables and typed lines.

use bu_map::parse_loc_amount;
use bu_model::RawTable;
use tracing::{debug, info};

use crate::error::{MatchError, Result};
use crate::lookup::Employee;

/// Description words that are never part of a name.
const DESCRIPTION_STOPWORDS: &[&str] = &[
    "bike", "bikes", "cycle", "cycles", "scheme", "voucher", "certificate", "hire", "agreement",
    "salary", "sacrifice", "package", "order", "for", "the", "and", "of", "to", "ref",
    "reference", "employee", "mr", "mrs", "ms", "miss", "dr", "accessories", "ebike", "electric",
    "loc", "gbp",
];

fn header_position(row: &[String], needle: &str) -> Option<usize> {
    row.iter()
        .position(|cell| cell.to_lowercase().contains(needle))
}

fn is_total_row(row: &[String]) -> bool {
    row.iter().any(|cell| {
        let lower = cell.trim().to_lowercase();
        lower.starts_with("total") || lower.starts_with("subtotal") || lower.starts_with("sub total")
    })
}

fn name_tokens(description: &str) -> Vec<&str> {
    description
        .split(|ch: char| !(ch.is_alphabetic() || ch == '\'' || ch == '-'))
        .map(|token| token.trim_matches(['\'', '-']))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| token.chars().all(|ch| ch.is_alphabetic() || ch == '\'' || ch == '-'))
        .filter(|token| !DESCRIPTION_STOPWORDS.contains(&token.to_lowercase().as_str()))
        .collect()
}

/// Employees listed on an invoice table.
///
/// The header row is the first row with a "Description" cell and a
/// "Net Price" cell. Each following row contributes the first alphabetic
/// description token as first name, the remaining tokens as last name, and
/// the net price as LOC amount. Rows without a name or price are skipped; a total row ends
/// the table.
pub fn parse_invoice_employees(raw: &RawTable) -> Result<Vec<Employee>> {
    let (header, description, price) = raw
        .rows
        .iter()
        .enumerate()
        .find_map(|(index, row)| {
            Some((
                index,
                header_position(row, "description")?,
                header_position(row, "net price")?,
            ))
        })
        .ok_or(MatchError::InvoiceHeaderNotFound)?;

    let mut employees = Vec::new();
    for row in raw.rows.iter().skip(header + 1) {
        if is_total_row(row) {
            break;
        }
        let text = row.get(description).map_or("", String::as_str);
        let tokens = name_tokens(text);
        let Some((first, rest)) = tokens.split_first() else {
            continue;
        };
        let Some(loc) = row.get(price).and_then(|cell| parse_loc_amount(cell)) else {
            debug!("invoice row without a net price skipped");
            continue;
        };
        employees.push(Employee::new(*first, rest.join(" "), loc));
    }
    info!(employees = employees.len(), "invoice parsed");
    Ok(employees)
}

/// Employees typed one per line as `First Last, 123.45`.
///
/// The amount follows the first comma or tab, or else the last space, so
/// `Anna Smith, £1,250` reads as 1250. A single name is taken as the first
/// name; every word after the first belongs to the last name. Blank lines
/// are ignored.
pub fn parse_manual_employees(text: &str) -> Result<Vec<Employee>> {
    let mut employees = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let invalid = || MatchError::InvalidEmployeeLine {
            line: index + 1,
            text: trimmed.to_string(),
        };
        let (name, amount) = trimmed
            .split_once([',', '\t'])
            .or_else(|| trimmed.rsplit_once(char::is_whitespace))
            .ok_or_else(invalid)?;
        let loc = parse_loc_amount(amount).ok_or_else(invalid)?;
        let parts: Vec<&str> = name.split_whitespace().collect();
        let employee = match parts.as_slice() {
            [] => return Err(invalid()),
            [only] => Employee::new(*only, "", loc),
            [first, rest @ ..] => Employee::new(*first, rest.join(" "), loc),
        };
        employees.push(employee);
    }
    Ok(employees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn parses_invoice_rows_until_total() {
        let raw = table(&[
            &["Invoice 1234", ""],
            &["Qty", "Description", "Unit", "Net Price"],
            &["1", "Cycle scheme voucher - Anna Smith", "1", "£1,250.00"],
            &["1", "Bike for O'Neil", "1", "499"],
            &["1", "Voucher Jo van der Berg", "1", "300"],
            &["1", "Delivery", "1", ""],
            &["", "Total", "", "2049.00"],
            &["1", "Late Entry", "1", "10"],
        ]);
        let employees = parse_invoice_employees(&raw).unwrap();
        assert_eq!(
            employees,
            vec![
                Employee::new("Anna", "Smith", 1250.0),
                Employee::new("O'Neil", "", 499.0),
                Employee::new("Jo", "van der Berg", 300.0),
            ]
        );
    }

    #[test]
    fn invoice_without_header_is_an_error() {
        let raw = table(&[&["Name", "Amount"]]);
        assert_eq!(parse_invoice_employees(&raw), Err(MatchError::InvoiceHeaderNotFound));
    }

    #[test]
    fn parses_manual_lines() {
        let employees =
            parse_manual_employees("Anna Smith, 1250\n\nJo Van Dyke\t£300.50\nPatel 99").unwrap();
        assert_eq!(
            employees,
            vec![
                Employee::new("Anna", "Smith", 1250.0),
                Employee::new("Jo", "Van Dyke", 300.5),
                Employee::new("Patel", "", 99.0),
            ]
        );
    }

    #[test]
    fn manual_line_without_amount_is_rejected() {
        let err = parse_manual_employees("Anna Smith, n/a").unwrap_err();
        assert_eq!(
            err,
            MatchError::InvalidEmployeeLine {
                line: 1,
                text: "Anna Smith, n/a".to_string(),
            }
        );
    }
}
