//! Snapshot tests for rendered CSV variants.

use bu_model::{Dataset, OutputColumn, OutputRow};
use bu_output::{render_personal_group, render_sftp, render_standard};
use chrono::NaiveDate;

fn output_row(first: &str, last: &str, amount: &str, email: &str, details: &str) -> OutputRow {
    let mut row = OutputRow::new();
    row.set(OutputColumn::Firstname, first);
    row.set(OutputColumn::Surname, last);
    row.set(OutputColumn::Street1, "1 High St, Flat 2");
    row.set(OutputColumn::Country, "UK");
    row.set(OutputColumn::LocAmount, amount);
    row.set(OutputColumn::Email, email);
    row.set(OutputColumn::PayFrequency, "Monthly");
    row.set(OutputColumn::AdditionalDetails, details);
    row
}

fn rows() -> Vec<OutputRow> {
    vec![
        output_row("Jane", "Doe", "1000.00", "jane@acme.com", "acme/PO-1"),
        output_row("Sean", "O'Neil", "250.50", "Sean@Acme.com", ""),
    ]
}

/// Snapshots are compared with LF endings; CRLF is checked separately.
fn lf(text: &str) -> String {
    assert!(text.lines().all(|line| line.ends_with('\r')));
    text.replace("\r\n", "\n")
}

#[test]
fn test_standard_output() {
    let text = render_standard(&rows()).unwrap();
    insta::assert_snapshot!(lf(&text), @r#"
    Firstname,Surname,Street1,Street2,City,County,Postcode,Country,LOC Amount,Email,Pay Frequency,Additional Details,Date of Approval
    Jane,Doe,"1 High St, Flat 2",,,,,UK,1000.00,jane@acme.com,Monthly,acme/PO-1,
    Sean,O'Neil,"1 High St, Flat 2",,,,,UK,250.50,Sean@Acme.com,Monthly,,
    "#);
}

#[test]
fn test_sftp_output() {
    let text = render_sftp(&rows(), "Acme Widgets").unwrap();
    insta::assert_snapshot!(lf(&text), @r#"
    Firstname,Surname,Street1,Street2,City,County,Postcode,Country,LOC Amount,Email,Pay Frequency,Additional Details,Date of Approval,AccountName,APT
    Jane,Doe,"1 High St, Flat 2",,,,,UK,1000.00,jane@acme.com,Monthly,,,Acme Widgets,
    Sean,O'Neil,"1 High St, Flat 2",,,,,UK,250.50,Sean@Acme.com,Monthly,,,Acme Widgets,
    "#);
}

#[test]
fn test_personal_group_output() {
    let source = Dataset::from_rows(
        &["Name", "Work Email", "Notes"],
        &[
            &["Jane Doe", "JANE@acme.com ", "first \"batch\""],
            &["Sam Roe", "sam@acme.com", ""],
            &["Sean O'Neil", "sean@acme.com", ""],
        ],
    )
    .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
    let text = render_personal_group(&source, "Work Email", &rows(), date).unwrap();
    insta::assert_snapshot!(lf(&text), @r#"
    Name,Work Email,Notes,LOC Upload Date
    Jane Doe,JANE@acme.com ,"first ""batch""",05.11.24
    Sam Roe,sam@acme.com,,
    Sean O'Neil,sean@acme.com,,05.11.24
    "#);
}
