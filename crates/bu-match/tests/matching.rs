//! Integration tests for duplicate detection and entity lookup.

use bu_match::{
    BatchColumns, DuplicateKind, DuplicateOptions, DuplicateReview, Employee, LookupSession,
    find_duplicates, parse_manual_employees,
};
use bu_model::Dataset;
use proptest::prelude::*;

const HEADERS: &[&str] = &["First Name", "Surname", "Email", "LOC Amount", "Pay Frequency"];

fn current() -> Dataset {
    Dataset::from_rows(
        HEADERS,
        &[
            &["Jane", "Doe", "jane@acme.com", "1000", "Monthly"],
            &["John", "Smith", "john@acme.com", "1000.00", "Monthly"],
            &["Ann", "Lee", "ann@acme.com", "750", "Monthly"],
        ],
    )
    .unwrap()
}

fn previous() -> Dataset {
    Dataset::from_rows(
        &["Forename", "Last Name", "E-mail", "Voucher Amount", "Frequency"],
        &[
            &["JANE", "doe", "Jane@Acme.com", "999", "Monthly"],
            &["John", "Smith", "j.smith@other.com", "1200", "Monthly"],
            &["Bob", "Lee", "bob@acme.com", "750", "Monthly"],
        ],
    )
    .unwrap()
}

#[test]
fn test_confirmed_and_potential_duplicates() {
    let report = find_duplicates(&current(), &previous(), &DuplicateOptions::default());

    let confirmed: Vec<_> = report
        .confirmed
        .iter()
        .map(|m| (m.current_row, m.previous_row))
        .collect();
    assert_eq!(confirmed, vec![(0, 0)]);

    let potential: Vec<_> = report
        .potential
        .iter()
        .map(|m| (m.current_row, m.previous_row, m.current_loc, m.previous_loc))
        .collect();
    assert_eq!(potential, vec![(1, 1, Some(1000.0), Some(1200.0))]);
    assert!(report.potential.iter().all(|m| m.kind == DuplicateKind::Potential));
}

#[test]
fn test_surname_alone_is_not_a_duplicate() {
    let report = find_duplicates(&current(), &previous(), &DuplicateOptions::default());
    assert!(report.confirmed.iter().chain(&report.potential).all(|m| m.current_row != 2));
}

#[test]
fn test_first_name_equal_to_surname_is_not_a_duplicate() {
    let current = Dataset::from_rows(
        &["First Name", "Surname", "LOC Amount"],
        &[&["Jordan", "Smith", "1000.00"]],
    )
    .unwrap();
    let previous = Dataset::from_rows(
        &["First Name", "Surname", "LOC Amount"],
        &[&["Alex", "Jordan", "1000.00"]],
    )
    .unwrap();

    let report = find_duplicates(&current, &previous, &DuplicateOptions::default());
    assert!(report.confirmed.is_empty());
    assert!(report.potential.is_empty());
}

#[test]
fn test_excluding_potential_leaves_confirmed_untouched() {
    let current = current();
    let report = find_duplicates(&current, &previous(), &DuplicateOptions::default());
    let mut review = DuplicateReview::new(report);

    assert_eq!(review.apply(&current).row_count(), 2);

    assert!(review.exclude(0));
    assert!(!review.exclude(5));
    assert_eq!(review.report().confirmed.len(), 1);
    let kept = review.apply(&current);
    assert_eq!(kept.row_count(), 1);
    assert_eq!(kept.value(0, "First Name"), "Ann");

    assert!(review.include(0));
    assert_eq!(review.apply(&current).row_count(), 2);
}

#[test]
fn test_identical_rows_counted_once() {
    let current = Dataset::from_rows(
        HEADERS,
        &[
            &["Jane", "Doe", "jane@acme.com", "1000", "Monthly"],
            &["Jane", "Doe", "jane@acme.com", "1000", "Monthly"],
        ],
    )
    .unwrap();
    let report = find_duplicates(&current, &previous(), &DuplicateOptions::default());
    assert_eq!(report.confirmed.len(), 2);
    let review = DuplicateReview::new(report);
    assert_eq!(review.removal_count(&current), 1);
    assert!(review.apply(&current).is_empty());
}

#[test]
fn test_extra_common_words_suppress_matches() {
    let current = Dataset::from_rows(&["Team Name"], &[&["Head Office"]]).unwrap();
    let previous = Dataset::from_rows(&["Team Name"], &[&["Head Office"]]).unwrap();
    let options = DuplicateOptions {
        extra_common_words: vec!["head office".to_string(), "head".to_string(), "office".to_string()],
    };
    let report = find_duplicates(&current, &previous, &options);
    assert_eq!(report.comparisons, 0);
}

#[test]
fn test_lookup_session_is_cumulative() {
    let mut session = LookupSession::new(vec![
        Employee::new("Anna", "Smith", 1250.0),
        Employee::new("", "Patel", 300.0),
        Employee::new("Zoe", "Quinn", 80.0),
    ]);

    let first = Dataset::from_rows(
        &["First Name", "Surname", "LOC", "Company", "Site"],
        &[
            &["anna", "SMITH", "£1,250.00", "Acme", "North"],
            &["Raj", "Patel", "300", "Acme", ""],
        ],
    )
    .unwrap();
    let columns = BatchColumns::auto_assign("first.csv", first.columns()).unwrap();
    assert_eq!(session.search("first.csv", &first, &columns).unwrap(), 2);

    let found: Vec<_> = session
        .found()
        .map(|(employee, hit)| (employee.display_name(), hit.entity.clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("Anna Smith".to_string(), "Acme/North".to_string()),
            ("Patel".to_string(), "Acme".to_string()),
        ]
    );
    assert_eq!(session.search("first.csv", &first, &columns).unwrap(), 0);

    let second = Dataset::from_rows(
        &["First Name", "Surname", "LOC", "Company"],
        &[&["Zoe", "Quinn", "80.004", "Globex"], &["Anna", "Smith", "1250", "Globex"]],
    )
    .unwrap();
    let columns = BatchColumns::auto_assign("second.csv", second.columns()).unwrap();
    assert_eq!(session.search("second.csv", &second, &columns).unwrap(), 1);
    assert!(session.is_complete());
    assert_eq!(session.missing().count(), 0);
    let anna = session.found().next().unwrap().1;
    assert_eq!(anna.batch, "first.csv");
}

#[test]
fn test_typed_multi_word_surname_is_found() {
    let employees = parse_manual_employees("Jo Van Dyke, 300").unwrap();
    let mut session = LookupSession::new(employees);
    let batch = Dataset::from_rows(
        &["First Name", "Surname", "LOC", "Company"],
        &[&["Jo", "van dyke", "300.00", "Acme"]],
    )
    .unwrap();
    let columns = BatchColumns::auto_assign("batch.csv", batch.columns()).unwrap();

    assert_eq!(session.search("batch.csv", &batch, &columns).unwrap(), 1);
    assert!(session.is_complete());
}

#[test]
fn test_lookup_rejects_unknown_columns() {
    let batch = Dataset::from_rows(&["A", "B", "C"], &[&["x", "y", "1"]]).unwrap();
    let columns = BatchColumns {
        first_name: "A".to_string(),
        last_name: "B".to_string(),
        loc: "Amount".to_string(),
        entity: Vec::new(),
    };
    let mut session = LookupSession::new(vec![Employee::new("x", "y", 1.0)]);
    assert!(session.search("batch", &batch, &columns).is_err());
    assert_eq!(session.missing().count(), 1);
}

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Jane", "John", "Ann", "Lee", "Doe", "Smith", "Patel", "Jo Ann"])
        .prop_map(str::to_string)
}

fn row() -> impl Strategy<Value = Vec<String>> {
    (name(), name(), prop::sample::select(vec!["a@x.com", "b@x.com", ""]), 0u32..4)
        .prop_map(|(first, last, email, loc)| {
            vec![first, last, email.to_string(), format!("{}", 100 * (loc + 1))]
        })
}

fn dataset(rows: Vec<Vec<String>>) -> Dataset {
    let mut dataset = Dataset::new(
        ["First Name", "Surname", "Email", "Amount"]
            .iter()
            .map(|c| (*c).to_string())
            .collect(),
    )
    .unwrap();
    for row in rows {
        dataset.push_row(row).unwrap();
    }
    dataset
}

proptest! {
    #[test]
    fn test_classification_is_symmetric_in_kind_counts(
        a in prop::collection::vec(row(), 0..8),
        b in prop::collection::vec(row(), 0..8),
    ) {
        let (a, b) = (dataset(a), dataset(b));
        let options = DuplicateOptions::default();
        let forward = find_duplicates(&a, &b, &options);
        let backward = find_duplicates(&b, &a, &options);
        prop_assert_eq!(forward.confirmed.len(), backward.confirmed.len());
        prop_assert_eq!(forward.potential.len(), backward.potential.len());
        prop_assert!(forward.comparisons <= a.row_count() * b.row_count());
    }

    #[test]
    fn test_review_never_adds_rows(
        a in prop::collection::vec(row(), 0..8),
        b in prop::collection::vec(row(), 0..8),
    ) {
        let (a, b) = (dataset(a), dataset(b));
        let mut review = DuplicateReview::new(find_duplicates(&a, &b, &DuplicateOptions::default()));
        let before = review.apply(&a).row_count();
        review.exclude_all_potential();
        let after = review.apply(&a).row_count();
        prop_assert!(after <= before);
        prop_assert!(before <= a.row_count());
    }
}
