//! Data-Extension Scenario Tests
//!
//! End-to-end behavior of applying and reverting data-extension changes
//! on a project:
//! - Overflow values fill continuation rows or synthesized rows
//! - Empty and absent payloads pass rows through
//! - Revert restores the exact original table
//! - Cell indices are never reused across apply/revert cycles

use rowsplice::extension::{ChangeError, ChangeState, DataExtension, DataExtensionChange, ExtensionValue};
use rowsplice::model::{CellIndex, CellValue, Project, ReconCandidate, Row, SharedProject};

const NAME: CellIndex = CellIndex::new(0);
const COUNTRY: CellIndex = CellIndex::new(1);
const ISO: CellIndex = CellIndex::new(2);

/// Columns "Name" (key) and "Country" (base); rows given as (name, country).
fn project(rows: &[(Option<&str>, Option<&str>)]) -> Project {
    let mut project = Project::with_columns(&["Name", "Country"]).unwrap();
    for (name, country) in rows {
        project.push_row(Row::from_values(vec![*name, *country]));
    }
    project
}

fn payload(values: &[&str]) -> Option<DataExtension> {
    Some(DataExtension::new(
        values.iter().map(|v| vec![ExtensionValue::from(*v)]).collect(),
    ))
}

fn iso_change(row_indices: Vec<usize>, extensions: Vec<Option<DataExtension>>) -> DataExtensionChange {
    DataExtensionChange::new("Country", 2, vec!["ISO".to_string()], row_indices, extensions).unwrap()
}

fn value(project: &Project, row: usize, index: CellIndex) -> Option<CellValue> {
    project.rows[row].cell_value(index).cloned()
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Overflow value lands in a continuation row that is blank in base and key.
#[test]
fn test_scenario_a_fills_continuation_row() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (None, None), (None, None)]);
    let mut change = iso_change(vec![0], vec![payload(&["USA", "CAN"])]);

    let outcome = change.apply(&mut project).unwrap();

    assert_eq!(project.rows.len(), 3);
    assert_eq!(value(&project, 0, ISO), Some(CellValue::from("USA")));
    assert_eq!(value(&project, 1, ISO), Some(CellValue::from("CAN")));
    assert_eq!(value(&project, 2, ISO), None);
    assert_eq!(outcome.filler_rows_reused, 1);
    assert_eq!(outcome.rows_synthesized, 0);
}

/// A keyed next row is not a continuation; a new row is synthesized.
#[test]
fn test_scenario_b_synthesizes_row() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (Some("Beta"), None), (None, None)]);
    let mut change = iso_change(vec![0], vec![payload(&["USA", "CAN"])]);

    let outcome = change.apply(&mut project).unwrap();

    assert_eq!(project.rows.len(), 4);
    assert_eq!(value(&project, 0, ISO), Some(CellValue::from("USA")));

    let synthesized = &project.rows[1];
    assert_eq!(synthesized.cell_value(ISO), Some(&CellValue::from("CAN")));
    assert!(synthesized.is_cell_blank(NAME));
    assert!(synthesized.is_cell_blank(COUNTRY));

    assert_eq!(value(&project, 2, NAME), Some(CellValue::from("Beta")));
    assert_eq!(outcome.rows_synthesized, 1);
    assert_eq!(outcome.filler_rows_reused, 0);
}

/// Payload with zero extension rows passes the row through.
#[test]
fn test_scenario_c_empty_payload_passes_through() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (Some("Beta"), Some("France"))]);
    let before = project.rows.clone();
    let mut change = iso_change(vec![0], vec![Some(DataExtension::new(Vec::new()))]);

    change.apply(&mut project).unwrap();

    assert_eq!(project.rows, before);
    assert_eq!(project.column_model.len(), 3);
}

/// Absent payload behaves like an empty one.
#[test]
fn test_scenario_d_absent_payload_passes_through() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (Some("Beta"), Some("France"))]);
    let before = project.rows.clone();
    let mut change = iso_change(vec![1], vec![None]);

    change.apply(&mut project).unwrap();

    assert_eq!(project.rows, before);
}

// =============================================================================
// Structural Property Tests
// =============================================================================

/// Single-row payloads never add rows.
#[test]
fn test_single_row_payloads_never_add_rows() {
    let mut project = project(&[
        (Some("Acme"), Some("USA")),
        (Some("Beta"), Some("France")),
        (Some("Gamma"), Some("Japan")),
    ]);
    let mut change = iso_change(vec![0, 1, 2], vec![payload(&["US"]), payload(&["FR"]), payload(&["JP"])]);

    change.apply(&mut project).unwrap();

    assert_eq!(project.rows.len(), 3);
    assert_eq!(value(&project, 2, ISO), Some(CellValue::from("JP")));
}

/// Filler rows were blank in base and key before the change.
#[test]
fn test_filler_rows_blank_in_original() {
    let original = project(&[
        (Some("Acme"), Some("USA")),
        (None, None),
        (None, Some("Mexico")),
        (Some("Beta"), Some("France")),
    ]);
    let mut project = original.clone();
    let mut change = iso_change(vec![0], vec![payload(&["US", "CA", "MX"])]);

    let outcome = change.apply(&mut project).unwrap();

    // Row 1 is reused; row 2 has a base value, so the third value is synthesized
    assert_eq!(outcome.filler_rows_reused, 1);
    assert_eq!(outcome.rows_synthesized, 1);
    assert!(original.rows[1].is_cell_blank(COUNTRY));
    assert!(original.rows[1].is_cell_blank(NAME));
    assert_eq!(project.rows.len(), 5);
    assert_eq!(value(&project, 1, ISO), Some(CellValue::from("CA")));
    assert_eq!(value(&project, 2, ISO), Some(CellValue::from("MX")));
    assert_eq!(value(&project, 3, COUNTRY), Some(CellValue::from("Mexico")));
}

/// Matched-entity payload values become cells with a matched recon.
#[test]
fn test_matched_entity_becomes_reconciled_cell() {
    let mut project = project(&[(Some("Acme"), Some("USA"))]);
    let candidate = ReconCandidate::new("Q30", "United States", vec!["Q6256".to_string()], 100.0);
    let extension = DataExtension::new(vec![vec![ExtensionValue::from(candidate.clone())]]);
    let mut change = iso_change(vec![0], vec![Some(extension)]);

    change.apply(&mut project).unwrap();

    let cell = project.rows[0].cell(ISO).unwrap();
    assert_eq!(cell.value, CellValue::from("United States"));
    let recon = cell.recon.as_ref().unwrap();
    assert_eq!(recon.matched.as_ref(), Some(&candidate));
}

/// Synthesized rows start new records only where the key is non-blank.
#[test]
fn test_synthesized_rows_join_record() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (Some("Beta"), Some("France"))]);
    let mut change = iso_change(vec![0], vec![payload(&["US", "CA"])]);

    change.apply(&mut project).unwrap();

    assert_eq!(project.records().len(), 2);
    assert_eq!(project.record_of_row(1).map(|r| r.start), Some(0));
    assert_eq!(project.record_of_row(2).map(|r| r.start), Some(2));
}

// =============================================================================
// Apply / Revert Tests
// =============================================================================

/// revert(apply(rows)) == rows, exactly.
#[test]
fn test_revert_restores_exact_rows() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (Some("Beta"), None), (None, None)]);
    let rows_before = project.rows.clone();
    let mut change = iso_change(vec![0, 1], vec![payload(&["US", "CA", "MX"]), payload(&["FR"])]);

    change.apply(&mut project).unwrap();
    assert_ne!(project.rows, rows_before);

    change.revert(&mut project).unwrap();
    assert_eq!(project.rows, rows_before);
    assert_eq!(project.column_model.len(), 2);
    assert!(project.column_model.column_by_name("ISO").is_none());
    assert_eq!(change.state(), ChangeState::Reverted);
}

/// Re-applying an applied change mints nothing and keeps "after" intact.
#[test]
fn test_reapply_is_a_replay() {
    let mut project = project(&[(Some("Acme"), Some("USA")), (Some("Beta"), None)]);
    let mut change = iso_change(vec![0], vec![payload(&["US", "CA"])]);

    change.apply(&mut project).unwrap();
    let after = project.rows.clone();
    let next_index = project.column_model.allocator().peek_next();

    let outcome = change.apply(&mut project).unwrap();

    assert!(outcome.replayed);
    assert_eq!(outcome.cell_indices_minted, 0);
    assert_eq!(outcome.columns_inserted, 0);
    assert_eq!(project.rows, after);
    assert_eq!(project.column_model.len(), 3);
    assert_eq!(project.column_model.allocator().peek_next(), next_index);
}

/// Cell indices stay monotonic across apply/revert/apply.
#[test]
fn test_allocator_monotonic_across_cycles() {
    let mut project = project(&[(Some("Acme"), Some("USA"))]);

    let mut first = iso_change(vec![0], vec![payload(&["US"])]);
    first.apply(&mut project).unwrap();
    let first_index = first.first_new_cell_index().unwrap();
    first.revert(&mut project).unwrap();
    first.apply(&mut project).unwrap();
    assert_eq!(first.first_new_cell_index(), Some(first_index));

    let mut second = DataExtensionChange::new(
        "Country",
        3,
        vec!["Capital".to_string(), "Currency".to_string()],
        vec![0],
        vec![Some(DataExtension::new(vec![vec![
            ExtensionValue::from("Washington"),
            ExtensionValue::from("USD"),
        ]]))],
    )
    .unwrap();
    second.apply(&mut project).unwrap();
    let second_index = second.first_new_cell_index().unwrap();
    assert!(second_index > first_index);
    second.revert(&mut project).unwrap();

    let mut third = iso_change(vec![0], vec![payload(&["US"])]);
    first.revert(&mut project).unwrap();
    third.apply(&mut project).unwrap();
    let third_index = third.first_new_cell_index().unwrap();
    assert!(third_index > second_index.offset(1));
}

/// Revert before any apply is a contract violation.
#[test]
fn test_revert_before_apply_fails() {
    let mut project = project(&[(Some("Acme"), Some("USA"))]);
    let rows = project.rows.clone();
    let mut change = iso_change(vec![0], vec![payload(&["US"])]);

    let err = change.revert(&mut project).unwrap_err();
    assert_eq!(err, ChangeError::NotApplied);
    assert!(err.is_fatal());
    assert_eq!(project.rows, rows);
}

/// Out-of-range row index fails without touching the project.
#[test]
fn test_out_of_range_row_leaves_project_untouched() {
    let mut project = project(&[(Some("Acme"), Some("USA"))]);
    let next_index = project.column_model.allocator().peek_next();
    let mut change = iso_change(vec![4], vec![payload(&["US"])]);

    let err = change.apply(&mut project).unwrap_err();
    assert!(matches!(err, ChangeError::RowIndexOutOfRange { row_index: 4, row_count: 1 }));
    assert_eq!(project.column_model.len(), 2);
    assert_eq!(project.column_model.allocator().peek_next(), next_index);
    assert_eq!(change.state(), ChangeState::Unapplied);
}

/// Applying through the shared handle holds the lock for the whole swap.
#[test]
fn test_apply_through_shared_project() {
    let shared = SharedProject::new(project(&[(Some("Acme"), Some("USA")), (None, None)]));
    let mut change = iso_change(vec![0], vec![payload(&["US", "CA"])]);

    change.apply_shared(&shared).unwrap();
    {
        let guard = shared.lock().unwrap();
        assert_eq!(guard.rows[1].cell_value(ISO), Some(&CellValue::from("CA")));
    }

    change.revert_shared(&shared).unwrap();
    let project = shared.into_inner().unwrap();
    assert!(project.rows[1].is_empty());
}
