//! Row expansion
//!
//! Merges extension payloads into the row list. The first extension row
//! of a payload lands on the target row itself; every further extension
//! row either reuses the next original row (when it is blank in both the
//! base and the key column, i.e. a continuation row of the same record)
//! or is written into a freshly synthesized row.
//!
//! Continuation detection always looks at the original rows, never at
//! rows already extended, and never looks more than one row ahead per
//! extension row.
//!
//! A target row already consumed as a continuation row of an earlier
//! payload is skipped; its payload is dropped and reported, and scanning
//! resumes with the next target.

use crate::model::{CellIndex, Row};

use super::payload::{extend_row, DataExtension};

/// Inputs of one expansion pass.
#[derive(Debug, Clone, Copy)]
pub struct ExpansionPlan<'a> {
    /// Cell index of the column the extension was fetched for
    pub base_cell_index: CellIndex,
    /// Cell index of the key column
    pub key_cell_index: CellIndex,
    /// Strictly increasing target row indices
    pub row_indices: &'a [usize],
    /// Payloads parallel to `row_indices`
    pub extensions: &'a [Option<DataExtension>],
    /// First of the contiguous cell indices minted for the new columns
    pub first_new_cell_index: CellIndex,
    /// Number of new columns
    pub column_count: usize,
}

/// Result of an expansion pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expansion {
    pub rows: Vec<Row>,
    /// Original continuation rows that received overflow values
    pub filler_rows_reused: usize,
    /// Rows created to hold overflow values
    pub rows_synthesized: usize,
    /// Target rows already used as continuation rows, payload dropped
    pub skipped_targets: Vec<usize>,
}

/// Run the expansion over `rows`.
///
/// Target indices past the end of `rows` are ignored; callers validate
/// them beforehand.
pub fn expand_rows(rows: &[Row], plan: &ExpansionPlan<'_>) -> Expansion {
    let mut expansion = Expansion {
        rows: Vec::with_capacity(rows.len()),
        ..Expansion::default()
    };
    let mut targets = plan
        .row_indices
        .iter()
        .copied()
        .zip(plan.extensions.iter())
        .peekable();

    let mut r = 0;
    while r < rows.len() {
        let row = &rows[r];

        while let Some((target, _)) = targets.next_if(|(target, _)| *target < r) {
            expansion.skipped_targets.push(target);
        }

        let Some((_, extension)) = targets.next_if(|(target, _)| *target == r) else {
            expansion.rows.push(row.dup());
            r += 1;
            continue;
        };

        let extension = match extension {
            Some(extension) if !extension.is_empty() => extension,
            _ => {
                expansion.rows.push(row.clone());
                r += 1;
                continue;
            }
        };

        let mut first = row.dup();
        extend_row(&mut first, &extension.rows[0], plan.first_new_cell_index);
        expansion.rows.push(first);

        let mut r2 = r + 1;
        for values in &extension.rows[1..] {
            match rows.get(r2) {
                Some(next) if is_continuation(next, plan) => {
                    let mut reused = next.dup();
                    extend_row(&mut reused, values, plan.first_new_cell_index);
                    expansion.rows.push(reused);
                    expansion.filler_rows_reused += 1;
                    r2 += 1;
                }
                _ => {
                    let mut synthesized = Row::with_capacity(
                        plan.first_new_cell_index.value() + plan.column_count,
                    );
                    extend_row(&mut synthesized, values, plan.first_new_cell_index);
                    expansion.rows.push(synthesized);
                    expansion.rows_synthesized += 1;
                }
            }
        }

        r = r2;
    }

    expansion.skipped_targets.extend(targets.map(|(target, _)| target));
    expansion
}

fn is_continuation(row: &Row, plan: &ExpansionPlan<'_>) -> bool {
    row.is_cell_blank(plan.base_cell_index) && row.is_cell_blank(plan.key_cell_index)
}
