//! Data-extension change record
//!
//! A reversible command that inserts new columns next to a base column
//! and fills them from per-row extension payloads, splitting rows where a
//! payload carries several extension rows.
//!
//! # Lifecycle
//!
//! ```text
//! Unapplied --apply--> Applied --revert--> Reverted --apply--> Applied ...
//! ```
//!
//! The first `apply` mints the cell indices, snapshots the rows before
//! and computes the rows after. Both snapshots are cached and persisted;
//! every later `apply`/`revert` is a pure snapshot swap.

use serde::{Deserialize, Serialize};

use crate::model::{CellIndex, Column, ModelError, Project, Row, SharedProject};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{ChangeError, ChangeResult};
use super::expand::{expand_rows, ExpansionPlan};
use super::payload::DataExtension;

/// How construction treats row indices that are not strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowIndexPolicy {
    /// Refuse to build the change
    #[default]
    Reject,
    /// Stable-sort by row index and drop duplicates, keeping the first payload
    Normalize,
}

/// Lifecycle state of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    /// Never applied; nothing cached
    Unapplied,
    /// Snapshots cached, "after" rows installed
    Applied,
    /// Snapshots cached, "before" rows installed
    Reverted,
}

/// Rows captured the first time the change is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionSnapshots {
    /// First of the contiguous cell indices bound to the new columns
    pub first_new_cell_index: CellIndex,
    /// Rows before the change
    pub before: Vec<Row>,
    /// Rows after the change
    pub after: Vec<Row>,
}

/// What an `apply` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyOutcome {
    /// Cached snapshots were swapped in, nothing recomputed
    pub replayed: bool,
    pub cell_indices_minted: usize,
    pub filler_rows_reused: usize,
    pub rows_synthesized: usize,
    pub columns_inserted: usize,
    /// Targets whose row was already filled by an earlier payload
    pub targets_skipped: usize,
}

/// Reversible, serializable data-extension change.
#[derive(Debug, Clone, PartialEq)]
pub struct DataExtensionChange {
    base_column_name: String,
    column_insert_index: usize,
    column_names: Vec<String>,
    row_indices: Vec<usize>,
    extensions: Vec<Option<DataExtension>>,
    snapshots: Option<ExtensionSnapshots>,
    state: ChangeState,
}

impl DataExtensionChange {
    /// Build a change, rejecting row indices that are not strictly increasing.
    pub fn new(
        base_column_name: impl Into<String>,
        column_insert_index: usize,
        column_names: Vec<String>,
        row_indices: Vec<usize>,
        extensions: Vec<Option<DataExtension>>,
    ) -> ChangeResult<Self> {
        Self::with_policy(
            base_column_name,
            column_insert_index,
            column_names,
            row_indices,
            extensions,
            RowIndexPolicy::Reject,
        )
    }

    /// Build a change using `policy` for out-of-order row indices.
    pub fn with_policy(
        base_column_name: impl Into<String>,
        column_insert_index: usize,
        column_names: Vec<String>,
        mut row_indices: Vec<usize>,
        mut extensions: Vec<Option<DataExtension>>,
        policy: RowIndexPolicy,
    ) -> ChangeResult<Self> {
        if row_indices.len() != extensions.len() {
            return Err(ChangeError::PayloadCountMismatch {
                row_indices: row_indices.len(),
                extensions: extensions.len(),
            });
        }

        if policy == RowIndexPolicy::Normalize {
            let mut pairs: Vec<(usize, Option<DataExtension>)> =
                row_indices.into_iter().zip(extensions).collect();
            pairs.sort_by_key(|(row_index, _)| *row_index);
            pairs.dedup_by_key(|(row_index, _)| *row_index);
            (row_indices, extensions) = pairs.into_iter().unzip();
        }

        Self::restore(
            base_column_name.into(),
            column_insert_index,
            column_names,
            row_indices,
            extensions,
            None,
        )
    }

    /// Rebuild a change from persisted parts. Snapshots, when present,
    /// mark the change as applied.
    pub(crate) fn restore(
        base_column_name: String,
        column_insert_index: usize,
        column_names: Vec<String>,
        row_indices: Vec<usize>,
        extensions: Vec<Option<DataExtension>>,
        snapshots: Option<ExtensionSnapshots>,
    ) -> ChangeResult<Self> {
        if column_names.is_empty() {
            return Err(ChangeError::NoColumns);
        }
        if row_indices.len() != extensions.len() {
            return Err(ChangeError::PayloadCountMismatch {
                row_indices: row_indices.len(),
                extensions: extensions.len(),
            });
        }
        if let Some(pair) = row_indices.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ChangeError::RowIndicesNotIncreasing {
                previous: pair[0],
                next: pair[1],
            });
        }
        for (payload, extension) in extensions.iter().enumerate() {
            let Some(extension) = extension else { continue };
            if let Some(row) = extension.first_misaligned_row(column_names.len()) {
                return Err(ChangeError::PayloadWidthMismatch {
                    payload,
                    row,
                    width: extension.rows[row].len(),
                    expected: column_names.len(),
                });
            }
        }

        let state = if snapshots.is_some() {
            ChangeState::Applied
        } else {
            ChangeState::Unapplied
        };

        Ok(Self {
            base_column_name,
            column_insert_index,
            column_names,
            row_indices,
            extensions,
            snapshots,
            state,
        })
    }

    pub fn base_column_name(&self) -> &str {
        &self.base_column_name
    }

    pub fn column_insert_index(&self) -> usize {
        self.column_insert_index
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    pub fn extensions(&self) -> &[Option<DataExtension>] {
        &self.extensions
    }

    /// Cached snapshots, present once the change has been applied
    pub fn snapshots(&self) -> Option<&ExtensionSnapshots> {
        self.snapshots.as_ref()
    }

    pub fn first_new_cell_index(&self) -> Option<CellIndex> {
        self.snapshots.as_ref().map(|s| s.first_new_cell_index)
    }

    pub fn state(&self) -> ChangeState {
        self.state
    }

    /// Record that the "before" rows are installed. Used when reloading
    /// a change that sat on the redo stack.
    pub(crate) fn mark_reverted(&mut self) {
        if self.snapshots.is_some() {
            self.state = ChangeState::Reverted;
        }
    }

    /// Human-readable summary for change logs
    pub fn describe(&self) -> String {
        let filled = self
            .extensions
            .iter()
            .filter(|extension| extension.as_ref().map_or(false, |e| !e.is_empty()))
            .count();
        format!(
            "Extend data at index {} based on column {} by filling {} rows with {}",
            self.column_insert_index,
            self.base_column_name,
            filled,
            self.column_names.join(", ")
        )
    }

    /// Apply under the project's lock.
    pub fn apply_shared(&mut self, project: &SharedProject) -> ChangeResult<ApplyOutcome> {
        let mut guard = project.lock()?;
        self.apply(&mut guard)
    }

    /// Revert under the project's lock.
    pub fn revert_shared(&mut self, project: &SharedProject) -> ChangeResult<()> {
        let mut guard = project.lock()?;
        self.revert(&mut guard)
    }

    /// Install the "after" rows and the new columns.
    ///
    /// Computes and caches the snapshots on first use only. On failure the
    /// project is left untouched.
    pub fn apply(&mut self, project: &mut Project) -> ChangeResult<ApplyOutcome> {
        let mut outcome = ApplyOutcome::default();

        let snapshots = match self.snapshots.take() {
            Some(snapshots) => {
                outcome.replayed = true;
                snapshots
            }
            None => self.compute(project, &mut outcome)?,
        };

        let swapped = self.install(project, &snapshots);
        self.snapshots = Some(snapshots);
        outcome.columns_inserted = swapped?;
        self.state = ChangeState::Applied;

        let replayed = outcome.replayed.to_string();
        let rows = project.rows.len().to_string();
        let synthesized = outcome.rows_synthesized.to_string();
        let reused = outcome.filler_rows_reused.to_string();
        log_event_with_fields(
            if outcome.replayed {
                Event::ChangeReplayed
            } else {
                Event::ChangeApplied
            },
            &[
                ("base_column", self.base_column_name.as_str()),
                ("filler_rows_reused", reused.as_str()),
                ("replayed", replayed.as_str()),
                ("rows", rows.as_str()),
                ("rows_synthesized", synthesized.as_str()),
            ],
        );

        Ok(outcome)
    }

    /// Restore the "before" rows and remove the inserted columns.
    ///
    /// Fails with `NotApplied` when no snapshot was ever taken.
    pub fn revert(&mut self, project: &mut Project) -> ChangeResult<()> {
        let Some(snapshots) = self.snapshots.as_ref() else {
            log_event_with_fields(
                Event::ChangeContractViolated,
                &[("base_column", self.base_column_name.as_str()), ("reason", "revert before apply")],
            );
            return Err(ChangeError::NotApplied);
        };
        let columns_present = self.columns_in_place(project, snapshots.first_new_cell_index)?;

        project.replace_rows(snapshots.before.clone());
        if columns_present {
            for _ in 0..self.column_names.len() {
                project.column_model.remove_column(self.column_insert_index)?;
            }
        }
        project.column_model.update();
        project.recompute_row_context_dependencies();
        self.state = ChangeState::Reverted;

        let rows = project.rows.len().to_string();
        log_event_with_fields(
            Event::ChangeReverted,
            &[("base_column", self.base_column_name.as_str()), ("rows", rows.as_str())],
        );
        Ok(())
    }

    /// First-apply path: validate, mint indices, expand.
    fn compute(&self, project: &mut Project, outcome: &mut ApplyOutcome) -> ChangeResult<ExtensionSnapshots> {
        let base_cell_index = project
            .column_model
            .require_column(&self.base_column_name)?
            .cell_index();
        let key_cell_index = project.column_model.key_column()?.cell_index();

        let row_count = project.rows.len();
        if let Some(&row_index) = self.row_indices.iter().find(|&&row_index| row_index >= row_count) {
            return Err(ChangeError::RowIndexOutOfRange { row_index, row_count });
        }
        self.check_insertable(project)?;

        let first_new_cell_index = project.column_model.allocate_cell_index();
        for i in 1..self.column_names.len() {
            let minted = project.column_model.allocate_cell_index();
            debug_assert_eq!(minted, first_new_cell_index.offset(i));
        }
        outcome.cell_indices_minted = self.column_names.len();

        let expansion = expand_rows(
            &project.rows,
            &ExpansionPlan {
                base_cell_index,
                key_cell_index,
                row_indices: &self.row_indices,
                extensions: &self.extensions,
                first_new_cell_index,
                column_count: self.column_names.len(),
            },
        );
        outcome.filler_rows_reused = expansion.filler_rows_reused;
        outcome.rows_synthesized = expansion.rows_synthesized;
        outcome.targets_skipped = expansion.skipped_targets.len();
        if !expansion.skipped_targets.is_empty() {
            let skipped = expansion
                .skipped_targets
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(",");
            log_event_with_fields(
                Event::ChangeTargetSkipped,
                &[("base_column", self.base_column_name.as_str()), ("row_indices", skipped.as_str())],
            );
        }

        Ok(ExtensionSnapshots {
            first_new_cell_index,
            before: project.rows.clone(),
            after: expansion.rows,
        })
    }

    /// Swap in the "after" rows and insert any missing columns.
    /// Returns the number of columns inserted.
    fn install(&self, project: &mut Project, snapshots: &ExtensionSnapshots) -> ChangeResult<usize> {
        let columns_present = self.columns_in_place(project, snapshots.first_new_cell_index)?;
        if !columns_present {
            self.check_insertable(project)?;
        }

        project.replace_rows(snapshots.after.clone());
        let mut inserted = 0;
        if !columns_present {
            for (i, name) in self.column_names.iter().enumerate() {
                let column = Column::new(snapshots.first_new_cell_index.offset(i), name.as_str());
                project
                    .column_model
                    .insert_column(self.column_insert_index + i, column)?;
                inserted += 1;
            }
        }
        project.column_model.update();
        project.recompute_row_context_dependencies();
        Ok(inserted)
    }

    /// New columns can go in at the insertion position without clashing.
    fn check_insertable(&self, project: &Project) -> ChangeResult<()> {
        let model = &project.column_model;
        if self.column_insert_index > model.len() {
            return Err(ModelError::ColumnPositionOutOfRange {
                position: self.column_insert_index,
                len: model.len(),
            }
            .into());
        }
        if let Some(name) = self
            .column_names
            .iter()
            .find(|name| model.column_by_name(name).is_some())
        {
            return Err(ModelError::DuplicateColumn(name.clone()).into());
        }
        Ok(())
    }

    /// Whether this change's columns sit at the insertion position.
    ///
    /// `Ok(false)` when none of them are in the model, `Ok(true)` when all
    /// are, in order, at the insertion position. Anything else means the
    /// model was edited behind the change's back.
    fn columns_in_place(&self, project: &Project, first: CellIndex) -> ChangeResult<bool> {
        let model = &project.column_model;
        let positions: Vec<Option<usize>> = (0..self.column_names.len())
            .map(|i| model.position_of(first.offset(i)))
            .collect();

        if positions.iter().all(Option::is_none) {
            return Ok(false);
        }
        for (i, position) in positions.iter().enumerate() {
            if *position != Some(self.column_insert_index + i) {
                return Err(ChangeError::ColumnMismatch {
                    position: self.column_insert_index + i,
                    expected: first.offset(i).value(),
                });
            }
        }
        Ok(true)
    }
}
