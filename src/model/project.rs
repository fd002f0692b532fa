//! Host project
//!
//! The in-memory table that changes mutate: the row list, the column
//! model, and the record structure derived from the key column.
//!
//! Mutation goes through `SharedProject`, whose lock is held for the
//! whole of a row/column swap so readers never see a half-applied change.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::allocator::CellIndex;
use super::column::ColumnModel;
use super::errors::{ModelError, ModelResult};
use super::row::Row;

/// A logical record: a keyed row followed by its continuation rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// First row of the record
    pub start: usize,
    /// One past the last row of the record
    pub end: usize,
}

impl Record {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// The host table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub rows: Vec<Row>,
    pub column_model: ColumnModel,
    #[serde(skip)]
    records: Vec<Record>,
    #[serde(skip)]
    row_to_record: Vec<usize>,
}

impl Project {
    /// Create an empty project with the given columns
    pub fn with_columns(names: &[&str]) -> ModelResult<Self> {
        let mut project = Self::default();
        for name in names {
            project.column_model.add_column(*name)?;
        }
        Ok(project)
    }

    /// Append a row and refresh derived state
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
        self.recompute_row_context_dependencies();
    }

    /// Replace the whole row list. Derived state is not refreshed.
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    /// Rebuild column lookups and the record structure. Call after
    /// deserializing a project.
    pub fn finalize(&mut self) {
        self.column_model.update();
        self.recompute_row_context_dependencies();
    }

    /// Recompute which rows belong to which record.
    ///
    /// A record starts at row 0 and at every row whose key cell is
    /// non-blank.
    pub fn recompute_row_context_dependencies(&mut self) {
        self.records.clear();
        self.row_to_record.clear();

        let key: Option<CellIndex> = self
            .column_model
            .key_column()
            .ok()
            .map(|column| column.cell_index());

        for (r, row) in self.rows.iter().enumerate() {
            let starts_record = r == 0 || key.map_or(true, |k| !row.is_cell_blank(k));
            if starts_record {
                self.records.push(Record { start: r, end: r + 1 });
            } else if let Some(last) = self.records.last_mut() {
                last.end = r + 1;
            }
            self.row_to_record.push(self.records.len() - 1);
        }
    }

    /// Records derived at the last recompute
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The record a row belongs to
    pub fn record_of_row(&self, row: usize) -> Option<&Record> {
        self.row_to_record
            .get(row)
            .and_then(|&record| self.records.get(record))
    }
}

/// A project guarded by a mutual-exclusion lock.
#[derive(Debug, Default)]
pub struct SharedProject {
    inner: Mutex<Project>,
}

impl SharedProject {
    pub fn new(project: Project) -> Self {
        Self {
            inner: Mutex::new(project),
        }
    }

    /// Acquire sole ownership of the project
    pub fn lock(&self) -> ModelResult<MutexGuard<'_, Project>> {
        self.inner.lock().map_err(|_| ModelError::Poisoned)
    }

    /// Consume the guard and return the project
    pub fn into_inner(self) -> ModelResult<Project> {
        self.inner.into_inner().map_err(|_| ModelError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        let mut project = Project::with_columns(&["Name", "Country"]).unwrap();
        project.push_row(Row::from_values(vec![Some("Alice"), Some("US")]));
        project.push_row(Row::from_values(vec![None, Some("CA")]));
        project.push_row(Row::from_values(vec![Some("Bob"), None]));
        project
    }

    #[test]
    fn test_records_follow_key_column() {
        let project = sample();
        assert_eq!(
            project.records(),
            &[Record { start: 0, end: 2 }, Record { start: 2, end: 3 }]
        );
        assert_eq!(project.record_of_row(1), Some(&Record { start: 0, end: 2 }));
    }

    #[test]
    fn test_leading_blank_row_starts_record() {
        let mut project = Project::with_columns(&["Name"]).unwrap();
        project.push_row(Row::from_values(vec![None::<&str>]));
        project.push_row(Row::from_values(vec![None::<&str>]));
        assert_eq!(project.records(), &[Record { start: 0, end: 2 }]);
    }

    #[test]
    fn test_json_round_trip_needs_finalize() {
        let project = sample();
        let json = serde_json::to_string(&project).unwrap();
        let mut loaded: Project = serde_json::from_str(&json).unwrap();
        assert!(loaded.records().is_empty());
        loaded.finalize();
        assert_eq!(loaded.records(), project.records());
        assert_eq!(loaded.column_model.column_by_name("Country").unwrap().cell_index(), CellIndex::new(1));
    }

    #[test]
    fn test_shared_project_lock() {
        let shared = SharedProject::new(sample());
        {
            let mut project = shared.lock().unwrap();
            project.rows.clear();
        }
        assert!(shared.into_inner().unwrap().rows.is_empty());
    }
}
