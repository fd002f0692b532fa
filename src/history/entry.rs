//! Change log entries

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::extension::{ApplyOutcome, ChangeResult, DataExtensionChange};
use crate::model::Project;

/// A change that can live in the log.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    DataExtension(DataExtensionChange),
}

impl Change {
    /// Tag written to the `change=` line
    pub fn kind(&self) -> &'static str {
        match self {
            Change::DataExtension(_) => Self::DATA_EXTENSION,
        }
    }

    pub(crate) const DATA_EXTENSION: &'static str = "data-extension";

    pub fn describe(&self) -> String {
        match self {
            Change::DataExtension(change) => change.describe(),
        }
    }

    pub fn apply(&mut self, project: &mut Project) -> ChangeResult<ApplyOutcome> {
        match self {
            Change::DataExtension(change) => change.apply(project),
        }
    }

    pub fn revert(&mut self, project: &mut Project) -> ChangeResult<()> {
        match self {
            Change::DataExtension(change) => change.revert(project),
        }
    }

    pub(crate) fn mark_reverted(&mut self) {
        match self {
            Change::DataExtension(change) => change.mark_reverted(),
        }
    }
}

impl From<DataExtensionChange> for Change {
    fn from(change: DataExtensionChange) -> Self {
        Change::DataExtension(change)
    }
}

/// One undoable step.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub description: String,
    pub time: DateTime<Utc>,
    pub change: Change,
}

impl HistoryEntry {
    /// New entry with a fresh id, stamped now, described by its change
    pub fn new(change: Change) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: change.describe(),
            time: Utc::now(),
            change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{DataExtension, ExtensionValue};

    fn sample_change() -> DataExtensionChange {
        DataExtensionChange::new(
            "Country",
            1,
            vec!["ISO".to_string()],
            vec![0],
            vec![Some(DataExtension::new(vec![vec![ExtensionValue::from("USA")]]))],
        )
        .unwrap()
    }

    #[test]
    fn test_entry_takes_description_from_change() {
        let entry = HistoryEntry::new(sample_change().into());
        assert_eq!(entry.change.kind(), "data-extension");
        assert!(entry.description.starts_with("Extend data at index 1 based on column Country"));
    }

    #[test]
    fn test_entries_get_distinct_ids() {
        let a = HistoryEntry::new(sample_change().into());
        let b = HistoryEntry::new(sample_change().into());
        assert_ne!(a.id, b.id);
    }
}
