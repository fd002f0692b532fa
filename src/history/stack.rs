//! Undo/redo stacks over a shared project

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use uuid::Uuid;

use crate::codec::CodecError;
use crate::config::Config;
use crate::model::{Project, SharedProject};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::entry::{Change, HistoryEntry};
use super::errors::{HistoryError, HistoryResult};
use super::file::{read_history, write_history};

/// Change log with past (undoable) and future (redoable) entries.
///
/// Every move holds the project lock for its whole row/column swap. A
/// failed move leaves both the project and the stacks as they were.
#[derive(Debug, Default)]
pub struct History {
    past: Vec<HistoryEntry>,
    /// Next redo is last
    future: Vec<HistoryEntry>,
    limit: Option<usize>,
    metrics: MetricsRegistry,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` undoable entries
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_limit(config.history_limit)
    }

    /// Undoable entries, oldest first
    pub fn past(&self) -> &[HistoryEntry] {
        &self.past
    }

    /// Redoable entries, next redo last
    pub fn future(&self) -> &[HistoryEntry] {
        &self.future
    }

    /// Most recently applied entry
    pub fn last_done(&self) -> Option<&HistoryEntry> {
        self.past.last()
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Apply `change` and record it. Clears the redo stack.
    pub fn add_entry(&mut self, project: &SharedProject, change: impl Into<Change>) -> HistoryResult<Uuid> {
        let mut entry = HistoryEntry::new(change.into());
        let outcome = {
            let mut guard = project.lock()?;
            entry.change.apply(&mut guard)?
        };
        self.metrics.record_apply(&outcome);

        let id = entry.id;
        let id_text = id.to_string();
        log_event_with_fields(
            Event::HistoryEntryAdded,
            &[("description", entry.description.as_str()), ("id", id_text.as_str())],
        );

        self.past.push(entry);
        self.future.clear();
        self.trim();
        Ok(id)
    }

    /// Revert the last applied entry
    pub fn undo(&mut self, project: &SharedProject) -> HistoryResult<Uuid> {
        let mut guard = project.lock()?;
        self.undo_locked(&mut guard)
    }

    /// Re-apply the last reverted entry
    pub fn redo(&mut self, project: &SharedProject) -> HistoryResult<Uuid> {
        let mut guard = project.lock()?;
        self.redo_locked(&mut guard)
    }

    /// Undo or redo until `id` is the last applied entry.
    ///
    /// Returns the number of steps taken. Stops at the first failing step;
    /// steps already taken are not rolled back, and the error is
    /// `Interrupted` carrying their count.
    pub fn undo_to(&mut self, project: &SharedProject, id: Uuid) -> HistoryResult<usize> {
        let mut guard = project.lock()?;

        if let Some(position) = self.past.iter().position(|entry| entry.id == id) {
            let steps = self.past.len() - position - 1;
            for taken in 0..steps {
                if let Err(e) = self.undo_locked(&mut guard) {
                    return Err(HistoryError::interrupted(taken, e));
                }
            }
            return Ok(steps);
        }

        if let Some(position) = self.future.iter().position(|entry| entry.id == id) {
            let steps = self.future.len() - position;
            for taken in 0..steps {
                if let Err(e) = self.redo_locked(&mut guard) {
                    return Err(HistoryError::interrupted(taken, e));
                }
            }
            return Ok(steps);
        }

        Err(HistoryError::EntryNotFound(id))
    }

    fn undo_locked(&mut self, project: &mut Project) -> HistoryResult<Uuid> {
        let Some(mut entry) = self.past.pop() else {
            return Err(HistoryError::NothingToUndo);
        };
        if let Err(e) = entry.change.revert(project) {
            self.past.push(entry);
            return Err(e.into());
        }
        self.metrics.increment_reverted();

        let id = entry.id;
        let id_text = id.to_string();
        log_event_with_fields(Event::HistoryUndo, &[("id", id_text.as_str())]);
        self.future.push(entry);
        Ok(id)
    }

    fn redo_locked(&mut self, project: &mut Project) -> HistoryResult<Uuid> {
        let Some(mut entry) = self.future.pop() else {
            return Err(HistoryError::NothingToRedo);
        };
        let outcome = match entry.change.apply(project) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.future.push(entry);
                return Err(e.into());
            }
        };
        self.metrics.record_apply(&outcome);

        let id = entry.id;
        let id_text = id.to_string();
        log_event_with_fields(Event::HistoryRedo, &[("id", id_text.as_str())]);
        self.past.push(entry);
        self.trim();
        Ok(id)
    }

    fn trim(&mut self) {
        let Some(limit) = self.limit else { return };
        if self.past.len() <= limit {
            return;
        }
        let dropped = self.past.len() - limit;
        self.past.drain(..dropped);

        let dropped_text = dropped.to_string();
        log_event_with_fields(Event::HistoryTrimmed, &[("dropped", dropped_text.as_str())]);
    }

    /// Write the whole log to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> HistoryResult<()> {
        let text = write_history(&self.past, &self.future)?;
        writer
            .write_all(text.as_bytes())
            .map_err(|e| CodecError::io_failed("Failed to write history", e))?;
        self.metrics
            .add_records_encoded((self.past.len() + self.future.len()) as u64);
        Ok(())
    }

    /// Read a log written by `write_to`. Counters start at zero.
    pub fn read_from<R: BufRead>(reader: R, limit: Option<usize>) -> HistoryResult<Self> {
        let (past, future) = read_history(reader)?;
        let mut history = Self {
            past,
            future,
            limit,
            metrics: MetricsRegistry::new(),
        };
        history
            .metrics
            .add_records_decoded((history.past.len() + history.future.len()) as u64);
        history.trim();
        Ok(history)
    }

    /// Save to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> HistoryResult<()> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        fs::write(path, &buffer).map_err(|e| {
            CodecError::io_failed(format!("Failed to write history file {}", path.display()), e)
        })?;

        let path_text = path.display().to_string();
        let past = self.past.len().to_string();
        let future = self.future.len().to_string();
        log_event_with_fields(
            Event::HistorySaved,
            &[
                ("future", future.as_str()),
                ("past", past.as_str()),
                ("path", path_text.as_str()),
            ],
        );
        Ok(())
    }

    /// Load from `path`, verifying every entry checksum
    pub fn load(path: &Path, limit: Option<usize>) -> HistoryResult<Self> {
        let file = fs::File::open(path).map_err(|e| {
            CodecError::io_failed(format!("Failed to open history file {}", path.display()), e)
        })?;
        let history = Self::read_from(BufReader::new(file), limit)?;

        let path_text = path.display().to_string();
        let past = history.past.len().to_string();
        let future = history.future.len().to_string();
        log_event_with_fields(
            Event::HistoryLoaded,
            &[
                ("future", future.as_str()),
                ("past", past.as_str()),
                ("path", path_text.as_str()),
            ],
        );
        Ok(history)
    }
}
