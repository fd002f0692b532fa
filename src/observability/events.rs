//! Observable events
//!
//! Every structural mutation, persistence step and history move has a
//! typed event. Events are explicit; no free-form event names outside
//! observation scopes.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Change lifecycle
    /// Change computed its snapshots and was applied
    ChangeApplied,
    /// Cached snapshots swapped in without recomputation
    ChangeReplayed,
    /// Change reverted to its "before" snapshot
    ChangeReverted,
    /// Target row already used as a continuation row; payload dropped
    ChangeTargetSkipped,
    /// Revert attempted on a change that never ran (FATAL)
    ChangeContractViolated,

    // Persistence
    /// Change record encoded
    ChangeEncoded,
    /// Change record decoded
    ChangeDecoded,
    /// Decode rejected a record
    ChangeDecodeFailed,

    // History
    /// Entry applied and appended to the history
    HistoryEntryAdded,
    /// Last entry undone
    HistoryUndo,
    /// Last undone entry redone
    HistoryRedo,
    /// Oldest entries dropped past the history limit
    HistoryTrimmed,
    /// History written out
    HistorySaved,
    /// History read back
    HistoryLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ChangeApplied => "CHANGE_APPLIED",
            Event::ChangeReplayed => "CHANGE_REPLAYED",
            Event::ChangeReverted => "CHANGE_REVERTED",
            Event::ChangeTargetSkipped => "CHANGE_TARGET_SKIPPED",
            Event::ChangeContractViolated => "CHANGE_CONTRACT_VIOLATED",

            Event::ChangeEncoded => "CHANGE_ENCODED",
            Event::ChangeDecoded => "CHANGE_DECODED",
            Event::ChangeDecodeFailed => "CHANGE_DECODE_FAILED",

            Event::HistoryEntryAdded => "HISTORY_ENTRY_ADDED",
            Event::HistoryUndo => "HISTORY_UNDO",
            Event::HistoryRedo => "HISTORY_REDO",
            Event::HistoryTrimmed => "HISTORY_TRIMMED",
            Event::HistorySaved => "HISTORY_SAVED",
            Event::HistoryLoaded => "HISTORY_LOADED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ChangeContractViolated)
    }

    /// Returns true if this event reports dropped input
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::ChangeTargetSkipped)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::ChangeApplied,
            Event::ChangeReplayed,
            Event::ChangeReverted,
            Event::ChangeTargetSkipped,
            Event::ChangeContractViolated,
            Event::ChangeEncoded,
            Event::ChangeDecoded,
            Event::ChangeDecodeFailed,
            Event::HistoryEntryAdded,
            Event::HistoryUndo,
            Event::HistoryRedo,
            Event::HistoryTrimmed,
            Event::HistorySaved,
            Event::HistoryLoaded,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::ChangeContractViolated.is_fatal());
        assert!(!Event::ChangeApplied.is_fatal());
        assert!(!Event::ChangeDecodeFailed.is_fatal());
        assert!(Event::ChangeTargetSkipped.is_warning());
        assert!(!Event::ChangeTargetSkipped.is_fatal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::ChangeReplayed), "CHANGE_REPLAYED");
    }
}
