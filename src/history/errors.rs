//! # History Errors

use thiserror::Error;
use uuid::Uuid;

use crate::codec::CodecError;
use crate::extension::ChangeError;
use crate::model::ModelError;

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Change log errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Undo with an empty past
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo with an empty future
    #[error("Nothing to redo")]
    NothingToRedo,

    /// `undo_to` target is not in the log
    #[error("History entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Stored entry does not match its checksum
    #[error("Checksum mismatch for entry ending at line {line}: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch { line: usize, stored: u32, computed: u32 },

    /// Applying or reverting the underlying change failed
    #[error("Change error: {0}")]
    Change(#[from] ChangeError),

    /// Project lock failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Reading or writing the history file failed
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// `undo_to` failed after moving part of the way; the moves taken persist
    #[error("Stopped after {steps} step(s): {source}")]
    Interrupted {
        steps: usize,
        #[source]
        source: Box<HistoryError>,
    },
}

impl HistoryError {
    /// Wrap a failed step of a multi-step move. Nothing to report when no
    /// step was taken yet.
    pub(crate) fn interrupted(steps: usize, source: HistoryError) -> Self {
        if steps == 0 {
            source
        } else {
            HistoryError::Interrupted {
                steps,
                source: Box::new(source),
            }
        }
    }
}

impl HistoryError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            HistoryError::NothingToUndo => "ROWSPLICE_HISTORY_NOTHING_TO_UNDO",
            HistoryError::NothingToRedo => "ROWSPLICE_HISTORY_NOTHING_TO_REDO",
            HistoryError::EntryNotFound(_) => "ROWSPLICE_HISTORY_ENTRY_NOT_FOUND",
            HistoryError::ChecksumMismatch { .. } => "ROWSPLICE_HISTORY_CHECKSUM_MISMATCH",
            HistoryError::Change(e) => e.code(),
            HistoryError::Model(e) => e.code(),
            HistoryError::Codec(e) => e.code().code(),
            HistoryError::Interrupted { .. } => "ROWSPLICE_HISTORY_MOVE_INTERRUPTED",
        }
    }

    /// Corruption and broken change contracts are fatal
    pub fn is_fatal(&self) -> bool {
        match self {
            HistoryError::ChecksumMismatch { .. } => true,
            HistoryError::Change(e) => e.is_fatal(),
            HistoryError::Model(e) => e.is_fatal(),
            HistoryError::Interrupted { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}
