//! # Model Errors
//!
//! Error types for the tabular value model and host project.

use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Tabular model errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    // ==================
    // Value Errors
    // ==================
    /// Value is not a scalar (arrays and objects cannot live in a cell)
    #[error("Unsupported cell value: {0}")]
    UnsupportedValue(String),

    /// Floating point value has no textual encoding
    #[error("Non-finite number cannot be encoded: {0}")]
    NonFiniteNumber(f64),

    // ==================
    // Column Model Errors
    // ==================
    /// No column with the given name
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column name already taken
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Column position outside the column list
    #[error("Column position {position} out of range (columns: {len})")]
    ColumnPositionOutOfRange { position: usize, len: usize },

    /// Column model has no columns, so no key column exists
    #[error("Column model has no key column")]
    NoKeyColumn,

    // ==================
    // Host Errors
    // ==================
    /// Another holder of the project lock panicked mid-mutation
    #[error("Project lock poisoned")]
    Poisoned,
}

impl ModelError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::UnsupportedValue(_) => "ROWSPLICE_MODEL_UNSUPPORTED_VALUE",
            ModelError::NonFiniteNumber(_) => "ROWSPLICE_MODEL_NON_FINITE_NUMBER",
            ModelError::ColumnNotFound(_) => "ROWSPLICE_MODEL_COLUMN_NOT_FOUND",
            ModelError::DuplicateColumn(_) => "ROWSPLICE_MODEL_DUPLICATE_COLUMN",
            ModelError::ColumnPositionOutOfRange { .. } => "ROWSPLICE_MODEL_COLUMN_POSITION",
            ModelError::NoKeyColumn => "ROWSPLICE_MODEL_NO_KEY_COLUMN",
            ModelError::Poisoned => "ROWSPLICE_MODEL_POISONED",
        }
    }

    /// A poisoned project may hold a half-swapped row list
    pub fn is_fatal(&self) -> bool {
        matches!(self, ModelError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ModelError::ColumnNotFound("x".into()).code(),
            "ROWSPLICE_MODEL_COLUMN_NOT_FOUND"
        );
        assert_eq!(ModelError::NoKeyColumn.code(), "ROWSPLICE_MODEL_NO_KEY_COLUMN");
    }

    #[test]
    fn test_only_poison_is_fatal() {
        assert!(ModelError::Poisoned.is_fatal());
        assert!(!ModelError::DuplicateColumn("a".into()).is_fatal());
    }

    #[test]
    fn test_display_includes_context() {
        let err = ModelError::ColumnPositionOutOfRange { position: 7, len: 3 };
        let display = err.to_string();
        assert!(display.contains('7'));
        assert!(display.contains('3'));
    }
}
