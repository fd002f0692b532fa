//! # Change Errors
//!
//! Error types for constructing, applying and reverting data-extension
//! changes.

use thiserror::Error;

use crate::model::ModelError;

/// Result type for change operations
pub type ChangeResult<T> = Result<T, ChangeError>;

/// Severity of a change error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The call fails, the project is untouched
    Error,
    /// Caller broke the change contract
    Fatal,
}

/// Data-extension change errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeError {
    // ==================
    // Construction Errors
    // ==================
    /// Change inserts no columns
    #[error("Change has no new column names")]
    NoColumns,

    /// Row indices and payloads are not parallel
    #[error("Row index count {row_indices} does not match payload count {extensions}")]
    PayloadCountMismatch { row_indices: usize, extensions: usize },

    /// Row indices not strictly increasing
    #[error("Row indices must be strictly increasing: {previous} followed by {next}")]
    RowIndicesNotIncreasing { previous: usize, next: usize },

    /// Extension row width differs from the number of new columns
    #[error("Payload {payload} row {row} has {width} values, expected {expected}")]
    PayloadWidthMismatch {
        payload: usize,
        row: usize,
        width: usize,
        expected: usize,
    },

    // ==================
    // Apply Errors
    // ==================
    /// Target row does not exist in the project
    #[error("Row index {row_index} out of range (rows: {row_count})")]
    RowIndexOutOfRange { row_index: usize, row_count: usize },

    /// Project column layout no longer matches the cached change
    #[error("Column at position {position} is not bound to cell index {expected}")]
    ColumnMismatch { position: usize, expected: usize },

    /// Host model rejected the operation
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // ==================
    // Contract Errors
    // ==================
    /// Revert requested before any apply produced a snapshot
    #[error("Change reverted before it was ever applied")]
    NotApplied,
}

impl ChangeError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ChangeError::NoColumns => "ROWSPLICE_CHANGE_NO_COLUMNS",
            ChangeError::PayloadCountMismatch { .. } => "ROWSPLICE_CHANGE_PAYLOAD_COUNT",
            ChangeError::RowIndicesNotIncreasing { .. } => "ROWSPLICE_CHANGE_ROW_ORDER",
            ChangeError::PayloadWidthMismatch { .. } => "ROWSPLICE_CHANGE_PAYLOAD_WIDTH",
            ChangeError::RowIndexOutOfRange { .. } => "ROWSPLICE_CHANGE_ROW_RANGE",
            ChangeError::ColumnMismatch { .. } => "ROWSPLICE_CHANGE_COLUMN_MISMATCH",
            ChangeError::Model(e) => e.code(),
            ChangeError::NotApplied => "ROWSPLICE_CHANGE_NOT_APPLIED",
        }
    }

    /// Returns the severity
    pub fn severity(&self) -> Severity {
        match self {
            ChangeError::NotApplied => Severity::Fatal,
            ChangeError::Model(e) if e.is_fatal() => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_applied_is_fatal() {
        assert!(ChangeError::NotApplied.is_fatal());
        assert_eq!(ChangeError::NotApplied.code(), "ROWSPLICE_CHANGE_NOT_APPLIED");
    }

    #[test]
    fn test_validation_errors_are_not_fatal() {
        let err = ChangeError::RowIndicesNotIncreasing { previous: 4, next: 2 };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("4 followed by 2"));
    }

    #[test]
    fn test_model_error_code_passes_through() {
        let err = ChangeError::from(ModelError::ColumnNotFound("Country".into()));
        assert_eq!(err.code(), "ROWSPLICE_MODEL_COLUMN_NOT_FOUND");
        assert!(!err.is_fatal());
        assert!(ChangeError::from(ModelError::Poisoned).is_fatal());
    }
}
