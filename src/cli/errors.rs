//! CLI-specific error types
//!
//! Every failure carries a CLI code; wrapped library errors keep their own
//! code at the front of the message.

use std::fmt;
use std::io;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::extension::ChangeError;
use crate::model::ModelError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// File or stdout I/O error
    IoError,
    /// Project file unreadable or inconsistent
    ProjectError,
    /// Change record could not be decoded or encoded
    CodecError,
    /// Change could not be applied or reverted
    ChangeError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ROWSPLICE_CLI_CONFIG_ERROR",
            Self::IoError => "ROWSPLICE_CLI_IO_ERROR",
            Self::ProjectError => "ROWSPLICE_CLI_PROJECT_ERROR",
            Self::CodecError => "ROWSPLICE_CLI_CODEC_ERROR",
            Self::ChangeError => "ROWSPLICE_CLI_CHANGE_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn project_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ProjectError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(format!("{}: {}", e.code(), e))
    }
}

impl From<CodecError> for CliError {
    fn from(e: CodecError) -> Self {
        Self::new(CliErrorCode::CodecError, e.to_string())
    }
}

impl From<ChangeError> for CliError {
    fn from(e: ChangeError) -> Self {
        Self::new(CliErrorCode::ChangeError, format!("{}: {}", e.code(), e))
    }
}

impl From<ModelError> for CliError {
    fn from(e: ModelError) -> Self {
        Self::project_error(format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_error_keeps_inner_code() {
        let err = CliError::from(ChangeError::NotApplied);
        assert_eq!(err.code(), &CliErrorCode::ChangeError);
        assert!(err.message().starts_with(ChangeError::NotApplied.code()));
        assert!(err.to_string().starts_with("ROWSPLICE_CLI_CHANGE_ERROR: "));
    }

    #[test]
    fn test_io_error_conversion() {
        let err = CliError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.code_str(), "ROWSPLICE_CLI_IO_ERROR");
    }
}
