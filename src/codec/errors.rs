//! Codec error types
//!
//! Error codes:
//! - ROWSPLICE_CODEC_ENCODE_FAILED (ERROR severity)
//! - ROWSPLICE_CODEC_DECODE_FAILED (ERROR severity)
//! - ROWSPLICE_CODEC_IO_FAILED (ERROR severity)
//!
//! A failed encode writes nothing. A failed decode returns no record.

use std::fmt;
use std::io;

/// Codec error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorCode {
    /// A value or field has no valid encoding
    EncodeFailed,
    /// Stream is malformed, truncated or inconsistent
    DecodeFailed,
    /// Underlying reader or writer failed
    IoFailed,
}

impl CodecErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            CodecErrorCode::EncodeFailed => "ROWSPLICE_CODEC_ENCODE_FAILED",
            CodecErrorCode::DecodeFailed => "ROWSPLICE_CODEC_DECODE_FAILED",
            CodecErrorCode::IoFailed => "ROWSPLICE_CODEC_IO_FAILED",
        }
    }
}

impl fmt::Display for CodecErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Codec error with context
#[derive(Debug)]
pub struct CodecError {
    code: CodecErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl CodecError {
    /// Create an encode error
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::EncodeFailed,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create an encode error naming the offending field
    pub fn encode_failed_for(field: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::EncodeFailed,
            message: message.into(),
            details: Some(format!("field: {}", field)),
            source: None,
        }
    }

    /// Create a decode error
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::DecodeFailed,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a decode error with line number context
    pub fn decode_failed_at_line(line: usize, message: impl Into<String>) -> Self {
        Self {
            code: CodecErrorCode::DecodeFailed,
            message: message.into(),
            details: Some(format!("line: {}", line)),
            source: None,
        }
    }

    /// Create an I/O error
    pub fn io_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: CodecErrorCode::IoFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn code(&self) -> CodecErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
