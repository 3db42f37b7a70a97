//! Error types for the CSV reader and writer.
//!
//! - [`CsvError::Open`] - a file could not be opened (IOError)
//! - [`CsvError::Io`] - a read or write failed on an open handle
//! - [`CsvError::InvalidArgument`] - no handle and no filename (ArgumentError)
//! - [`CsvError::Config`] - dialect JSON text could not be parsed
//!
//! Dialect construction and encoding conversion never fail: invalid options
//! fall back to their defaults and conversion is best-effort.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Open Mode
// =============================================================================

/// Direction a byte stream was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Reading,
    Writing,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Reading => f.write_str("reading"),
            OpenMode::Writing => f.write_str("writing"),
        }
    }
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors raised by [`crate::CsvReader`], [`crate::CsvWriter`] and
/// [`crate::Dialect::from_json_str`].
#[derive(Debug, Error)]
pub enum CsvError {
    /// The file does not exist, is unreadable, or cannot be created.
    #[error("Could not open file {} for {mode}: {source}", path.display())]
    Open {
        path: PathBuf,
        mode: OpenMode,
        #[source]
        source: std::io::Error,
    },

    /// Read, write, seek or flush failed on an open handle.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller broke the reader/writer contract.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Dialect configuration text is not a JSON object.
    #[error("Invalid dialect configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl CsvError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CsvError::InvalidArgument(message.into())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_message() {
        let err = CsvError::Open {
            path: PathBuf::from("foobar.csv"),
            mode: OpenMode::Reading,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("foobar.csv"));
        assert!(msg.contains("for reading"));
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = CsvError::invalid_argument("the filename is not valid");
        assert_eq!(err.to_string(), "Invalid argument: the filename is not valid");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: CsvError = io_error.into();
        assert!(matches!(err, CsvError::Io(_)));
    }

    #[test]
    fn test_config_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: CsvError = json_err.into();
        assert!(err.to_string().starts_with("Invalid dialect configuration"));
    }
}
