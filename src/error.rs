//! Error handling for linecompress
//!
//! This module provides error types and result aliases for log directory operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::shard::ShardError;

/// Errors that can occur in log directory operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, detected at construction
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected caller input, such as a line containing a newline
    #[error("Input error: {0}")]
    Input(String),

    /// The shard index space of the configured depth is exhausted
    #[error("Capacity error: {0}")]
    Capacity(String),

    /// The shard tree holds something this crate never writes
    #[error("Unexpected state for {path:?}: {message}")]
    UnexpectedState {
        path: PathBuf,
        message: String,
    },

    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to compression
    #[error("Compression error: {0}")]
    Compression(String),

    /// The cross-process directory lock could not be taken or released
    #[error("Lock error: {0}")]
    Lock(String),

    /// Generic error type for other cases
    #[error("{0}")]
    Other(String),
}

/// Result type for log directory operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Create a new capacity error
    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity(message.into())
    }

    /// Create a new unexpected state error
    pub fn unexpected_state(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::UnexpectedState {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new compression error
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression(message.into())
    }

    /// Create a new lock error
    pub fn lock(message: impl Into<String>) -> Self {
        Self::Lock(message.into())
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Check if this is a capacity error
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }

    /// Check if this is an unexpected state error
    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, Self::UnexpectedState { .. })
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Get a developer-friendly description of the error
    pub fn dev_description(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration error: {}", msg),
            Self::Input(msg) => format!("Input error: {}", msg),
            Self::Capacity(msg) => format!("Capacity error: {}", msg),
            Self::UnexpectedState { path, message } => {
                format!("Unexpected state for {:?}: {}", path, message)
            }
            Self::Io(err) => format!("I/O error: {}", err),
            Self::Serialization(err) => format!("Serialization error: {}", err),
            Self::Compression(msg) => format!("Compression error: {}", msg),
            Self::Lock(msg) => format!("Lock error: {}", msg),
            Self::Other(msg) => format!("Error: {}", msg),
        }
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Input(_) => {
                Some("Split the text into separate lines before adding it".to_string())
            }
            Self::Capacity(_) => {
                Some(
                    "Use more subdirectories or a larger byte threshold for this volume of data"
                        .to_string(),
                )
            }
            Self::UnexpectedState { .. } => {
                Some(
                    "Remove files that were placed into the log directory by other programs"
                        .to_string(),
                )
            }
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                Some("The specified file or directory does not exist".to_string())
            }
            Self::Io(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                Some("You don't have permission to access this file or directory".to_string())
            }
            Self::Compression(_) => Some(
                "A compressed shard is damaged. Consider restoring it from a backup".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<ShardError> for Error {
    fn from(err: ShardError) -> Self {
        match err {
            ShardError::Capacity(msg) => Self::Capacity(msg),
            ShardError::UnexpectedState { path, message } => {
                Self::UnexpectedState { path, message }
            }
            ShardError::InvalidLine(msg) => Self::Input(msg),
            ShardError::InvalidPath { path, message } => Self::UnexpectedState { path, message },
            ShardError::InvalidSegments(msg) => Self::Input(msg),
            ShardError::Io(err) => Self::Io(err),
            ShardError::File { path, message } => {
                Self::Other(format!("File error for {:?}: {}", path, message))
            }
            ShardError::Compression(msg) => Self::Compression(msg),
            ShardError::Other(msg) => Self::Other(msg),
        }
    }
}

impl From<Error> for ShardError {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => Self::Io(err),
            Error::Compression(msg) => Self::Compression(msg),
            Error::Capacity(msg) => Self::Capacity(msg),
            Error::UnexpectedState { path, message } => Self::UnexpectedState { path, message },
            Error::Input(msg) => Self::InvalidLine(msg),
            Error::Serialization(err) => Self::Io(err.into()),
            Error::Lock(msg) => Self::Io(io::Error::new(io::ErrorKind::Other, msg)),
            Error::Config(msg) => Self::Other(format!("Configuration error: {}", msg)),
            Error::Other(msg) => Self::Other(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = Error::config("byte threshold must be positive");
        assert!(err.is_config_error());

        let err = Error::unexpected_state("/logs/000/001.zip", "unknown suffix");
        assert!(matches!(err, Error::UnexpectedState { .. }));
        assert!(err.is_unexpected_state());

        let err = Error::input("line contains a newline");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err = Error::from(io_err);
        assert!(err.is_io_error());

        let err = Error::from(ShardError::capacity("999/999/999"));
        assert!(err.is_capacity_error());

        let err = Error::from(ShardError::invalid_line("embedded newline"));
        assert!(err.is_input_error());

        let err = Error::from(ShardError::invalid_path(
            "/logs/xyz/001.txt",
            "xyz is not a segment",
        ));
        assert!(matches!(
            &err,
            Error::UnexpectedState { path, .. } if path == Path::new("/logs/xyz/001.txt")
        ));

        let err = Error::from(ShardError::invalid_segments("segment 1000 is out of range"));
        assert!(err.is_input_error());

        let back = ShardError::from(Error::lock("held elsewhere"));
        assert!(back.is_io_error());

        let back = ShardError::from(Error::config("bad depth"));
        assert!(matches!(&back, ShardError::Other(msg) if msg.contains("bad depth")));

        let back = ShardError::from(Error::compression("bad header"));
        assert!(matches!(back, ShardError::Compression(_)));
    }

    #[test]
    fn test_error_description_and_suggestion() {
        let err = Error::capacity("all segments are 999");
        assert!(err.dev_description().contains("Capacity error"));
        assert!(err.suggestion().unwrap().contains("subdirectories"));

        let err = Error::compression("crc mismatch");
        assert!(err.suggestion().unwrap().contains("backup"));

        assert!(Error::other("anything").suggestion().is_none());
    }
}
