//! Error types for the shard module
//!
//! Defines error types specific to shard paths, tree lookups and shard files.

use std::path::PathBuf;
use std::io;
use thiserror::Error;

/// Errors that can occur during shard operations
#[derive(Error, Debug)]
pub enum ShardError {
    /// The shard index no longer fits the configured number of path segments
    #[error("Capacity exhausted: {0}")]
    Capacity(String),

    /// A numerically named entry carries a suffix that is not a shard suffix
    #[error("Unexpected shard state for {path:?}: {message}")]
    UnexpectedState {
        path: PathBuf,
        message: String,
    },

    /// A line handed to a shard contains a newline
    #[error("Invalid line: {0}")]
    InvalidLine(String),

    /// A file path could not be parsed as a numbered shard path
    #[error("Invalid shard path {path:?}: {message}")]
    InvalidPath {
        path: PathBuf,
        message: String,
    },

    /// Segments or depth outside what a shard path can hold
    #[error("Invalid segments: {0}")]
    InvalidSegments(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File error
    #[error("File error for {path:?}: {message}")]
    File {
        path: PathBuf,
        message: String,
    },

    /// Compression or decompression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Any other failure passed down from the façade
    #[error("{0}")]
    Other(String),
}

/// Result type for shard operations
pub type ShardResult<T> = std::result::Result<T, ShardError>;

impl ShardError {
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

    /// Create a new invalid line error
    pub fn invalid_line(message: impl Into<String>) -> Self {
        Self::InvalidLine(message.into())
    }

    /// Create a new invalid path error
    pub fn invalid_path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid segments error
    pub fn invalid_segments(message: impl Into<String>) -> Self {
        Self::InvalidSegments(message.into())
    }

    /// Create a new file error
    pub fn file_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new compression error
    pub fn compression_error(message: impl Into<String>) -> Self {
        Self::Compression(message.into())
    }

    /// Check if this is a capacity error
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity(_))
    }

    /// Check if this is an unexpected state error
    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, Self::UnexpectedState { .. })
    }

    /// Check if this is an invalid line error
    pub fn is_invalid_line(&self) -> bool {
        matches!(self, Self::InvalidLine(_))
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_error_creation() {
        let err = ShardError::unexpected_state("/root/000/001.zip", "unknown suffix");
        assert!(matches!(
            &err,
            ShardError::UnexpectedState { path, message }
                if path == &PathBuf::from("/root/000/001.zip") && message == "unknown suffix"
        ));
        assert!(err.is_unexpected_state());
        assert!(!err.is_capacity());

        let err = ShardError::capacity("999/999 is the last index");
        assert!(err.is_capacity());
        assert_eq!(err.to_string(), "Capacity exhausted: 999/999 is the last index");

        let err = ShardError::invalid_line("contains a newline");
        assert!(err.is_invalid_line());

        let err = ShardError::invalid_path("/root/abc/001.txt", "abc is not a segment");
        assert_eq!(
            err.to_string(),
            "Invalid shard path \"/root/abc/001.txt\": abc is not a segment"
        );
    }

    #[test]
    fn test_shard_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ShardError::from(io_err);

        assert!(matches!(err, ShardError::Io(_)));
        assert!(err.is_io_error());
    }
}
