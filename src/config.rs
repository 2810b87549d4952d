//! Configuration for a lines directory
//!
//! This module provides the options that shape the shard tree and how shards
//! are written and compressed.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::error::{Result, Error};
use crate::shard::MAX_SUBDIRS;

/// Configuration options for a lines directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct LinesDirConfig {
    // Layout
    /// Folder levels between the root and the shard files
    pub subdirs: usize,
    /// Raw shard size in bytes at which it gets compressed
    pub byte_threshold: u64,

    // Compression
    /// Gzip level (1-9, higher = better compression).
    ///
    /// Full shards are compressed at the maximum ratio by default. A lower
    /// level trades archive size for faster rollover and leaves the format
    /// unchanged.
    pub compression_level: u32,

    // Reliability settings
    /// Hold an advisory lock on `<root>/.lock` while appending
    pub process_lock: bool,
    /// Whether to sync every append to disk
    pub sync_writes: bool,
}

impl Default for LinesDirConfig {
    fn default() -> Self {
        Self {
            subdirs: 2,
            byte_threshold: 1_000_000,
            compression_level: 9,
            process_lock: false,
            sync_writes: false,
        }
    }
}

impl LinesDirConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of folder levels
    pub fn with_subdirs(mut self, subdirs: usize) -> Self {
        self.subdirs = subdirs;
        self
    }

    /// Set the raw shard size that triggers compression
    pub fn with_byte_threshold(mut self, bytes: u64) -> Self {
        self.byte_threshold = bytes;
        self
    }

    /// Set the compression level. Anything below 9 gives up the best ratio.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set whether appends also lock the directory across processes
    pub fn with_process_lock(mut self, lock: bool) -> Self {
        self.process_lock = lock;
        self
    }

    /// Set whether to sync writes to disk immediately
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.subdirs > MAX_SUBDIRS {
            return Err(Error::config(format!(
                "Subdirectories must be between 0 and {}",
                MAX_SUBDIRS
            )));
        }

        if self.byte_threshold == 0 {
            return Err(Error::config("Byte threshold must be positive"));
        }

        if self.compression_level < 1 || self.compression_level > 9 {
            return Err(Error::config("Compression level must be between 1 and 9"));
        }

        Ok(())
    }

    /// Number of shards the configured tree can hold
    pub fn shard_capacity(&self) -> u64 {
        1000u64.saturating_pow(self.subdirs as u32 + 1)
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Lines Directory Configuration ===\n\n");

        result.push_str("Layout:\n");
        result.push_str(&format!("  Subdirectories: {}\n", self.subdirs));
        result.push_str(&format!("  Byte Threshold: {}\n", self.byte_threshold));
        result.push_str(&format!("  Shard Capacity: {}\n", self.shard_capacity()));

        result.push_str("\nCompression:\n");
        result.push_str(&format!("  Compression Level: {}\n", self.compression_level));

        result.push_str("\nReliability Settings:\n");
        result.push_str(&format!("  Process Lock: {}\n", self.process_lock));
        result.push_str(&format!("  Sync Writes: {}\n", self.sync_writes));

        result
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
