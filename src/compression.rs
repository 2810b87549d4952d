//! Compression utilities
//!
//! Full shards are stored as standard gzip streams so that any gzip tool can
//! read them. Compression streams from reader to writer; a shard is never
//! held in memory as a whole while it is being compressed.

use std::io::{self, Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Compression interface for shard content
pub trait Compressor: Send + Sync {
    /// Compress everything readable from `input` into `output`.
    ///
    /// Returns the number of uncompressed bytes consumed.
    fn compress_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64>;

    /// Get compression level
    fn level(&self) -> u32;

    /// Name of the format written
    fn name(&self) -> &'static str;
}

/// Decompression interface for shard content
pub trait Decompressor: Send + Sync {
    /// Decompress everything readable from `input` into `output`.
    ///
    /// Returns the number of decompressed bytes written.
    fn decompress_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64>;

    /// Decompress an in-memory buffer
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut input = data;
        self.decompress_stream(&mut input, &mut out)?;
        Ok(out)
    }
}

/// Gzip compression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipCompression {
    level: u32,
}

impl GzipCompression {
    /// Highest gzip level, best ratio
    pub const MAX_LEVEL: u32 = 9;

    /// Create a new gzip compressor with specified level (clamped to 1..=9)
    pub fn new(level: u32) -> Self {
        Self {
            level: level.clamp(1, Self::MAX_LEVEL),
        }
    }

    /// Gzip at maximum compression ratio
    pub fn best() -> Self {
        Self::new(Self::MAX_LEVEL)
    }
}

impl Default for GzipCompression {
    fn default() -> Self {
        Self::best()
    }
}

impl Compressor for GzipCompression {
    fn compress_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
        let mut encoder = GzEncoder::new(output, Compression::new(self.level));
        let consumed = io::copy(input, &mut encoder)?;
        encoder.finish()?;
        Ok(consumed)
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn name(&self) -> &'static str {
        "gzip"
    }
}

/// Gzip decompression. Concatenated gzip members are read as one stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipDecompression;

impl Decompressor for GzipDecompression {
    fn decompress_stream(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<u64> {
        let mut decoder = MultiGzDecoder::new(input);
        io::copy(&mut decoder, output).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::UnexpectedEof => {
                Error::compression(format!("corrupt gzip stream: {}", e))
            }
            _ => Error::Io(e),
        })
    }
}

/// Compression statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompressionStats {
    /// Original size in bytes
    pub original_size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Compression level used
    pub level: u32,
    /// Compression ratio (original / compressed)
    pub ratio: f64,
}

impl CompressionStats {
    /// Create new compression stats
    pub fn new(original_size: u64, compressed_size: u64, level: u32) -> Self {
        let ratio = if compressed_size > 0 {
            original_size as f64 / compressed_size as f64
        } else {
            1.0
        };

        Self {
            original_size,
            compressed_size,
            level,
            ratio,
        }
    }

    /// Calculate space savings as a percentage
    pub fn space_savings(&self) -> f64 {
        (1.0 - (1.0 / self.ratio)) * 100.0
    }
}

/// Utility functions for compression
pub mod util {
    use super::*;

    /// Gzip a buffer at the given level
    pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut input = data;
        GzipCompression::new(level).compress_stream(&mut input, &mut out)?;
        Ok(out)
    }

    /// Gunzip a buffer
    pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
        GzipDecompression.decompress(data)
    }

    /// Gzip a buffer and return compression statistics
    pub fn compress_with_stats(data: &[u8], level: u32) -> Result<(Vec<u8>, CompressionStats)> {
        let compressed = compress(data, level)?;
        let stats = CompressionStats::new(
            data.len() as u64,
            compressed.len() as u64,
            GzipCompression::new(level).level(),
        );
        Ok((compressed, stats))
    }
}
