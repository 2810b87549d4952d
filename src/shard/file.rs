//! Single shard file
//!
//! A shard is appended to as plain text and later replaced by a gzip copy.
//! Compression goes through an in-progress file that is renamed over the
//! final name, so readers only ever see the raw file, the compressed file, or
//! (for a short moment) both of them.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::compression::{
    CompressionStats, Compressor, Decompressor, GzipCompression, GzipDecompression,
};
use crate::shard::{FileState, ShardError, ShardName, ShardResult};

/// What a compression attempt ended with
#[derive(Debug, Clone, PartialEq)]
pub enum CompressOutcome {
    /// This call produced the compressed file
    Compressed(CompressionStats),
    /// The target already existed; another worker finished first
    AlreadyCompressed,
    /// The raw source was gone before it could be read
    SourceMissing,
    /// The in-progress file could not be renamed into place
    LostRace,
}

impl CompressOutcome {
    /// Whether this call wrote the compressed file
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

/// One shard, addressed by its stem
#[derive(Debug, Clone)]
pub struct ShardFile {
    name: ShardName,
    sync_writes: bool,
}

impl ShardFile {
    /// Open a shard by any of its file names (`.txt`, `.txt.gz` or `.txt.gz.tmp`)
    pub fn open(path: impl AsRef<Path>) -> ShardResult<Self> {
        Ok(Self::from_name(ShardName::parse(path.as_ref())?))
    }

    /// Open a shard from an already classified name
    pub fn from_name(name: ShardName) -> Self {
        Self {
            name,
            sync_writes: false,
        }
    }

    /// Sync file data after every append
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn name(&self) -> &ShardName {
        &self.name
    }

    pub fn raw_path(&self) -> PathBuf {
        self.name.raw_path()
    }

    pub fn compressed_path(&self) -> PathBuf {
        self.name.compressed_path()
    }

    pub fn in_progress_path(&self) -> PathBuf {
        self.name.in_progress_path()
    }

    /// Append one line to the raw file. Returns the number of bytes written.
    ///
    /// The line and its terminator go out in a single append-mode write.
    pub fn append(&self, line: &str) -> ShardResult<u64> {
        if line.contains('\n') {
            return Err(ShardError::invalid_line("line must not contain a newline"));
        }

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let path = self.raw_path();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(record.as_bytes())?;
        if self.sync_writes {
            file.sync_data()?;
        }

        Ok(record.len() as u64)
    }

    /// Whether the compressed file exists
    pub fn is_compressed(&self) -> bool {
        self.compressed_path().exists()
    }

    /// Size on disk of the compressed file if present, else of the raw file, else zero
    pub fn size(&self) -> u64 {
        [self.compressed_path(), self.raw_path()]
            .iter()
            .find_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .unwrap_or(0)
    }

    /// All lines of the shard, whether it is compressed yet or not.
    ///
    /// A shard with neither file reads as empty.
    pub fn read_lines(&self) -> ShardResult<Vec<String>> {
        if let Some(lines) = self.read_compressed()? {
            return Ok(lines);
        }

        match fs::read(self.raw_path()) {
            Ok(bytes) => Ok(split_lines(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // The raw file may have been compressed and removed since we looked
                Ok(self.read_compressed()?.unwrap_or_default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_compressed(&self) -> ShardResult<Option<Vec<String>>> {
        let path = self.compressed_path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::new();
        GzipDecompression
            .decompress_stream(&mut BufReader::new(file), &mut bytes)
            .map_err(|e| ShardError::file_error(&path, e.to_string()))?;
        Ok(Some(split_lines(&bytes)))
    }

    /// Compress the raw file to the shard's own compressed name at maximum ratio
    pub fn compress(&self) -> ShardResult<CompressOutcome> {
        self.compress_to(&self.compressed_path(), &GzipCompression::best())
    }

    /// Compress the raw file into `target`.
    ///
    /// Safe to call from several workers at once. Each worker holds an
    /// exclusive advisory lock on the in-progress file while it writes, and
    /// whoever finds `target` already present once it holds the lock backs
    /// off. Failure to rename the output or to delete the source is taken as
    /// another worker having got there first and is not reported as an error.
    pub fn compress_to(
        &self,
        target: &Path,
        compressor: &dyn Compressor,
    ) -> ShardResult<CompressOutcome> {
        let source = self.raw_path();
        let in_progress = self.in_progress_path();

        // Not truncated here: another worker may still be writing into it
        let output = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&in_progress)?;
        FileExt::lock_exclusive(&output)?;

        if target.exists() {
            drop(output);
            discard(&in_progress);
            debug!(target = %target.display(), "Shard already compressed");
            return Ok(CompressOutcome::AlreadyCompressed);
        }

        let input = match File::open(&source) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                drop(output);
                discard(&in_progress);
                debug!(source = %source.display(), "Shard source vanished before compression");
                return Ok(CompressOutcome::SourceMissing);
            }
            Err(e) => return Err(e.into()),
        };

        // Drop whatever a crashed compactor left behind
        output.set_len(0)?;
        let mut writer = BufWriter::new(output);
        let original_size = compressor
            .compress_stream(&mut BufReader::new(input), &mut writer)
            .map_err(ShardError::from)?;
        let output = writer
            .into_inner()
            .map_err(|e| ShardError::Io(e.into_error()))?;
        output.sync_all()?;
        let compressed_size = output.metadata()?.len();

        // The lock on `output` is held until the source is gone
        if let Err(e) = fs::rename(&in_progress, target) {
            warn!(
                from = %in_progress.display(),
                to = %target.display(),
                error = %e,
                "Could not move compressed shard into place, assuming a concurrent compactor"
            );
            return Ok(CompressOutcome::LostRace);
        }

        if let Err(e) = fs::remove_file(&source) {
            warn!(
                source = %source.display(),
                error = %e,
                "Could not remove compressed shard source, assuming a concurrent compactor"
            );
        }

        let stats = CompressionStats::new(original_size, compressed_size, compressor.level());
        info!(
            shard = %self.name.stem().display(),
            original = stats.original_size,
            compressed = stats.compressed_size,
            ratio = stats.ratio,
            "Compressed shard"
        );
        Ok(CompressOutcome::Compressed(stats))
    }

    /// Current state of the shard on disk, preferring the compressed file
    pub fn state(&self) -> Option<FileState> {
        if self.is_compressed() {
            Some(FileState::Compressed)
        } else if self.raw_path().exists() {
            Some(FileState::Raw)
        } else {
            None
        }
    }
}

/// Remove a leftover file, ignoring failure
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Could not remove leftover file");
        }
    }
}

/// Split shard content into lines, dropping the empty piece after the final newline
fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if lines.last().map_or(false, |last| last.is_empty()) {
        lines.pop();
    }
    lines
}
