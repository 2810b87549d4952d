use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use parking_lot::Mutex;

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::compression::GzipCompression;
use crate::config::LinesDirConfig;
use crate::error::{Error, Result};
use crate::metrics::MetricsCollector;
use crate::shard::decision::{resolve_in, CompressionTask};
use crate::shard::locate::{find_first, find_last, walk};
use crate::shard::{
    CompressOutcome, FileState, FsLister, NumericWalk, ShardFile, ShardName, WalkOrder,
};

/// Name of the cross-process lock file inside the root
pub const LOCK_FILE_NAME: &str = ".lock";

/// An append-only log of text lines stored as numbered shards under one root
pub struct LinesDir {
    /// Root of the shard tree
    root: PathBuf,
    /// Directory configuration
    config: LinesDirConfig,
    /// Serializes resolving the target and appending to it
    append_lock: Mutex<()>,
    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl LinesDir {
    /// Open a lines directory with default configuration
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::with_config(root, LinesDirConfig::default())
    }

    /// Open a lines directory with custom configuration.
    ///
    /// Nothing is created on disk until the first line is added.
    pub fn with_config<P: AsRef<Path>>(root: P, config: LinesDirConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            config,
            append_lock: Mutex::new(()),
            metrics: Arc::new(MetricsCollector::new()),
        })
    }

    /// Append one line.
    ///
    /// May compress the previous shard first when it has reached the byte
    /// threshold. Lines containing `'\n'` are rejected.
    pub fn add(&self, line: &str) -> Result<()> {
        if line.contains('\n') {
            return Err(Error::input("line must not contain a newline"));
        }

        let start = Instant::now();
        let _guard = self.append_lock.lock();
        let _dir_lock = self.lock_directory()?;

        let target = self.resolve_target()?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let written = ShardFile::open(&target)?
            .with_sync_writes(self.config.sync_writes)
            .append(line)?;

        self.metrics.record_append(written, start.elapsed());
        Ok(())
    }

    /// The raw file the next line would be appended to.
    ///
    /// Performs the same cleanup and compression as [`add`](Self::add) but
    /// writes nothing to the target itself.
    pub fn file_for_appending(&self) -> Result<PathBuf> {
        let _guard = self.append_lock.lock();
        let _dir_lock = self.lock_directory()?;
        self.resolve_target()
    }

    /// All lines ever added, oldest first, or newest first when `reverse` is set.
    ///
    /// Shards are loaded one at a time as the iterator advances. Every call
    /// starts a fresh scan of the tree.
    pub fn read_lines(&self, reverse: bool) -> LinesIter {
        let order = if reverse {
            WalkOrder::Descending
        } else {
            WalkOrder::Ascending
        };

        LinesIter {
            walk: walk(&self.root, self.config.subdirs, order),
            reverse,
            last_stem: None,
            pending: Vec::new().into_iter(),
            metrics: self.metrics.clone(),
            finished: false,
        }
    }

    /// The file with the greatest number in the tree, in whatever state it is
    pub fn numerically_last(&self) -> Result<Option<PathBuf>> {
        Ok(find_last(FsLister, &self.root, self.config.subdirs)?)
    }

    /// The file with the smallest number in the tree, in whatever state it is
    pub fn numerically_first(&self) -> Result<Option<PathBuf>> {
        Ok(find_first(FsLister, &self.root, self.config.subdirs)?)
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the configuration
    pub fn config(&self) -> &LinesDirConfig {
        &self.config
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    // Internal methods

    /// Take the cross-process lock when configured. Released when the file is dropped.
    fn lock_directory(&self) -> Result<Option<File>> {
        if !self.config.process_lock {
            return Ok(None);
        }

        fs::create_dir_all(&self.root)?;
        let path = self.root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        FileExt::lock_exclusive(&file)
            .map_err(|e| Error::lock(format!("Failed to lock {}: {}", path.display(), e)))?;

        Ok(Some(file))
    }

    /// Resolve the append target and carry out what the resolution asks for
    fn resolve_target(&self) -> Result<PathBuf> {
        let resolution = resolve_in(
            FsLister,
            live_raw_size,
            &self.root,
            self.config.subdirs,
            self.config.byte_threshold,
        )?;

        for artifact in &resolution.remove {
            self.remove_artifact(artifact);
        }

        if let Some(task) = &resolution.compress {
            self.compress(task)?;
        }

        debug!(target = %resolution.append_to.display(), "Resolved append target");
        Ok(resolution.append_to)
    }

    fn remove_artifact(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {
                self.metrics.increment_artifacts_removed();
                debug!(path = %path.display(), "Removed interrupted compression output");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not remove interrupted compression output"
                );
            }
        }
    }

    fn compress(&self, task: &CompressionTask) -> Result<()> {
        let start = Instant::now();
        let compressor = GzipCompression::new(self.config.compression_level);
        let outcome = ShardFile::open(&task.source)?.compress_to(&task.target, &compressor)?;

        match outcome {
            CompressOutcome::Compressed(stats) => {
                let duration = start.elapsed();
                self.metrics
                    .record_compaction(stats.original_size, stats.compressed_size, duration);
                info!(
                    source = %task.source.display(),
                    duration_ms = duration.as_millis() as u64,
                    "Shard rolled over"
                );
            }
            other => {
                self.metrics.increment_skipped_compactions();
                debug!(source = %task.source.display(), outcome = ?other, "Compression skipped");
            }
        }

        Ok(())
    }
}

/// Size of a raw shard that still takes appends.
///
/// `None` once the file is gone or its archive exists: another writer has
/// compressed it since the tree was listed.
fn live_raw_size(path: &Path) -> Option<u64> {
    let archived = ShardName::parse(path)
        .map(|name| name.compressed_path().exists())
        .unwrap_or(false);
    if archived {
        return None;
    }
    fs::metadata(path).ok().map(|meta| meta.len())
}

/// Lazy iterator over the lines of a [`LinesDir`]
pub struct LinesIter {
    walk: NumericWalk<FsLister>,
    reverse: bool,
    last_stem: Option<PathBuf>,
    pending: std::vec::IntoIter<String>,
    metrics: Arc<MetricsCollector>,
    finished: bool,
}

impl LinesIter {
    /// Load the next shard's lines into `pending`. Returns false once the tree is exhausted.
    fn load_next_shard(&mut self) -> Result<bool> {
        while let Some(path) = self.walk.next() {
            let path = path?;
            let name = match ShardName::parse(&path) {
                Ok(name) => name,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unknown file in shard tree"
                    );
                    continue;
                }
            };

            // Never authoritative, and the stem's other files come next to it
            if name.state() == FileState::InProgress {
                continue;
            }
            if self.last_stem.as_deref() == Some(name.stem()) {
                continue;
            }
            self.last_stem = Some(name.stem().to_path_buf());

            let mut lines = ShardFile::from_name(name).read_lines()?;
            if self.reverse {
                lines.reverse();
            }
            self.pending = lines.into_iter();
            return Ok(true);
        }
        Ok(false)
    }
}

impl Iterator for LinesIter {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.next() {
                self.metrics.add_lines_read(1);
                return Some(Ok(line));
            }
            if self.finished {
                return None;
            }

            match self.load_next_shard() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
