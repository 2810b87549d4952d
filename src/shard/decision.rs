//! Choosing the shard to append to
//!
//! [`AppendDecision::decide`] looks at a single candidate, the numerically
//! last file of the tree, and says what to do with it. [`resolve`] walks the
//! candidates from newest to oldest until one of them yields an append target.
//! Neither touches the filesystem: candidates and sizes are handed in, and the
//! caller carries out the removals and the compression the result asks for.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::shard::locate::{DirLister, NumericWalk, WalkOrder};
use crate::shard::name::RAW_SUFFIX;
use crate::shard::path::ShardPath;
use crate::shard::{FileState, ShardError, ShardName, ShardResult};

/// A raw shard that has to be compressed into `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionTask {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Outcome of looking at one candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendDecision {
    /// Raw file the next line goes to
    pub raw_to_append: Option<PathBuf>,
    /// Leftover of an interrupted compression
    pub file_to_remove: Option<PathBuf>,
    /// Full shard to compress
    pub compress: Option<CompressionTask>,
}

impl AppendDecision {
    /// Decide what to do given the numerically last file of the tree.
    ///
    /// `last_size` is the size of `last` when it is a live raw file. `None`
    /// means the raw file is gone or already has an archive, so a concurrent
    /// compactor owns it and the next shard is chosen instead. With no `last`
    /// the first shard under `root` is chosen.
    pub fn decide(
        root: &Path,
        subdirs: usize,
        last: Option<&Path>,
        last_size: Option<u64>,
        byte_threshold: u64,
    ) -> ShardResult<Self> {
        let last = match last {
            Some(last) => last,
            None => {
                return Ok(Self::append_to(ShardPath::first(subdirs)?.render(root, RAW_SUFFIX)));
            }
        };

        let name = ShardName::parse(last)?;
        match name.state() {
            FileState::Raw => match last_size {
                None => Ok(Self::append_to(next_raw(&name, subdirs)?)),
                Some(size) if size < byte_threshold => Ok(Self::append_to(last.to_path_buf())),
                Some(_) => Ok(Self {
                    raw_to_append: Some(next_raw(&name, subdirs)?),
                    file_to_remove: None,
                    compress: Some(CompressionTask {
                        source: name.raw_path(),
                        target: name.compressed_path(),
                    }),
                }),
            },
            FileState::Compressed => Ok(Self::append_to(next_raw(&name, subdirs)?)),
            FileState::InProgress => Ok(Self {
                file_to_remove: Some(last.to_path_buf()),
                ..Self::default()
            }),
        }
    }

    fn append_to(path: PathBuf) -> Self {
        Self {
            raw_to_append: Some(path),
            ..Self::default()
        }
    }
}

/// Raw file of the shard right after `name`
fn next_raw(name: &ShardName, subdirs: usize) -> ShardResult<PathBuf> {
    let raw = name.raw_path();
    let (root, path, _) = ShardPath::from_path(&raw, subdirs).map_err(|e| match e {
        ShardError::InvalidPath { path, message } => ShardError::unexpected_state(path, message),
        other => other,
    })?;
    Ok(path.next()?.render(&root, RAW_SUFFIX))
}

/// Everything needed to make the next append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Raw file to append to
    pub append_to: PathBuf,
    /// Leftovers walked past on the way, newest first
    pub remove: Vec<PathBuf>,
    /// Full shard to compress before appending
    pub compress: Option<CompressionTask>,
}

/// Run decisions over `candidates`, newest first, until one names an append target.
///
/// When the candidates run out the first shard of the tree is chosen.
/// `size_of` reports the size of a raw candidate, `None` when it has vanished
/// or its archive already exists.
pub fn resolve<I, F>(
    candidates: I,
    mut size_of: F,
    root: &Path,
    subdirs: usize,
    byte_threshold: u64,
) -> ShardResult<Resolution>
where
    I: IntoIterator<Item = ShardResult<PathBuf>>,
    F: FnMut(&Path) -> Option<u64>,
{
    let mut remove = Vec::new();

    for candidate in candidates {
        let candidate = candidate?;
        let size = size_of(&candidate);
        let decision =
            AppendDecision::decide(root, subdirs, Some(&candidate), size, byte_threshold)?;
        debug!(
            candidate = %candidate.display(),
            size = ?size,
            decision = ?decision,
            "Append decision"
        );

        if let Some(path) = decision.file_to_remove {
            remove.push(path);
        }
        if let Some(append_to) = decision.raw_to_append {
            return Ok(Resolution {
                append_to,
                remove,
                compress: decision.compress,
            });
        }
    }

    debug!(root = %root.display(), "No usable shard found, starting from the first one");
    Ok(Resolution {
        append_to: ShardPath::first(subdirs)?.render(root, RAW_SUFFIX),
        remove,
        compress: None,
    })
}

/// [`resolve`] over a descending walk of the tree listed by `lister`
pub fn resolve_in<L, F>(
    lister: L,
    size_of: F,
    root: &Path,
    subdirs: usize,
    byte_threshold: u64,
) -> ShardResult<Resolution>
where
    L: DirLister,
    F: FnMut(&Path) -> Option<u64>,
{
    let walk = NumericWalk::new(lister, root, subdirs, WalkOrder::Descending);
    resolve(walk, size_of, root, subdirs, byte_threshold)
}
