//! Numeric tree traversal
//!
//! Finds files such as `123/456/789.txt` ordered by the number their path
//! encodes, without walking the whole tree. To get the greatest one we take
//! the greatest folder of the root, then the greatest folder inside it, and so
//! on. Folders that turn out to be empty (or to hold nothing numeric) are
//! skipped by backing up one level and trying the next sibling.
//!
//! Only entries whose names start with a decimal numeral take part:
//! `555`, `555suffix` and `555.txt` are all seen as 555, `.lock` is ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::shard::path::num_prefix;
use crate::shard::ShardResult;

/// Source of directory listings for the traversal
pub trait DirLister {
    /// Names of the entries directly inside `dir`.
    ///
    /// A directory that does not exist, or a path that is not a directory,
    /// lists as empty.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

impl<L: DirLister + ?Sized> DirLister for &L {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).list(dir)
    }
}

/// Lists directories from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirLister for FsLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // Missing root, a folder removed under us, or a file where a folder was expected
            Err(_) if !dir.is_dir() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }
}

/// Direction of a numeric walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOrder {
    /// Smallest index first
    Ascending,
    /// Greatest index first
    Descending,
}

/// Keep names with a numeric prefix and sort them by that number.
///
/// Names sharing a number are ordered by name, so a descending walk meets
/// `7.txt.gz.tmp` before `7.txt.gz` before `7.txt`.
pub fn sorted_by_num_prefix(names: Vec<String>, order: WalkOrder) -> Vec<String> {
    let mut numbered: Vec<(u64, String)> = names
        .into_iter()
        .filter_map(|name| num_prefix(&name).map(|n| (n, name)))
        .collect();

    numbered.sort();
    if order == WalkOrder::Descending {
        numbered.reverse();
    }
    numbered.into_iter().map(|(_, name)| name).collect()
}

/// Lazy depth-first walk over the leaves of a numeric tree.
///
/// A folder is listed only when the walk descends into it, so finding the
/// first leaf costs roughly `depth` listings plus whatever empty folders are
/// in the way. Leaves are the numerically named entries `subdirs` levels below
/// the root; shallower entries are never yielded.
pub struct NumericWalk<L: DirLister> {
    lister: L,
    order: WalkOrder,
    subdirs: usize,
    root: Option<PathBuf>,
    stack: Vec<std::vec::IntoIter<PathBuf>>,
}

impl<L: DirLister> NumericWalk<L> {
    /// Start a walk. Nothing is listed until the first call to `next`.
    pub fn new(lister: L, root: impl Into<PathBuf>, subdirs: usize, order: WalkOrder) -> Self {
        Self {
            lister,
            order,
            subdirs,
            root: Some(root.into()),
            stack: Vec::new(),
        }
    }

    fn children(&self, dir: &Path) -> ShardResult<std::vec::IntoIter<PathBuf>> {
        let names = self.lister.list(dir)?;
        Ok(sorted_by_num_prefix(names, self.order)
            .into_iter()
            .map(|name| dir.join(name))
            .collect::<Vec<_>>()
            .into_iter())
    }

    fn descend(&mut self, dir: &Path) -> ShardResult<()> {
        let children = self.children(dir)?;
        self.stack.push(children);
        Ok(())
    }
}

impl<L: DirLister> Iterator for NumericWalk<L> {
    type Item = ShardResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            if let Err(e) = self.descend(&root) {
                return Some(Err(e));
            }
        }

        loop {
            let level = self.stack.len();
            let entry = match self.stack.last_mut()?.next() {
                Some(entry) => entry,
                None => {
                    // Exhausted this folder, back up to the parent
                    self.stack.pop();
                    continue;
                }
            };

            if level > self.subdirs {
                return Some(Ok(entry));
            }

            if let Err(e) = self.descend(&entry) {
                self.stack.clear();
                return Some(Err(e));
            }
        }
    }
}

/// Walk the shard tree under `root` in the given order
pub fn walk(root: &Path, subdirs: usize, order: WalkOrder) -> NumericWalk<FsLister> {
    NumericWalk::new(FsLister, root, subdirs, order)
}

/// Leaf with the greatest numeric path, if any
pub fn find_last<L: DirLister>(
    lister: L,
    root: &Path,
    subdirs: usize,
) -> ShardResult<Option<PathBuf>> {
    NumericWalk::new(lister, root, subdirs, WalkOrder::Descending)
        .next()
        .transpose()
}

/// Leaf with the smallest numeric path, if any
pub fn find_first<L: DirLister>(
    lister: L,
    root: &Path,
    subdirs: usize,
) -> ShardResult<Option<PathBuf>> {
    NumericWalk::new(lister, root, subdirs, WalkOrder::Ascending)
        .next()
        .transpose()
}
