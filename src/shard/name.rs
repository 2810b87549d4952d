//! Shard file names
//!
//! Every shard has one stem (for example `/logs/000/000/007`) and at most one
//! live representation of its content next to it: the raw text file, the
//! compressed file, or an in-progress compression output.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::shard::{ShardError, ShardResult};

/// Suffix of a shard that is still being appended to
pub const RAW_SUFFIX: &str = ".txt";
/// Suffix of a finished, gzip-compressed shard
pub const COMPRESSED_SUFFIX: &str = ".txt.gz";
/// Suffix of a compression output that has not been renamed into place yet
pub const IN_PROGRESS_SUFFIX: &str = ".txt.gz.tmp";

/// On-disk lifecycle state of a shard file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileState {
    /// Plain text, open for appending
    Raw,
    /// Partially written compression output; never authoritative
    InProgress,
    /// Gzip-compressed, read-only
    Compressed,
}

impl FileState {
    /// All states, longest suffix first so that suffix matching is unambiguous
    pub const ALL: [FileState; 3] = [FileState::InProgress, FileState::Compressed, FileState::Raw];

    /// File name suffix for this state
    pub fn suffix(&self) -> &'static str {
        match self {
            FileState::Raw => RAW_SUFFIX,
            FileState::InProgress => IN_PROGRESS_SUFFIX,
            FileState::Compressed => COMPRESSED_SUFFIX,
        }
    }

    /// Split a file name into its stem and state
    pub fn split_name(name: &str) -> Option<(&str, FileState)> {
        Self::ALL.iter().find_map(|state| {
            name.strip_suffix(state.suffix()).map(|stem| (stem, *state))
        })
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Raw => write!(f, "raw"),
            FileState::InProgress => write!(f, "in-progress"),
            FileState::Compressed => write!(f, "compressed"),
        }
    }
}

/// A shard stem paired with the state of one of its files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardName {
    stem: PathBuf,
    state: FileState,
}

impl ShardName {
    /// Create a shard name from a stem and a state
    pub fn new(stem: impl Into<PathBuf>, state: FileState) -> Self {
        Self {
            stem: stem.into(),
            state,
        }
    }

    /// Classify a shard file path by its suffix.
    ///
    /// Fails with an unexpected state error when the suffix is none of the three
    /// shard suffixes.
    pub fn parse(path: &Path) -> ShardResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ShardError::unexpected_state(path, "file name is not valid UTF-8"))?;

        let (stem_name, state) = FileState::split_name(name).ok_or_else(|| {
            ShardError::unexpected_state(
                path,
                format!(
                    "expected a {}, {} or {} suffix",
                    RAW_SUFFIX, COMPRESSED_SUFFIX, IN_PROGRESS_SUFFIX
                ),
            )
        })?;

        Ok(Self {
            stem: path.with_file_name(stem_name),
            state,
        })
    }

    /// Path without any suffix
    pub fn stem(&self) -> &Path {
        &self.stem
    }

    /// State this name was parsed or created with
    pub fn state(&self) -> FileState {
        self.state
    }

    /// Full path of the file this name refers to
    pub fn path(&self) -> PathBuf {
        self.path_for(self.state)
    }

    /// The same stem in another state
    pub fn with_state(&self, state: FileState) -> Self {
        Self::new(self.stem.clone(), state)
    }

    /// Path of the stem's file in the given state
    pub fn path_for(&self, state: FileState) -> PathBuf {
        let mut name = OsString::from(self.stem.as_os_str());
        name.push(state.suffix());
        PathBuf::from(name)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.path_for(FileState::Raw)
    }

    pub fn compressed_path(&self) -> PathBuf {
        self.path_for(FileState::Compressed)
    }

    pub fn in_progress_path(&self) -> PathBuf {
        self.path_for(FileState::InProgress)
    }
}

impl fmt::Display for ShardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(
            FileState::split_name("something.txt.gz"),
            Some(("something", FileState::Compressed))
        );
        assert_eq!(FileState::split_name("something.txt"), Some(("something", FileState::Raw)));
        assert_eq!(
            FileState::split_name("something.txt.gz.tmp"),
            Some(("something", FileState::InProgress))
        );
        assert_eq!(FileState::split_name("something.jpg"), None);
    }

    #[test]
    fn test_parse_and_siblings() {
        let name = ShardName::parse(Path::new("/path/to/something.txt.gz")).unwrap();
        assert_eq!(name.stem(), Path::new("/path/to/something"));
        assert_eq!(name.state(), FileState::Compressed);

        assert_eq!(name.raw_path(), PathBuf::from("/path/to/something.txt"));
        assert_eq!(name.compressed_path(), PathBuf::from("/path/to/something.txt.gz"));
        assert_eq!(name.in_progress_path(), PathBuf::from("/path/to/something.txt.gz.tmp"));
        assert_eq!(name.path(), PathBuf::from("/path/to/something.txt.gz"));
    }

    #[test]
    fn test_with_state_keeps_stem() {
        let raw = ShardName::new("/logs/000/005", FileState::Raw);
        let done = raw.with_state(FileState::Compressed);
        assert_eq!(done.stem(), raw.stem());
        assert_eq!(done.path(), PathBuf::from("/logs/000/005.txt.gz"));
    }

    #[test]
    fn test_unknown_suffix_is_unexpected_state() {
        let err = ShardName::parse(Path::new("/logs/000/005.zip")).unwrap_err();
        assert!(err.is_unexpected_state());

        let err = ShardName::parse(Path::new("/logs/000/005")).unwrap_err();
        assert!(err.is_unexpected_state());
    }
}
