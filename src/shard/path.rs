//! Numeric shard path codec
//!
//! A shard index such as `1234567` is written to disk as a fixed number of
//! three-digit folder names, most significant first: with two subdirectories
//! it becomes `001/234/567`. The last segment is the file name and is the only
//! one that carries a suffix.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::shard::{ShardError, ShardResult};

/// Numeric base of one path segment
pub const SEGMENT_BASE: u64 = 1000;

/// Largest value a single segment may hold
pub const MAX_SEGMENT: u16 = 999;

/// Deepest supported tree. `1000^(5 + 1)` is the largest power of the
/// segment base that still fits in a `u64`.
pub const MAX_SUBDIRS: usize = 5;

/// Split an index into `width` base-1000 segments, most significant first.
///
/// Fails with a capacity error when the index needs more than `width` segments.
pub fn split_index(index: u64, width: usize) -> ShardResult<Vec<u16>> {
    let mut segments = Vec::with_capacity(width);
    let mut rest = index;
    while rest > 0 {
        segments.push((rest % SEGMENT_BASE) as u16);
        rest /= SEGMENT_BASE;
    }

    if segments.len() > width {
        segments.reverse();
        return Err(ShardError::capacity(format!(
            "index {} splits to {:?} which is longer than {} segments",
            index, segments, width
        )));
    }

    segments.resize(width, 0);
    segments.reverse();
    Ok(segments)
}

/// Combine base-1000 segments such as `[1, 234, 567]` back into `1234567`.
pub fn combine_segments(segments: &[u16]) -> ShardResult<u64> {
    segments.iter().try_fold(0u64, |acc, &segment| {
        if segment > MAX_SEGMENT {
            return Err(ShardError::invalid_segments(format!(
                "segment {} is out of range 0..={}",
                segment, MAX_SEGMENT
            )));
        }
        acc.checked_mul(SEGMENT_BASE)
            .and_then(|acc| acc.checked_add(u64::from(segment)))
            .ok_or_else(|| {
                ShardError::capacity(format!("segments {:?} overflow a 64-bit index", segments))
            })
    })
}

/// Leading decimal digits of a file or folder name, if any
pub fn num_prefix_str(name: &str) -> Option<&str> {
    let end = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    if end == 0 {
        None
    } else {
        Some(&name[..end])
    }
}

/// Numeric value of the leading digits of a name.
///
/// Names whose numeral does not fit a `u64` are treated as non-numeric.
pub fn num_prefix(name: &str) -> Option<u64> {
    num_prefix_str(name).and_then(|digits| digits.parse().ok())
}

/// Fixed-width base-1000 representation of a shard index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardPath {
    segments: Vec<u16>,
}

impl ShardPath {
    /// Create a shard path from explicit segments
    pub fn new(segments: Vec<u16>) -> ShardResult<Self> {
        if segments.is_empty() || segments.len() > MAX_SUBDIRS + 1 {
            return Err(ShardError::invalid_segments(format!(
                "a shard path needs 1..={} segments, got {}",
                MAX_SUBDIRS + 1,
                segments.len()
            )));
        }
        if let Some(bad) = segments.iter().find(|&&s| s > MAX_SEGMENT) {
            return Err(ShardError::invalid_segments(format!(
                "segment {} is out of range 0..={}",
                bad, MAX_SEGMENT
            )));
        }
        Ok(Self { segments })
    }

    /// Encode an index for a tree with `subdirs` folder levels
    pub fn encode(index: u64, subdirs: usize) -> ShardResult<Self> {
        if subdirs > MAX_SUBDIRS {
            return Err(ShardError::invalid_segments(format!(
                "{} subdirectories exceed the supported maximum of {}",
                subdirs, MAX_SUBDIRS
            )));
        }
        Self::new(split_index(index, subdirs + 1)?)
    }

    /// The all-zero path, e.g. `000/000/000`
    pub fn first(subdirs: usize) -> ShardResult<Self> {
        Self::encode(0, subdirs)
    }

    /// The logical index this path encodes
    pub fn index(&self) -> u64 {
        // Width and segment range are checked on construction, so this cannot overflow.
        self.segments
            .iter()
            .fold(0u64, |acc, &s| acc * SEGMENT_BASE + u64::from(s))
    }

    /// Segments, most significant first
    pub fn segments(&self) -> &[u16] {
        &self.segments
    }

    /// Number of folder levels above the file
    pub fn subdirs(&self) -> usize {
        self.segments.len() - 1
    }

    /// The path of the following index, at the same width
    pub fn next(&self) -> ShardResult<Self> {
        let width = self.segments.len();
        let next_index = self.index() + 1;
        split_index(next_index, width).map(|segments| Self { segments })
    }

    /// Render below `root` with `suffix` appended to the last segment
    pub fn render(&self, root: &Path, suffix: &str) -> PathBuf {
        let mut path = root.to_path_buf();
        let last = self.segments.len() - 1;
        for (i, segment) in self.segments.iter().enumerate() {
            if i == last {
                path.push(format!("{:03}{}", segment, suffix));
            } else {
                path.push(format!("{:03}", segment));
            }
        }
        path
    }

    /// Parse a rendered file path back into its root, segments and suffix.
    ///
    /// The file name contributes its numeric prefix, the `subdirs` parent
    /// folders must be plain numbers.
    pub fn from_path(file: &Path, subdirs: usize) -> ShardResult<(PathBuf, Self, String)> {
        let name = file_name_str(file)?;
        let digits = num_prefix_str(name).ok_or_else(|| {
            ShardError::invalid_path(file, "file name has no numeric prefix")
        })?;
        let suffix = name[digits.len()..].to_string();

        let mut segments = Vec::with_capacity(subdirs + 1);
        segments.push(parse_segment(digits, file)?);

        let mut current = file;
        for _ in 0..subdirs {
            current = current.parent().ok_or_else(|| {
                ShardError::invalid_path(
                    file,
                    format!("path is shallower than {} subdirectories", subdirs),
                )
            })?;
            segments.push(parse_segment(file_name_str(current)?, file)?);
        }
        segments.reverse();

        let root = current.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok((root, Self::new(segments)?, suffix))
    }
}

impl fmt::Display for ShardPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{:03}", segment)?;
        }
        Ok(())
    }
}

fn file_name_str(path: &Path) -> ShardResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ShardError::invalid_path(path, "no usable name"))
}

fn parse_segment(text: &str, file: &Path) -> ShardResult<u16> {
    match text.parse::<u16>() {
        Ok(value) if value <= MAX_SEGMENT => Ok(value),
        _ => Err(ShardError::invalid_path(
            file,
            format!("{:?} is not a segment in 0..={}", text, MAX_SEGMENT),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_index() {
        assert_eq!(split_index(123456789, 3).unwrap(), vec![123, 456, 789]);
        assert_eq!(split_index(12304560789, 4).unwrap(), vec![12, 304, 560, 789]);
        assert_eq!(split_index(123, 1).unwrap(), vec![123]);
        assert_eq!(split_index(123, 2).unwrap(), vec![0, 123]);
        assert_eq!(split_index(123, 3).unwrap(), vec![0, 0, 123]);
        assert_eq!(split_index(0, 3).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_split_index_too_long() {
        let err = split_index(1_000_000, 2).unwrap_err();
        assert!(err.is_capacity());
    }

    #[test]
    fn test_combine_segments() {
        assert_eq!(combine_segments(&[123, 456]).unwrap(), 123456);
        assert_eq!(combine_segments(&[1, 234, 567]).unwrap(), 1234567);
        assert_eq!(combine_segments(&[1]).unwrap(), 1);
        assert!(combine_segments(&[1000]).is_err());
    }

    #[test]
    fn test_num_prefix() {
        assert_eq!(num_prefix_str("321abc"), Some("321"));
        assert_eq!(num_prefix_str("5"), Some("5"));
        assert_eq!(num_prefix_str("x5"), None);
        assert_eq!(num_prefix_str(""), None);
        assert_eq!(num_prefix("007.txt.gz"), Some(7));
        assert_eq!(num_prefix(".lock"), None);
    }

    #[test]
    fn test_render() {
        let path = ShardPath::new(vec![5, 23]).unwrap();
        assert_eq!(path.render(Path::new("/path/to"), ""), PathBuf::from("/path/to/005/023"));
        assert_eq!(path.to_string(), "005/023");
    }

    #[test]
    fn test_first() {
        let root = Path::new("/path/to");
        assert_eq!(
            ShardPath::first(2).unwrap().render(root, ""),
            PathBuf::from("/path/to/000/000/000")
        );
        assert_eq!(
            ShardPath::first(5).unwrap().render(root, ""),
            PathBuf::from("/path/to/000/000/000/000/000/000")
        );
        assert_eq!(ShardPath::first(0).unwrap().render(root, ""), PathBuf::from("/path/to/000"));
        assert_eq!(
            ShardPath::first(2).unwrap().render(root, ".zip"),
            PathBuf::from("/path/to/000/000/000.zip")
        );
        assert_eq!(
            ShardPath::first(2).unwrap().render(Path::new(""), ""),
            PathBuf::from("000/000/000")
        );
    }

    #[test]
    fn test_too_deep() {
        assert!(ShardPath::first(MAX_SUBDIRS + 1).is_err());
        assert!(ShardPath::new(vec![0; MAX_SUBDIRS + 2]).is_err());
        assert!(ShardPath::new(vec![]).is_err());
        assert!(ShardPath::new(vec![1, 1000]).is_err());
    }

    #[test]
    fn test_from_path() {
        for (text, suffix) in [
            ("/path/to/123/456/789", ""),
            ("/path/to/123/456/789.zip", ".zip"),
            ("/path/to/123/456/789file.xz", "file.xz"),
            ("123/456/789", ""),
        ] {
            let file = Path::new(text);
            let (root, parsed, parsed_suffix) = ShardPath::from_path(file, 2).unwrap();
            assert_eq!(parsed.segments(), &[123, 456, 789]);
            assert_eq!(parsed_suffix, suffix);
            assert_eq!(parsed.render(&root, &parsed_suffix), file);
        }
    }

    #[test]
    fn test_from_path_rejects_non_numeric_parent() {
        let err = ShardPath::from_path(Path::new("/a/b/xyz/001.txt"), 1).unwrap_err();
        assert!(matches!(
            &err,
            ShardError::InvalidPath { path, .. } if path == Path::new("/a/b/xyz/001.txt")
        ));
        assert!(ShardPath::from_path(Path::new("/a/b/000/abc.txt"), 1).is_err());
        assert!(ShardPath::from_path(Path::new("001.txt"), 1).is_err());
    }

    #[test]
    fn test_next() {
        let cases = [
            ("/a/b/c/000/000/000.xz", "/a/b/c/000/000/001.xz"),
            ("/a/b/c/000/000/998.xz", "/a/b/c/000/000/999.xz"),
            ("/a/b/c/000/000/999.xz", "/a/b/c/000/001/000.xz"),
            ("/a/b/c/000/999/999.xz", "/a/b/c/001/000/000.xz"),
        ];
        for (from, to) in cases {
            let (root, path, suffix) = ShardPath::from_path(Path::new(from), 2).unwrap();
            assert_eq!(path.next().unwrap().render(&root, &suffix), PathBuf::from(to));
        }
    }

    #[test]
    fn test_next_too_large() {
        let (_, path, _) = ShardPath::from_path(Path::new("/a/b/c/999/999/998.xz"), 2).unwrap();
        let last = path.next().unwrap();
        assert_eq!(last.segments(), &[999, 999, 999]);

        let err = last.next().unwrap_err();
        assert!(err.is_capacity());
    }

    #[test]
    fn test_deepest_tree_holds_its_maximum() {
        let max = SEGMENT_BASE.pow(MAX_SUBDIRS as u32 + 1) - 1;
        let path = ShardPath::encode(max, MAX_SUBDIRS).unwrap();
        assert_eq!(path.segments(), &[999; MAX_SUBDIRS + 1]);
        assert_eq!(path.index(), max);
        assert!(path.next().unwrap_err().is_capacity());
    }

    proptest! {
        #[test]
        fn encode_then_index_is_identity(subdirs in 0usize..=MAX_SUBDIRS, seed in any::<u64>()) {
            let capacity = SEGMENT_BASE.pow(subdirs as u32 + 1);
            let index = seed % capacity;
            let path = ShardPath::encode(index, subdirs).unwrap();
            prop_assert_eq!(path.segments().len(), subdirs + 1);
            prop_assert_eq!(path.index(), index);
            prop_assert_eq!(combine_segments(path.segments()).unwrap(), index);
        }

        #[test]
        fn next_advances_by_one(subdirs in 0usize..=MAX_SUBDIRS, seed in any::<u64>()) {
            let capacity = SEGMENT_BASE.pow(subdirs as u32 + 1);
            let index = seed % (capacity - 1);
            let path = ShardPath::encode(index, subdirs).unwrap();
            let next = path.next().unwrap();
            prop_assert_eq!(next.index(), index + 1);
            prop_assert!(next > path);
        }

        #[test]
        fn rendered_path_parses_back(subdirs in 0usize..=3, index in 0u64..1_000_000) {
            prop_assume!(index < SEGMENT_BASE.pow(subdirs as u32 + 1));
            let root = Path::new("/logs");
            let path = ShardPath::encode(index, subdirs).unwrap();
            let rendered = path.render(root, ".txt.gz");
            let (parsed_root, parsed, suffix) = ShardPath::from_path(&rendered, subdirs).unwrap();
            prop_assert_eq!(parsed_root, root.to_path_buf());
            prop_assert_eq!(parsed, path);
            prop_assert_eq!(suffix, ".txt.gz");
        }
    }
}
