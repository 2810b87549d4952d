//! Numbered shard management for line storage
//!
//! Lines are stored in shards that live in a tree of three-digit folders,
//! `000/000/000.txt`, `000/000/001.txt` and so on. The newest shard is plain
//! text and receives appends; once it reaches the size threshold it is
//! compressed to `.txt.gz` and a new shard is started at the next number.

pub mod decision;
mod error;
mod file;
pub mod locate;
mod name;
pub mod path;

pub use decision::{AppendDecision, CompressionTask, Resolution};
pub use error::{ShardError, ShardResult};
pub use file::{CompressOutcome, ShardFile};
pub use locate::{DirLister, FsLister, NumericWalk, WalkOrder};
pub use name::{FileState, ShardName, COMPRESSED_SUFFIX, IN_PROGRESS_SUFFIX, RAW_SUFFIX};
pub use path::{ShardPath, MAX_SUBDIRS};
