//! # linecompress_rs
//!
//! An append-only log of text lines. Lines go into numbered shard files laid
//! out in a tree of three-digit folders under one root directory:
//!
//! ```text
//! logs/000/000/000.txt.gz
//! logs/000/000/001.txt.gz
//! logs/000/000/002.txt
//! ```
//!
//! The newest shard is plain text. Once it reaches the configured byte
//! threshold it is compressed with gzip and appending moves on to the next
//! number. Reading walks the shards in order, forwards or backwards.
//!
//! ```no_run
//! use linecompress_rs::{LinesDir, LinesDirConfig};
//!
//! # fn main() -> linecompress_rs::Result<()> {
//! let dir = LinesDir::with_config("/var/log/app", LinesDirConfig::new().with_subdirs(2))?;
//! dir.add("service started")?;
//!
//! for line in dir.read_lines(true).take(10) {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod config;
pub mod error;
pub mod metrics;
pub mod shard;
mod store;

pub use config::LinesDirConfig;
pub use error::{Error, Result};
pub use metrics::MetricsCollector;
pub use shard::{CompressOutcome, FileState, ShardFile, ShardPath};
pub use store::{LinesDir, LinesIter, LOCK_FILE_NAME};
