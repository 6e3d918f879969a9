//! File-system abstraction used by the collection loop.
//!
//! The collector never touches the disk directly: every directory creation
//! and file write goes through a [`FileSystem`]. Two implementations ship
//! with the crate:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OsFs`] | The real file system (default) |
//! | [`MemoryFs`] | An in-memory store, for tests that must not touch disk |
//!
//! # Example
//!
//! ```rust
//! use statdir::fs::MemoryFs;
//! use statdir::Collector;
//!
//! let fs = MemoryFs::new();
//! let collector = Collector::with_file_system("stats", fs.clone()).with_counter("ROWS");
//! assert!(fs.files().is_empty());
//! # drop(collector);
//! ```

mod memory;
mod os;

pub use memory::MemoryFs;
pub use os::OsFs;

use std::fmt::Debug;
use std::io;
use std::path::Path;

/// Mode of the stats directory and its missing parents.
pub const DIR_MODE: u32 = 0o755;

/// Mode of every marker and counter file.
pub const FILE_MODE: u32 = 0o644;

/// The operations the collection loop needs from a file system.
///
/// Implementations must be shareable across threads: the loop performs the
/// writes, while tests usually keep a second handle to inspect the result.
pub trait FileSystem: Debug + Send + Sync {
    /// Creates `path` and all of its missing parents.
    ///
    /// Succeeds if the directory already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Replaces the whole content of the file at `path`, creating it if needed.
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

impl<F: FileSystem + ?Sized> FileSystem for Box<F> {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write_file(path, contents)
    }
}

impl<F: FileSystem + ?Sized> FileSystem for std::sync::Arc<F> {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir_all(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write_file(path, contents)
    }
}
