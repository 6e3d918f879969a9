//! In-memory file system.
//!
//! [`MemoryFs`] keeps directories and files in maps behind a mutex. Handles
//! are cheap to clone and share the same storage, so a test can hand one
//! clone to a [`Collector`](crate::Collector) and inspect the files through
//! another.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::FileSystem;

#[derive(Debug, Default)]
struct Store {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    store: Mutex<Store>,
    fail_create_dir: AtomicBool,
    fail_writes: AtomicBool,
}

/// [`FileSystem`] that never touches the disk.
///
/// Writes to a file whose parent directory was never created fail with
/// [`io::ErrorKind::NotFound`], like they would on a real file system.
///
/// # Examples
///
/// ```rust
/// use statdir::fs::{FileSystem, MemoryFs};
/// use std::path::Path;
///
/// let fs = MemoryFs::new();
/// fs.create_dir_all(Path::new("stats")).unwrap();
/// fs.write_file(Path::new("stats/ROWS"), b"3").unwrap();
///
/// assert_eq!(fs.read_to_string("stats/ROWS").as_deref(), Some("3"));
/// assert!(fs.write_file(Path::new("elsewhere/ROWS"), b"3").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    inner: Arc<Inner>,
}

impl MemoryFs {
    /// Creates an empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_dir_all` fail when `fail` is true.
    pub fn fail_create_dir(&self, fail: bool) {
        self.inner.fail_create_dir.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `write_file` fail when `fail` is true.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the content of the file at `path`, if it exists.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.store().files.get(path.as_ref()).cloned()
    }

    /// Returns the content of the file at `path` as UTF-8, if it exists.
    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.read(path)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Returns `true` if a file exists at `path`.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.store().files.contains_key(path.as_ref())
    }

    /// Returns `true` if the directory at `path` was created.
    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.store().dirs.contains(path.as_ref())
    }

    /// Returns the paths of all files, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.store().files.keys().cloned().collect()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileSystem for MemoryFs {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.inner.fail_create_dir.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "directory creation disabled",
            ));
        }
        let mut store = self.store();
        if store.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a file exists at this path",
            ));
        }
        for dir in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            store.dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "writes disabled",
            ));
        }
        let mut store = self.store();
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !store.dirs.contains(parent) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "parent directory does not exist",
                ));
            }
            _ => {}
        }
        store.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_all_registers_ancestors() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("a/b/c")).unwrap();
        assert!(fs.is_dir("a"));
        assert!(fs.is_dir("a/b"));
        assert!(fs.is_dir("a/b/c"));
    }

    #[test]
    fn test_write_requires_parent() {
        let fs = MemoryFs::new();
        let err = fs.write_file(Path::new("missing/FOO"), b"1").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!fs.exists("missing/FOO"));
    }

    #[test]
    fn test_write_overwrites() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("stats")).unwrap();
        fs.write_file(Path::new("stats/FOO"), b"100").unwrap();
        fs.write_file(Path::new("stats/FOO"), b"5").unwrap();
        assert_eq!(fs.read_to_string("stats/FOO").as_deref(), Some("5"));
        assert_eq!(fs.files(), vec![PathBuf::from("stats/FOO")]);
    }

    #[test]
    fn test_clones_share_storage() {
        let fs = MemoryFs::new();
        let other = fs.clone();
        other.create_dir_all(Path::new("stats")).unwrap();
        other.write_file(Path::new("stats/FOO"), b"1").unwrap();
        assert!(fs.exists("stats/FOO"));
    }

    #[test]
    fn test_failure_injection() {
        let fs = MemoryFs::new();
        fs.fail_create_dir(true);
        assert!(fs.create_dir_all(Path::new("stats")).is_err());
        fs.fail_create_dir(false);
        fs.create_dir_all(Path::new("stats")).unwrap();

        fs.fail_writes(true);
        assert!(fs.write_file(Path::new("stats/FOO"), b"1").is_err());
        fs.fail_writes(false);
        fs.write_file(Path::new("stats/FOO"), b"1").unwrap();
    }
}
