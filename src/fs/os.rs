//! The real file system.
//!
//! On unix the directory is created with mode `0755` and files with mode
//! `0644` (both still subject to the process umask). Other platforms use the
//! standard library defaults.

use std::fs::{DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use super::FileSystem;

/// [`FileSystem`] backed by the operating system.
///
/// # Examples
///
/// ```rust
/// use statdir::fs::{FileSystem, OsFs};
///
/// let dir = std::env::temp_dir().join("statdir-doc-osfs");
/// OsFs.create_dir_all(&dir).unwrap();
/// OsFs.write_file(&dir.join("ROWS"), b"42").unwrap();
/// assert_eq!(std::fs::read_to_string(dir.join("ROWS")).unwrap(), "42");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(super::DIR_MODE);
        }
        builder.create(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(super::FILE_MODE);
        }
        let mut file = options.open(path)?;
        file.write_all(contents)
    }
}
