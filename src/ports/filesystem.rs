//! Filesystem port for file I/O operations.

use std::ffi::OsString;
use std::io;
use std::path::Path;

/// Provides filesystem access for the vault folders.
///
/// Abstracting the filesystem allows stage logic to be tested against an
/// in-memory tree with injected failures. Writes are expected to be atomic:
/// another process never observes a partially written file.
pub trait FileSystem: Send + Sync {
    /// Reads the raw bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Reads a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidData`] when the bytes are not valid
    /// UTF-8, otherwise the underlying read error.
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Atomically writes `contents` to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Atomically creates `path` with `contents`.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::AlreadyExists`] if `path` is occupied, or
    /// any other error the write produces.
    fn create_new(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Removes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Returns `true` if the path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists the names of regular files directly inside `dir`, sorted.
    ///
    /// Names are returned as the OS reports them, including names that are
    /// not valid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing or cannot be read.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<OsString>>;

    /// Creates a directory and all missing parents.
    ///
    /// # Errors
    ///
    /// Returns an error if any component cannot be created.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
}
