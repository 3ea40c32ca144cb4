//! Collision-free destination names.
//!
//! Paths are checked against the filesystem on every call; nothing is cached,
//! so two stages (or two runs of one stage) never hand out a path that is
//! already occupied.

use std::io;
use std::path::{Path, PathBuf};

use crate::ports::FileSystem;

fn candidate(dir: &Path, stem: &str, extension: &str, attempt: usize) -> PathBuf {
    let name = match (attempt, extension.is_empty()) {
        (0, true) => stem.to_string(),
        (0, false) => format!("{stem}.{extension}"),
        (n, true) => format!("{stem}_{n}"),
        (n, false) => format!("{stem}_{n}.{extension}"),
    };
    dir.join(name)
}

/// Returns `dir/stem.extension`, or the first free `dir/stem_N.extension`.
#[must_use]
pub fn resolve(fs: &dyn FileSystem, dir: &Path, stem: &str, extension: &str) -> PathBuf {
    (0..)
        .map(|attempt| candidate(dir, stem, extension, attempt))
        .find(|path| !fs.exists(path))
        .unwrap_or_else(|| candidate(dir, stem, extension, usize::MAX))
}

/// Resolves a free path and creates it with `contents`.
///
/// Creation refuses to replace an existing file, so a path claimed by
/// another process between check and write is skipped and the next free
/// name is tried.
///
/// # Errors
///
/// Returns the first write error that is not a lost race for the name.
pub fn write_unique(
    fs: &dyn FileSystem,
    dir: &Path,
    stem: &str,
    extension: &str,
    contents: &str,
) -> io::Result<PathBuf> {
    loop {
        let path = resolve(fs, dir, stem, extension);
        match fs.create_new(&path, contents) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(
                    path = %path.display(),
                    "destination claimed concurrently, retrying"
                );
            }
            Err(e) => return Err(e),
        }
    }
}
