//! In-memory adapters for unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::context::ServiceContext;
use crate::ports::{Clock, Dashboard, DashboardUpdate, FileSystem};

#[derive(Default)]
struct State {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    failing_writes: Vec<PathBuf>,
    failing_removes: Vec<PathBuf>,
    next_remove: BTreeMap<PathBuf, io::ErrorKind>,
    failing_dirs: Vec<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
}

impl State {
    fn dir_known(&self, dir: &Path) -> bool {
        self.dirs.contains(dir) || self.files.keys().any(|k| k.parent() == Some(dir))
    }
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, format!("denied: {}", path.display()))
}

/// Filesystem held in memory, with per-path fault injection.
#[derive(Default)]
pub struct MemoryFileSystem {
    state: Mutex<State>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl AsRef<Path>, contents: &str) {
        self.insert_bytes(path, contents.as_bytes());
    }

    pub fn insert_bytes(&self, path: impl AsRef<Path>, contents: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(path.as_ref().to_path_buf(), contents.to_vec());
    }

    pub fn mkdir(&self, dir: impl AsRef<Path>) {
        self.state.lock().unwrap().dirs.insert(dir.as_ref().to_path_buf());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.files.get(path.as_ref()).map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn files_in(&self, dir: impl AsRef<Path>) -> Vec<String> {
        self.list_files(dir.as_ref())
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Writes to any path below `prefix` fail with `PermissionDenied`.
    pub fn fail_writes_under(&self, prefix: impl AsRef<Path>) {
        self.state.lock().unwrap().failing_writes.push(prefix.as_ref().to_path_buf());
    }

    /// Removing any path below `prefix` fails with `PermissionDenied`.
    pub fn fail_removes_under(&self, prefix: impl AsRef<Path>) {
        self.state.lock().unwrap().failing_removes.push(prefix.as_ref().to_path_buf());
    }

    /// The next removal of `path` fails with `kind`; later ones behave
    /// normally. With `NotFound` the file also disappears, as if another
    /// process deleted it first.
    pub fn fail_next_remove(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.state.lock().unwrap().next_remove.insert(path.as_ref().to_path_buf(), kind);
    }

    /// Creating `dir` fails with `PermissionDenied`.
    pub fn fail_mkdir(&self, dir: impl AsRef<Path>) {
        self.state.lock().unwrap().failing_dirs.push(dir.as_ref().to_path_buf());
    }

    /// Reading `path` fails with `PermissionDenied`.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        self.state.lock().unwrap().unreadable.insert(path.as_ref().to_path_buf());
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        if state.unreadable.contains(path) {
            return Err(denied(path));
        }
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.iter().any(|p| path.starts_with(p)) {
            return Err(denied(path));
        }
        state.files.insert(path.to_path_buf(), contents.as_bytes().to_vec());
        Ok(())
    }

    fn create_new(&self, path: &Path, contents: &str) -> io::Result<()> {
        if self.exists(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, path.display().to_string()));
        }
        self.write(path, contents)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.next_remove.remove(path) {
            if kind == io::ErrorKind::NotFound {
                state.files.remove(path);
            }
            return Err(io::Error::new(kind, format!("injected: {}", path.display())));
        }
        if state.failing_removes.iter().any(|p| path.starts_with(p)) {
            return Err(denied(path));
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dir_known(path)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        let state = self.state.lock().unwrap();
        if !state.dir_known(dir) {
            return Err(io::Error::new(io::ErrorKind::NotFound, dir.display().to_string()));
        }
        Ok(state
            .files
            .keys()
            .filter(|k| k.parent() == Some(dir))
            .filter_map(|k| k.file_name().map(ToOwned::to_owned))
            .collect())
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_dirs.iter().any(|p| p == dir) {
            return Err(denied(dir));
        }
        state.dirs.insert(dir.to_path_buf());
        Ok(())
    }
}

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Dashboard that keeps every update it receives.
#[derive(Default)]
pub struct RecordingDashboard {
    updates: Mutex<Vec<DashboardUpdate>>,
    fail: bool,
}

impl RecordingDashboard {
    pub fn failing() -> Self {
        Self { updates: Mutex::default(), fail: true }
    }

    pub fn updates(&self) -> Vec<DashboardUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl Dashboard for RecordingDashboard {
    fn record(&self, update: &DashboardUpdate) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::other("dashboard offline"));
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Context over fresh in-memory adapters, plus handles to inspect them.
pub fn test_context() -> (ServiceContext, Arc<MemoryFileSystem>, Arc<RecordingDashboard>) {
    let fs = Arc::new(MemoryFileSystem::new());
    let dashboard = Arc::new(RecordingDashboard::default());
    let ctx = ServiceContext::new(Arc::new(FixedClock::default()), fs.clone(), dashboard.clone());
    (ctx, fs, dashboard)
}
