//! Ingestion: turns files dropped in `Inbox/` into pending task records.

use std::collections::{BTreeSet, HashSet};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::VaultConfig;
use crate::context::ServiceContext;
use crate::error::IngestError;
use crate::naming;
use crate::ports::{Activity, FileSystem};
use crate::task::{self, SourceContent};
use crate::vault::Vault;

/// Suffix appended to the source stem to name its task record.
const TASK_SUFFIX: &str = "_processed";

/// Empty cycles between idle heartbeats.
const HEARTBEAT_EVERY: u64 = 6;

/// A file that became a task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
    /// Name of the dropped file.
    pub source: String,
    /// Where the task record was written.
    pub task_path: PathBuf,
    /// `false` when the record was written but the dropped file could not
    /// be deleted.
    pub source_removed: bool,
}

/// What one polling cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Files turned into task records.
    pub ingested: Vec<Ingested>,
    /// Files left in the inbox for a later cycle.
    pub failed: Vec<(String, IngestError)>,
}

/// The ingestion stage. Owns the memory of which inbox names it already
/// handled; that memory lives only as long as the stage.
pub struct IngestStage<'a> {
    ctx: &'a ServiceContext,
    vault: &'a Vault,
    ignored: BTreeSet<String>,
    processed: HashSet<OsString>,
    activity: Vec<Activity>,
    cycle: u64,
}

impl<'a> IngestStage<'a> {
    /// Creates a stage over `vault`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, vault: &'a Vault, config: &VaultConfig) -> Self {
        Self {
            ctx,
            vault,
            ignored: config.ignored_files.iter().cloned().collect(),
            processed: HashSet::new(),
            activity: Vec::new(),
            cycle: 0,
        }
    }

    /// `true` if `name` was already turned into a task by this stage.
    #[must_use]
    pub fn is_processed(&self, name: impl AsRef<OsStr>) -> bool {
        self.processed.contains(name.as_ref())
    }

    /// Inbox files that are neither housekeeping files nor already handled.
    ///
    /// A missing or unreadable inbox is logged and yields nothing.
    #[must_use]
    pub fn scan(&self) -> Vec<PathBuf> {
        let inbox = self.vault.inbox();
        let names = match self.ctx.fs.list_files(&inbox) {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!(inbox = %inbox.display(), "inbox folder missing");
                return Vec::new();
            }
            Err(e) => {
                error!(inbox = %inbox.display(), error = %e, "cannot scan inbox");
                return Vec::new();
            }
        };
        names
            .into_iter()
            .filter(|name| !self.is_ignored(name) && !self.processed.contains(name))
            .map(|name| inbox.join(name))
            .collect()
    }

    fn is_ignored(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| self.ignored.contains(n))
    }

    /// Wraps `source` into a task record in `Needs_Action/` and removes it
    /// from the inbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read for a reason other than
    /// binary content or permissions, or if the record cannot be written. The
    /// source is left in place in both cases.
    pub fn ingest(&mut self, source: &Path) -> Result<Ingested, IngestError> {
        let fs = self.ctx.fs.as_ref();
        let name = file_name(source);
        let content = read_source(fs, source, &name)?;

        let detected = self.ctx.clock.timestamp();
        let record = task::encode(&name, &detected, content);
        let stem = format!("{}{TASK_SUFFIX}", file_stem(&name));
        let dir = self.vault.needs_action();
        let task_path = naming::write_unique(fs, &dir, &stem, "md", &record)
            .map_err(|e| IngestError::Write { path: dir.join(format!("{stem}.md")), source: e })?;
        let task_name = file_name(&task_path);
        info!("{name} --> /Needs_Action/{task_name}");

        // The record is durable from here on; never ingest this name again.
        if let Some(raw) = source.file_name() {
            self.processed.insert(raw.to_os_string());
        }

        let source_removed = match fs.remove_file(source) {
            Ok(()) => true,
            Err(e) => {
                error!(
                    file = %name,
                    error = %e,
                    "cannot delete source, file was copied but not removed"
                );
                false
            }
        };

        self.activity.push(Activity::new(
            self.ctx.clock.now(),
            "Watcher Detect",
            format!("`{name}` -> `/Needs_Action/{task_name}`"),
        ));

        Ok(Ingested { source: name, task_path, source_removed })
    }

    /// One polling cycle: scan, ingest in name order, refresh the dashboard.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let mut found = self.scan();
        let mut report = CycleReport::default();
        if found.is_empty() {
            if self.cycle % HEARTBEAT_EVERY == 0 {
                debug!(cycle = self.cycle, "inbox empty, watching");
            }
            return report;
        }

        found.sort();
        info!(cycle = self.cycle, "found {} new file(s)", found.len());
        for source in found {
            match self.ingest(&source) {
                Ok(done) => report.ingested.push(done),
                Err(e) => {
                    error!(
                        file = %source.display(),
                        error = %e,
                        "ingestion failed, file left in inbox"
                    );
                    report.failed.push((file_name(&source), e));
                }
            }
        }

        let activity = std::mem::take(&mut self.activity);
        super::publish(self.ctx, self.vault, activity);
        report
    }
}

fn read_source(fs: &dyn FileSystem, path: &Path, name: &str) -> Result<SourceContent, IngestError> {
    match fs.read(path) {
        Ok(bytes) => Ok(String::from_utf8(bytes).map_or_else(
            |_| {
                warn!(file = %name, "binary file detected, storing as reference");
                SourceContent::Binary
            },
            SourceContent::Text,
        )),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            error!(file = %name, "permission denied reading");
            Ok(SourceContent::PermissionDenied)
        }
        Err(source) => Err(IngestError::Read { path: path.to_path_buf(), source }),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map_or_else(|| name.to_string(), |s| s.to_string_lossy().into_owned())
}
