//! Disposition: evaluates pending task records and moves them on.
//!
//! A flagged task is rewritten in place as `awaiting_approval`. A task the
//! policy lets through is marked `completed`, written to `Done/` under a
//! fresh name, and only then removed from `Needs_Action/`.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::VaultConfig;
use crate::context::ServiceContext;
use crate::error::DisposeError;
use crate::naming;
use crate::policy::{PolicyEngine, Verdict};
use crate::ports::Activity;
use crate::task::{TaskDocument, TaskStatus};
use crate::vault::Vault;

/// How a single task was disposed of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Auto-completed and relocated.
    Completed {
        /// Path of the record in `Done/`.
        destination: PathBuf,
    },
    /// Left in `Needs_Action/` for a human.
    ApprovalNeeded {
        /// The policy's explanation.
        reason: String,
    },
}

/// Names of the tasks a sweep handled, per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tasks moved to `Done/`.
    pub completed: Vec<String>,
    /// Tasks flagged for approval.
    pub flagged: Vec<String>,
    /// Tasks that hit an error.
    pub failed: Vec<String>,
}

impl SweepReport {
    /// Total number of tasks looked at.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed.len() + self.flagged.len() + self.failed.len()
    }
}

/// The disposition stage.
pub struct DisposeStage<'a> {
    ctx: &'a ServiceContext,
    vault: &'a Vault,
    policy: PolicyEngine,
    processor_id: String,
}

impl<'a> DisposeStage<'a> {
    /// Creates a stage over `vault`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, vault: &'a Vault, config: &VaultConfig) -> Self {
        Self {
            ctx,
            vault,
            policy: PolicyEngine::new(config.approval_threshold),
            processor_id: config.processor_id.clone(),
        }
    }

    /// Markdown records in `Needs_Action/` whose status is `pending`, in name
    /// order. With `only`, just the record of that file name.
    ///
    /// Unreadable folders and records are logged and skipped.
    #[must_use]
    pub fn pending_tasks(&self, only: Option<&str>) -> Vec<PathBuf> {
        let dir = self.vault.needs_action();
        let names = match self.ctx.fs.list_files(&dir) {
            Ok(names) => names,
            Err(e) => {
                error!(folder = %dir.display(), error = %e, "cannot list Needs_Action");
                return Vec::new();
            }
        };

        let mut tasks = Vec::new();
        for name in names {
            let path = dir.join(&name);
            if path.extension() != Some(OsStr::new("md"))
                || only.is_some_and(|target| name.as_os_str() != OsStr::new(target))
            {
                continue;
            }
            match self.ctx.fs.read_to_string(&path) {
                Ok(text) => {
                    let doc = TaskDocument::parse(&text);
                    if doc.get("status") == Some(TaskStatus::Pending.as_str()) {
                        tasks.push(path);
                    }
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "cannot read task, skipping");
                }
            }
        }
        tasks
    }

    /// Evaluates one pending task and applies the resulting transition.
    ///
    /// # Errors
    ///
    /// Returns an error when the task cannot be read, is not pending, or
    /// cannot be written. The original record is untouched in those cases.
    /// [`DisposeError::OrphanedDuplicate`] means the completed copy exists in
    /// `Done/` but the original could not be removed.
    pub fn dispose(&self, task_path: &Path) -> Result<Disposition, DisposeError> {
        let fs = self.ctx.fs.as_ref();
        let text = fs
            .read_to_string(task_path)
            .map_err(|source| DisposeError::Read { path: task_path.to_path_buf(), source })?;
        let mut doc = TaskDocument::parse(&text);
        if !doc.has_header() {
            return Err(DisposeError::MissingHeader { path: task_path.to_path_buf() });
        }
        let raw_status = doc.get("status").unwrap_or_default().to_string();
        let status: TaskStatus = raw_status.parse().map_err(|_| DisposeError::UnknownStatus {
            path: task_path.to_path_buf(),
            status: raw_status,
        })?;

        let name = display_name(task_path);
        info!(
            "processing {name} (original: {})",
            doc.get("original").unwrap_or("unknown")
        );

        let now = self.ctx.clock.timestamp();
        match self.policy.evaluate(&text) {
            Verdict::NeedsApproval { reason, .. } => {
                let next = status.transition_to(TaskStatus::AwaitingApproval)?;
                warn!("approval needed for {name}: {reason}");
                doc.update_header([("status", next.as_str())]);
                doc.append_log(&format!("Flagged for approval: {reason}"), &now);
                fs.write(task_path, &doc.render()).map_err(|source| DisposeError::Write {
                    path: task_path.to_path_buf(),
                    source,
                })?;
                Ok(Disposition::ApprovalNeeded { reason })
            }
            Verdict::AutoApprove => {
                let next = status.transition_to(TaskStatus::Completed)?;
                doc.update_header([
                    ("status", next.as_str()),
                    ("completed", now.as_str()),
                    ("processed_by", self.processor_id.as_str()),
                ]);
                doc.append_log("Processed by reasoning loop; auto-completed", &now);
                doc.append_log(&format!("Status changed: {status} -> {next}"), &now);
                doc.append_log("Moved from /Needs_Action to /Done", &now);
                self.relocate(task_path, &doc.render())
            }
        }
    }

    fn relocate(&self, task_path: &Path, contents: &str) -> Result<Disposition, DisposeError> {
        let fs = self.ctx.fs.as_ref();
        let done = self.vault.done();
        let stem =
            task_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let destination =
            naming::write_unique(fs, &done, &stem, "md", contents).map_err(|source| {
                DisposeError::Write { path: done.join(format!("{stem}.md")), source }
            })?;
        info!("{} --> /Done/{}", display_name(task_path), display_name(&destination));

        if let Err(source) = self.remove_original(task_path) {
            return Err(DisposeError::OrphanedDuplicate {
                original: task_path.to_path_buf(),
                copy: destination,
                source,
            });
        }
        Ok(Disposition::Completed { destination })
    }

    /// Deletes the original record, retrying once. A record that is already
    /// gone counts as removed.
    fn remove_original(&self, task_path: &Path) -> io::Result<()> {
        let fs = self.ctx.fs.as_ref();
        let outcome = fs.remove_file(task_path).or_else(|first| {
            if first.kind() == io::ErrorKind::NotFound {
                return Err(first);
            }
            warn!(file = %task_path.display(), error = %first, "delete failed, retrying once");
            fs.remove_file(task_path)
        });
        match outcome {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    file = %task_path.display(),
                    "original already removed, possibly by another reasoning run"
                );
                Ok(())
            }
            other => other,
        }
    }

    /// Disposes of every pending task (or only the named one), then
    /// refreshes the dashboard. One task failing does not stop the others.
    pub fn sweep(&self, only: Option<&str>) -> SweepReport {
        let mut report = SweepReport::default();
        let tasks = self.pending_tasks(only);
        if tasks.is_empty() {
            info!("no pending tasks in /Needs_Action");
            return report;
        }
        info!("found {} pending task(s)", tasks.len());

        for task in &tasks {
            let name = display_name(task);
            match self.dispose(task) {
                Ok(Disposition::Completed { .. }) => report.completed.push(name),
                Ok(Disposition::ApprovalNeeded { .. }) => report.flagged.push(name),
                Err(e) => {
                    error!(file = %name, error = %e, "disposition failed");
                    report.failed.push(name);
                }
            }
        }

        let at = self.ctx.clock.now();
        let activity = report
            .completed
            .iter()
            .map(|n| Activity::new(at, "Reasoning Loop", format!("`{n}` processed -> /Done")))
            .chain(report.flagged.iter().map(|n| {
                Activity::new(at, "Needs Approval", format!("`{n}` flagged, awaiting human review"))
            }))
            .collect();
        super::publish(self.ctx, self.vault, activity);

        info!(
            completed = report.completed.len(),
            flagged = report.flagged.len(),
            failed = report.failed.len(),
            "reasoning loop complete"
        );
        if !report.completed.is_empty() {
            info!("done: {}", report.completed.join(", "));
        }
        if !report.flagged.is_empty() {
            warn!("flagged: {}", report.flagged.join(", "));
        }
        if !report.failed.is_empty() {
            error!("failed: {}", report.failed.join(", "));
        }
        report
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory::{test_context, MemoryFileSystem, RecordingDashboard};
    use crate::task::{encode, full_content, SourceContent};

    const NEEDS: &str = "/v/Needs_Action";

    fn setup() -> (ServiceContext, Arc<MemoryFileSystem>, Arc<RecordingDashboard>, Vault) {
        let (ctx, fs, dashboard) = test_context();
        let vault = Vault::new("/v");
        vault.ensure_layout(fs.as_ref()).unwrap();
        (ctx, fs, dashboard, vault)
    }

    fn drop_task(fs: &MemoryFileSystem, name: &str, original: &str, body: &str) -> PathBuf {
        let path = Path::new(NEEDS).join(name);
        let text = encode(original, "2025-03-01 09:00:00", SourceContent::Text(body.into()));
        fs.insert(&path, &text);
        path
    }

    #[test]
    fn flagged_task_stays_in_place() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "notes_processed.md", "notes.txt", "Pay invoice $250");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let outcome = stage.dispose(&path).unwrap();

        let Disposition::ApprovalNeeded { reason } = outcome else {
            panic!("expected approval, got {outcome:?}");
        };
        assert!(reason.contains("$250"));
        let doc = TaskDocument::parse(&fs.contents(&path).unwrap());
        assert_eq!(doc.get("status"), Some("awaiting_approval"));
        assert_eq!(doc.get("completed"), None);
        assert_eq!(doc.log_entries().len(), 2);
        assert!(doc.log_entries()[0].ends_with(&format!("Flagged for approval: {reason}")));
        assert!(fs.files_in("/v/Done").is_empty());
    }

    #[test]
    fn approved_task_moves_to_done() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "todo_processed.md", "todo.txt", "Buy coffee");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let outcome = stage.dispose(&path).unwrap();

        let destination = PathBuf::from("/v/Done/todo_processed.md");
        assert_eq!(outcome, Disposition::Completed { destination: destination.clone() });
        assert!(fs.files_in(NEEDS).is_empty());
        let text = fs.contents(&destination).unwrap();
        let doc = TaskDocument::parse(&text);
        let now = ctx.clock.timestamp();
        assert_eq!(doc.get("status"), Some("completed"));
        assert_eq!(doc.get("completed"), Some(now.as_str()));
        assert_eq!(doc.get("processed_by"), Some("reasoning-loop"));
        assert_eq!(doc.get("original"), Some("todo.txt"));
        assert_eq!(
            doc.log_entries()[..3],
            [
                format!("- [{now}] Moved from /Needs_Action to /Done"),
                format!("- [{now}] Status changed: pending -> completed"),
                format!("- [{now}] Processed by reasoning loop; auto-completed"),
            ]
        );
        assert_eq!(full_content(&text), Some("Buy coffee"));
    }

    #[test]
    fn completed_copy_does_not_overwrite_done() {
        let (ctx, fs, _, vault) = setup();
        fs.insert("/v/Done/todo_processed.md", "older");
        let path = drop_task(&fs, "todo_processed.md", "todo.txt", "Buy coffee");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let outcome = stage.dispose(&path).unwrap();

        assert_eq!(
            outcome,
            Disposition::Completed { destination: PathBuf::from("/v/Done/todo_processed_1.md") }
        );
        assert_eq!(fs.contents("/v/Done/todo_processed.md").as_deref(), Some("older"));
    }

    #[test]
    fn write_failure_leaves_original_untouched() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "todo_processed.md", "todo.txt", "Buy coffee");
        let before = fs.contents(&path);
        fs.fail_writes_under("/v/Done");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let err = stage.dispose(&path).unwrap_err();

        assert!(matches!(err, DisposeError::Write { .. }));
        assert_eq!(fs.contents(&path), before);
    }

    #[test]
    fn flag_write_failure_is_an_error() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "pay_processed.md", "pay.txt", "$900 rent");
        let before = fs.contents(&path);
        fs.fail_writes_under(NEEDS);
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        assert!(matches!(stage.dispose(&path), Err(DisposeError::Write { .. })));
        assert_eq!(fs.contents(&path), before);
    }

    #[test]
    fn delete_failure_reports_orphaned_duplicate() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "todo_processed.md", "todo.txt", "Buy coffee");
        fs.fail_removes_under(NEEDS);
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let err = stage.dispose(&path).unwrap_err();

        let DisposeError::OrphanedDuplicate { original, copy, .. } = err else {
            panic!("expected orphaned duplicate, got {err:?}");
        };
        assert_eq!(original, path);
        assert_eq!(copy, PathBuf::from("/v/Done/todo_processed.md"));
        assert!(fs.contents(&copy).is_some());
        assert!(fs.contents(&path).is_some());
    }

    #[test]
    fn transient_delete_failure_is_retried() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "todo_processed.md", "todo.txt", "Buy coffee");
        fs.fail_next_remove(&path, io::ErrorKind::PermissionDenied);
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let outcome = stage.dispose(&path).unwrap();

        assert_eq!(
            outcome,
            Disposition::Completed { destination: PathBuf::from("/v/Done/todo_processed.md") }
        );
        assert!(fs.files_in(NEEDS).is_empty());
        assert_eq!(fs.files_in("/v/Done"), ["todo_processed.md"]);
    }

    #[test]
    fn original_removed_elsewhere_is_not_an_orphan() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "todo_processed.md", "todo.txt", "Buy coffee");
        fs.fail_next_remove(&path, io::ErrorKind::NotFound);
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let outcome = stage.dispose(&path).unwrap();

        assert!(matches!(outcome, Disposition::Completed { .. }));
        assert!(fs.files_in(NEEDS).is_empty());
        assert_eq!(fs.files_in("/v/Done"), ["todo_processed.md"]);
    }

    #[test]
    fn only_pending_tasks_are_selected() {
        let (ctx, fs, _, vault) = setup();
        drop_task(&fs, "a_processed.md", "a.txt", "one");
        let flagged = drop_task(&fs, "b_processed.md", "b.txt", "two");
        let text = fs
            .contents(&flagged)
            .unwrap()
            .replace("status: pending", "status: awaiting_approval");
        fs.insert(&flagged, &text);
        fs.insert("/v/Needs_Action/notes.txt", "status: pending");
        fs.insert("/v/Needs_Action/plain.md", "no header");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        assert_eq!(stage.pending_tasks(None), [PathBuf::from("/v/Needs_Action/a_processed.md")]);
        assert!(stage.pending_tasks(Some("b_processed.md")).is_empty());
        assert_eq!(stage.pending_tasks(Some("a_processed.md")).len(), 1);
    }

    #[test]
    fn non_pending_task_is_rejected() {
        let (ctx, fs, _, vault) = setup();
        let path = Path::new("/v/Needs_Action/x.md");
        fs.insert(path, "---\nstatus: awaiting_approval\n---\n$500\n");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());
        assert!(matches!(stage.dispose(path), Err(DisposeError::Transition(_))));

        fs.insert(path, "---\nstatus: archived\n---\n");
        assert!(matches!(stage.dispose(path), Err(DisposeError::UnknownStatus { .. })));

        fs.insert(path, "no header\n");
        assert!(matches!(stage.dispose(path), Err(DisposeError::MissingHeader { .. })));
    }

    #[test]
    fn sweep_isolates_failures() {
        let (ctx, fs, dashboard, vault) = setup();
        drop_task(&fs, "a_processed.md", "a.txt", "Buy coffee");
        drop_task(&fs, "b_processed.md", "b.txt", "send the report to the external client");
        let unreadable = drop_task(&fs, "c_processed.md", "c.txt", "water plants");
        drop_task(&fs, "d_processed.md", "d.txt", "update my personal notes");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());
        let tasks = stage.pending_tasks(None);
        assert_eq!(tasks.len(), 4);
        fs.deny_read(&unreadable);

        let report = tasks.iter().fold(SweepReport::default(), |mut acc, t| {
            let name = display_name(t);
            match stage.dispose(t) {
                Ok(Disposition::Completed { .. }) => acc.completed.push(name),
                Ok(Disposition::ApprovalNeeded { .. }) => acc.flagged.push(name),
                Err(_) => acc.failed.push(name),
            }
            acc
        });

        assert_eq!(report.completed, ["a_processed.md", "d_processed.md"]);
        assert_eq!(report.flagged, ["b_processed.md"]);
        assert_eq!(report.failed, ["c_processed.md"]);
        assert_eq!(report.total(), 4);
        assert!(dashboard.updates().is_empty());
    }

    #[test]
    fn sweep_updates_dashboard_once() {
        let (ctx, fs, dashboard, vault) = setup();
        drop_task(&fs, "a_processed.md", "a.txt", "Buy coffee");
        drop_task(&fs, "b_processed.md", "b.txt", "delete the shared team folder");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        let report = stage.sweep(None);

        assert_eq!(report.completed, ["a_processed.md"]);
        assert_eq!(report.flagged, ["b_processed.md"]);
        let updates = dashboard.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].counts.needs_action, 1);
        assert_eq!(updates[0].counts.done, 1);
        let actions: Vec<_> = updates[0].activity.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(actions, ["Reasoning Loop", "Needs Approval"]);
    }

    #[test]
    fn second_sweep_is_a_no_op() {
        let (ctx, fs, dashboard, vault) = setup();
        drop_task(&fs, "b_processed.md", "b.txt", "$150 invoice");
        let stage = DisposeStage::new(&ctx, &vault, &VaultConfig::default());

        stage.sweep(None);
        let again = stage.sweep(None);

        assert_eq!(again, SweepReport::default());
        assert_eq!(dashboard.updates().len(), 1);
    }

    #[test]
    fn configured_threshold_and_processor_apply() {
        let (ctx, fs, _, vault) = setup();
        let path = drop_task(&fs, "rent_processed.md", "rent.txt", "$250 rent");
        let config = VaultConfig {
            approval_threshold: 500.0,
            processor_id: "night-shift".into(),
            ..VaultConfig::default()
        };
        let stage = DisposeStage::new(&ctx, &vault, &config);

        assert!(matches!(stage.dispose(&path), Ok(Disposition::Completed { .. })));
        let doc = TaskDocument::parse(&fs.contents("/v/Done/rent_processed.md").unwrap());
        assert_eq!(doc.get("processed_by"), Some("night-shift"));
    }
}
