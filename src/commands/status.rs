//! `taskvault status` command.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::cli::VaultArgs;
use crate::context::ServiceContext;
use crate::ports::{FileSystem, FolderCounts};
use crate::task::TaskDocument;
use crate::vault::Vault;

/// One open task as shown by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct TaskRow {
    file: String,
    original: String,
    status: String,
    detected: String,
}

#[derive(Debug, Serialize)]
struct Report {
    vault: String,
    counts: FolderCounts,
    tasks: Vec<TaskRow>,
}

/// Execute the `status` command.
///
/// Displays folder counts and a table of every task record in
/// `Needs_Action/` with its original file, status and detection time.
///
/// # Errors
///
/// Returns an error string if a folder exists but cannot be listed, or if
/// JSON serialization fails.
pub fn run(args: &VaultArgs, json: bool) -> Result<(), String> {
    let vault = Vault::new(args.vault.clone());
    let ctx = ServiceContext::live(&vault);
    let report = collect(ctx.fs.as_ref(), &vault)?;

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    println!("Vault: {}", report.vault);
    println!(
        "Inbox: {}  Needs_Action: {}  Done: {}\n",
        report.counts.inbox, report.counts.needs_action, report.counts.done
    );
    if report.tasks.is_empty() {
        println!("No open tasks.");
        return Ok(());
    }

    let rows = &report.tasks;
    let file_width = rows.iter().map(|r| r.file.len()).max().unwrap_or(4).max(4);
    let original_width = rows.iter().map(|r| r.original.len()).max().unwrap_or(8).max(8);
    let status_width = rows.iter().map(|r| r.status.len()).max().unwrap_or(6).max(6);

    println!(
        "{:<file_width$}  {:<original_width$}  {:<status_width$}  DETECTED",
        "FILE", "ORIGINAL", "STATUS",
    );
    println!("{:-<file_width$}  {:-<original_width$}  {:-<status_width$}  {:-<8}", "", "", "", "");
    for row in rows {
        println!(
            "{:<file_width$}  {:<original_width$}  {:<status_width$}  {}",
            row.file, row.original, row.status, row.detected,
        );
    }

    println!("\n{} open task(s).", rows.len());
    Ok(())
}

fn collect(fs: &dyn FileSystem, vault: &Vault) -> Result<Report, String> {
    let counts = FolderCounts {
        inbox: list_or_empty(fs, &vault.inbox())?.len(),
        needs_action: list_or_empty(fs, &vault.needs_action())?.len(),
        done: list_or_empty(fs, &vault.done())?.len(),
    };

    let mut tasks = Vec::new();
    for raw in list_or_empty(fs, &vault.needs_action())? {
        let path = vault.needs_action().join(&raw);
        if path.extension() != Some(OsStr::new("md")) {
            continue;
        }
        let name = raw.to_string_lossy().into_owned();
        let row = match fs.read_to_string(&path) {
            Ok(text) => {
                let doc = TaskDocument::parse(&text);
                let field = |key: &str| doc.get(key).unwrap_or("-").to_string();
                TaskRow {
                    original: field("original"),
                    status: field("status"),
                    detected: field("detected"),
                    file: name,
                }
            }
            Err(e) => TaskRow {
                original: "-".into(),
                status: format!("unreadable ({})", e.kind()),
                detected: "-".into(),
                file: name,
            },
        };
        tasks.push(row);
    }

    Ok(Report { vault: vault.root().display().to_string(), counts, tasks })
}

fn list_or_empty(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<OsString>, String> {
    match fs.list_files(dir) {
        Ok(names) => Ok(names),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(format!("Failed to list {}: {e}", dir.display())),
    }
}
