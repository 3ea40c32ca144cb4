//! `taskvault reason` command.

use tracing::info;

use super::Session;
use crate::cli::VaultArgs;
use crate::pipeline::{DisposeStage, SweepReport};

/// Execute the `reason` command.
///
/// Runs one disposition sweep over `Needs_Action/`, or over a single task
/// when `file` is given, and prints what happened to each task.
///
/// # Errors
///
/// Returns an error string if the vault cannot be prepared, or if `file`
/// names a task that is missing or not pending.
pub fn run(args: &VaultArgs, verbose: bool, file: Option<&str>) -> Result<(), String> {
    let session = Session::open(args, verbose, "reasoning")?;

    info!("vault: {}", session.vault.root().display());
    info!("source: {}", session.vault.needs_action().display());
    info!("destination: {}", session.vault.done().display());
    info!("log file: {}", session.vault.logs().join("reasoning.log").display());

    let stage = DisposeStage::new(&session.ctx, &session.vault, &session.config);
    if let Some(name) = file {
        if stage.pending_tasks(Some(name)).is_empty() {
            return Err(format!("No pending task named {name} in Needs_Action"));
        }
    }

    let report = stage.sweep(file);
    print_report(&report);
    Ok(())
}

fn print_report(report: &SweepReport) {
    if report.total() == 0 {
        println!("No pending tasks.");
        return;
    }
    for name in &report.completed {
        println!("completed  {name}");
    }
    for name in &report.flagged {
        println!("flagged    {name}");
    }
    for name in &report.failed {
        println!("failed     {name}");
    }
    println!(
        "\n{} completed, {} flagged, {} failed.",
        report.completed.len(),
        report.flagged.len(),
        report.failed.len()
    );
}
