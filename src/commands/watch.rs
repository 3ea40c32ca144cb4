//! `taskvault watch` command.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::runtime::Builder;
use tracing::{info, warn};

use super::Session;
use crate::cli::VaultArgs;
use crate::pipeline::{CycleReport, IngestStage};

/// Execute the `watch` command.
///
/// Polls `Inbox/` until Ctrl+C, or for a single cycle with `once`.
///
/// # Errors
///
/// Returns an error string if the vault cannot be prepared or the async
/// runtime cannot start.
pub fn run(
    args: &VaultArgs,
    verbose: bool,
    interval: Option<u64>,
    once: bool,
) -> Result<(), String> {
    let mut session = Session::open(args, verbose, "watcher")?;
    if let Some(secs) = interval {
        session.config.poll_interval_secs = secs;
    }
    let period = session.config.poll_interval();

    info!("vault: {}", session.vault.root().display());
    info!("watching: {}", session.vault.inbox().display());
    info!("output: {}", session.vault.needs_action().display());
    info!("log file: {}", session.vault.logs().join("watcher.log").display());
    info!("poll interval: {}s", period.as_secs());

    let mut stage = IngestStage::new(&session.ctx, &session.vault, &session.config);
    if once {
        print_cycle(&stage.run_cycle());
        return Ok(());
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    runtime.block_on(poll(&mut stage, period, tokio::signal::ctrl_c()));
    Ok(())
}

/// Runs a cycle every `period` until `shutdown` resolves.
///
/// The shutdown future is polled once before the first cycle so a Ctrl+C
/// handler is registered for the whole run, including the first cycle.
async fn poll<F>(stage: &mut IngestStage<'_>, period: Duration, shutdown: F) -> usize
where
    F: Future<Output = io::Result<()>>,
{
    tokio::pin!(shutdown);
    info!("watcher started, press Ctrl+C to stop");
    let mut cycles = 0;
    let early = tokio::select! {
        biased;
        signal = &mut shutdown => Some(signal),
        () = std::future::ready(()) => None,
    };
    if let Some(signal) = early {
        stopped(signal);
        return cycles;
    }
    loop {
        stage.run_cycle();
        cycles += 1;
        tokio::select! {
            () = tokio::time::sleep(period) => {}
            signal = &mut shutdown => {
                stopped(signal);
                break;
            }
        }
    }
    cycles
}

fn stopped(signal: io::Result<()>) {
    if let Err(e) = signal {
        warn!(error = %e, "cannot listen for Ctrl+C, stopping");
    }
    info!("watcher stopped");
}

fn print_cycle(report: &CycleReport) {
    for item in &report.ingested {
        println!("{} -> {}", item.source, item.task_path.display());
    }
    for (name, err) in &report.failed {
        println!("{name}: {err}");
    }
    println!("\n{} file(s) ingested, {} failed.", report.ingested.len(), report.failed.len());
}
