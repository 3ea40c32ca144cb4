//! The two pipeline stages.
//!
//! Ingestion wraps files dropped in `Inbox/` into pending task records in
//! `Needs_Action/`. Disposition evaluates pending records against the
//! approval policy and either completes them into `Done/` or flags them for
//! a human. The stages share nothing but the vault on disk.

pub mod dispose;
pub mod ingest;

pub use dispose::{DisposeStage, Disposition, SweepReport};
pub use ingest::{CycleReport, IngestStage, Ingested};

use tracing::{info, warn};

use crate::context::ServiceContext;
use crate::ports::{Activity, DashboardUpdate};
use crate::vault::Vault;

/// Pushes fresh counts plus `activity` to the dashboard. Failures are logged
/// and otherwise ignored.
fn publish(ctx: &ServiceContext, vault: &Vault, activity: Vec<Activity>) {
    let counts = match vault.counts(ctx.fs.as_ref()) {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "error counting folder contents, dashboard not updated");
            return;
        }
    };
    let update = DashboardUpdate { counts, activity, updated_at: ctx.clock.now() };
    match ctx.dashboard.record(&update) {
        Ok(()) => info!(
            inbox = counts.inbox,
            needs_action = counts.needs_action,
            done = counts.done,
            "dashboard updated"
        ),
        Err(e) => warn!(error = %e, "failed updating dashboard"),
    }
}
