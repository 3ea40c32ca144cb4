//! Service context bundling all port trait objects.

use std::sync::Arc;

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::dashboard::MarkdownDashboard;
use crate::adapters::live::filesystem::LiveFileSystem;
use crate::ports::{Clock, Dashboard, FileSystem};
use crate::vault::Vault;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Stages borrow the
/// context, so tests can hand them an in-memory filesystem, a fixed clock
/// and a recording dashboard.
#[derive(Clone)]
pub struct ServiceContext {
    /// Clock for timestamps in records and the dashboard.
    pub clock: Arc<dyn Clock>,
    /// Filesystem for all vault I/O.
    pub fs: Arc<dyn FileSystem>,
    /// Status document both stages report into.
    pub dashboard: Arc<dyn Dashboard>,
}

impl ServiceContext {
    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        fs: Arc<dyn FileSystem>,
        dashboard: Arc<dyn Dashboard>,
    ) -> Self {
        Self { clock, fs, dashboard }
    }

    /// Creates a live context: system clock, disk, and `Dashboard.md` in `vault`.
    #[must_use]
    pub fn live(vault: &Vault) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(LiveFileSystem);
        let dashboard = Arc::new(MarkdownDashboard::new(Arc::clone(&fs), vault.dashboard()));
        Self { clock: Arc::new(LiveClock), fs, dashboard }
    }
}
