//! Dashboard port: the status document both stages report into.

use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Number of files currently held by each watched folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FolderCounts {
    /// Files waiting in `Inbox/`.
    pub inbox: usize,
    /// Task records in `Needs_Action/`.
    pub needs_action: usize,
    /// Task records in `Done/`.
    pub done: usize,
}

/// One line of recent activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    /// When the activity happened.
    pub at: DateTime<Utc>,
    /// Short label of the actor or event (e.g. `Watcher Detect`).
    pub action: String,
    /// Free-form details, usually naming the files involved.
    pub details: String,
}

impl Activity {
    /// Creates an activity line.
    #[must_use]
    pub fn new(at: DateTime<Utc>, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self { at, action: action.into(), details: details.into() }
    }
}

/// A single dashboard refresh: counts and activity are persisted together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardUpdate {
    /// Folder occupancy at the time of the update.
    pub counts: FolderCounts,
    /// Activity lines to add, oldest first.
    pub activity: Vec<Activity>,
    /// Time of the update.
    pub updated_at: DateTime<Utc>,
}

/// Persists folder counts and activity lines.
///
/// The concrete format is up to the adapter. Callers treat failures as
/// non-fatal and only log them.
pub trait Dashboard: Send + Sync {
    /// Applies one update.
    ///
    /// # Errors
    ///
    /// Returns an error if the dashboard cannot be read or written.
    fn record(&self, update: &DashboardUpdate) -> io::Result<()>;
}
