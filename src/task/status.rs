//! Task status and its lifecycle rules.

use std::fmt;
use std::str::FromStr;

use crate::error::TransitionError;

/// Lifecycle status stored in a record's `status` header key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Freshly ingested, waiting for disposition.
    Pending,
    /// Flagged by policy; waits for a human.
    AwaitingApproval,
    /// Auto-completed and relocated to `Done/`.
    Completed,
}

impl TaskStatus {
    /// The literal written into the header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Completed => "completed",
        }
    }

    /// Only `pending` moves, and only to one of the two outcomes.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, Self::AwaitingApproval | Self::Completed))
    }

    /// Checks a transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the move is not allowed.
    pub fn transition_to(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError { from: self, to: next })
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "awaiting_approval" => Ok(Self::AwaitingApproval),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}
