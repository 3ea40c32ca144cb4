//! Approval policy: decides whether a pending task may be auto-completed.
//!
//! Rules run in a fixed order and the first match wins:
//! 1. a dollar amount above the threshold,
//! 2. a communication verb followed later by an external party,
//! 3. a destructive verb followed later by a shared resource.

use regex::Regex;
use tracing::debug;

/// Default dollar amount above which a payment needs approval.
pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 100.0;

/// Which rule flagged a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// A currency amount above the threshold.
    PaymentAmount,
    /// Outbound communication with an outside party.
    ExternalCommunication,
    /// Deletion of a shared resource.
    DestructiveAction,
}

/// Outcome of evaluating a task's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No rule matched; the task may be completed automatically.
    AutoApprove,
    /// A rule matched; a human has to sign off.
    NeedsApproval {
        /// The rule that matched.
        rule: Rule,
        /// Human-readable explanation written to the task's log.
        reason: String,
    },
}

impl Verdict {
    /// `true` when a human has to approve the task.
    #[must_use]
    pub fn needs_approval(&self) -> bool {
        matches!(self, Self::NeedsApproval { .. })
    }

    /// The matched rule's message, or an empty string.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::AutoApprove => "",
            Self::NeedsApproval { reason, .. } => reason,
        }
    }
}

/// Compiled rule set.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    threshold: f64,
    amount: Regex,
    external_comms: Regex,
    destructive: Regex,
}

impl PolicyEngine {
    /// Builds the rule set with the given payment threshold.
    ///
    /// # Panics
    ///
    /// Never in practice: the patterns are fixed literals.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            amount: Regex::new(r"\$\s*(\d+(?:,\d{3})*(?:\.\d+)?)").expect("amount pattern"),
            external_comms: Regex::new(
                r"(?is)\b(?:send|email|message)\b.*\b(?:external|client|vendor|outside)\b",
            )
            .expect("external comms pattern"),
            destructive: Regex::new(r"(?is)\b(?:delete|remove)\b.*\b(?:shared|team|production)\b")
                .expect("destructive pattern"),
        }
    }

    /// The payment threshold in dollars.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluates task content. Pure: the same text always yields the same verdict.
    #[must_use]
    pub fn evaluate(&self, content: &str) -> Verdict {
        for caps in self.amount.captures_iter(content) {
            let raw = &caps[1];
            let Ok(value) = raw.replace(',', "").parse::<f64>() else {
                debug!(token = raw, "skipping unparseable amount");
                continue;
            };
            if value > self.threshold {
                return Verdict::NeedsApproval {
                    rule: Rule::PaymentAmount,
                    reason: format!(
                        "Payment amount ${raw} exceeds ${} threshold",
                        self.threshold
                    ),
                };
            }
        }

        if self.external_comms.is_match(content) {
            return Verdict::NeedsApproval {
                rule: Rule::ExternalCommunication,
                reason: "Contains external communication; requires first-time approval".into(),
            };
        }

        if self.destructive.is_match(content) {
            return Verdict::NeedsApproval {
                rule: Rule::DestructiveAction,
                reason: "Destructive action on shared resource".into(),
            };
        }

        Verdict::AutoApprove
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_THRESHOLD)
    }
}
