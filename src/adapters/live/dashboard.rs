//! Markdown dashboard adapter writing `Dashboard.md` at the vault root.
//!
//! Counts in the status table are rewritten in place and new activity rows
//! are inserted directly under the activity table's divider. The whole
//! document is then replaced with a single atomic write, so a reader never
//! sees new activity next to stale counts.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;

use crate::ports::clock::{format_short_time, format_timestamp};
use crate::ports::{Dashboard, DashboardUpdate, FileSystem};

const ACTIVITY_DIVIDER: &str = "|------|--------|---------|";

const TEMPLATE: &str = "# Vault Dashboard

## Status
| Metric | Value |
|--------|-------|
| Last updated | never |
| Inbox items | 0 |
| Needs_Action items | 0 |
| Done items | 0 |

## Recent Activity
| Time | Action | Details |
|------|--------|---------|
";

/// Dashboard persisted as a markdown document.
pub struct MarkdownDashboard {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    last_updated: Regex,
    inbox: Regex,
    needs_action: Regex,
    done: Regex,
}

impl MarkdownDashboard {
    /// Creates a dashboard stored at `path`.
    ///
    /// # Panics
    ///
    /// Never in practice: the patterns are fixed literals.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, path: PathBuf) -> Self {
        let row = |label: &str| {
            Regex::new(&format!(r"(?m)^(\|\s*{}\s*\|\s*)\d+", regex::escape(label)))
                .expect("count row pattern")
        };
        Self {
            fs,
            path,
            last_updated: Regex::new(r"(?m)^(\|\s*Last updated\s*\|\s*).*$")
                .expect("last updated pattern"),
            inbox: row("Inbox items"),
            needs_action: row("Needs_Action items"),
            done: row("Done items"),
        }
    }

    fn load(&self) -> io::Result<String> {
        match self.fs.read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "dashboard missing, creating it");
                Ok(TEMPLATE.to_string())
            }
            Err(e) => Err(e),
        }
    }

    fn render(&self, current: &str, update: &DashboardUpdate) -> String {
        let stamp = format_timestamp(update.updated_at);
        let text = self.last_updated.replace(current, |caps: &regex::Captures<'_>| {
            format!("{}{stamp} |", &caps[1])
        });
        let counts = [
            (&self.inbox, update.counts.inbox),
            (&self.needs_action, update.counts.needs_action),
            (&self.done, update.counts.done),
        ];
        let mut text = text.into_owned();
        for (pattern, count) in counts {
            text = pattern
                .replace_all(&text, |caps: &regex::Captures<'_>| format!("{}{count}", &caps[1]))
                .into_owned();
        }

        if update.activity.is_empty() {
            return text;
        }
        // Newest row sits directly under the divider.
        let rows: Vec<String> = update
            .activity
            .iter()
            .rev()
            .map(|a| format!("| {} | {} | {} |", format_short_time(a.at), a.action, a.details))
            .collect();
        if let Some(at) = text.find(ACTIVITY_DIVIDER) {
            let insert_at = at + ACTIVITY_DIVIDER.len();
            text.insert_str(insert_at, &format!("\n{}", rows.join("\n")));
        } else {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            for a in &update.activity {
                text.push_str(&format!(
                    "- [{}] {}: {}\n",
                    format_short_time(a.at),
                    a.action,
                    a.details
                ));
            }
        }
        text
    }
}

impl Dashboard for MarkdownDashboard {
    fn record(&self, update: &DashboardUpdate) -> io::Result<()> {
        let current = self.load()?;
        let next = self.render(&current, update);
        self.fs.write(&self.path, &next)
    }
}
