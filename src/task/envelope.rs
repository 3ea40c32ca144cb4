//! Builds the record written for a freshly dropped file.

use std::path::Path;

use super::document::ACTION_LOG_HEADING;
use super::status::TaskStatus;

/// Characters of source content shown in the preview section.
pub const PREVIEW_CHARS: usize = 200;

const TRUNCATION_MARKER: &str = "\n... (truncated)";
const ORIGINAL_HEADING: &str = "## Original Content\n";
const FULL_SEPARATOR: &str = "\n\n## Full Content\n";

/// What could be read from a dropped file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// Decoded UTF-8 text.
    Text(String),
    /// Bytes that are not valid UTF-8.
    Binary,
    /// The file could not be opened for reading.
    PermissionDenied,
}

impl SourceContent {
    /// The text stored in the record: the content itself, or a placeholder
    /// naming why it is missing.
    #[must_use]
    pub fn into_text(self, file_name: &str) -> String {
        match self {
            Self::Text(text) => text,
            Self::Binary => format!("[Binary or unreadable file: {file_name}]"),
            Self::PermissionDenied => format!("[Permission denied: {file_name}]"),
        }
    }
}

fn preview(content: &str) -> String {
    let mut out: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().nth(PREVIEW_CHARS).is_some() {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}

/// Renders a new `pending` record for `original`.
#[must_use]
pub fn encode(original: &str, detected: &str, content: SourceContent) -> String {
    let stem = Path::new(original)
        .file_stem()
        .map_or_else(|| original.to_string(), |s| s.to_string_lossy().into_owned());
    let full = content.into_text(original);
    let preview = preview(&full);
    let status = TaskStatus::Pending;

    format!(
        "---\n\
         type: dropped_file\n\
         original: {original}\n\
         detected: {detected}\n\
         status: {status}\n\
         ---\n\
         \n\
         # Task: {stem}\n\
         \n\
         {ORIGINAL_HEADING}{preview}{FULL_SEPARATOR}{full}\n\
         \n\
         {ACTION_LOG_HEADING}\n\
         - [{detected}] Detected in /Inbox by Watcher, processed to /Needs_Action\n"
    )
}

/// Recovers the verbatim source content from a record built by [`encode`].
///
/// The preview is a prefix of the full content, so the split point is the
/// one separator whose right-hand side reproduces the left-hand preview.
#[must_use]
pub fn full_content(document: &str) -> Option<&str> {
    let start = document.find(ORIGINAL_HEADING)? + ORIGINAL_HEADING.len();
    let end = document.rfind(&format!("\n\n{ACTION_LOG_HEADING}"))?;
    let section = document.get(start..end)?;
    section.match_indices(FULL_SEPARATOR).find_map(|(i, sep)| {
        let candidate = &section[i + sep.len()..];
        (section[..i] == preview(candidate)).then_some(candidate)
    })
}
