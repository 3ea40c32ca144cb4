//! Task records: the markdown documents that move through the vault.
//!
//! A record is a `---` delimited header of `key: value` lines followed by
//! free-form sections, the last of which is an append-only `## Action Log`.

mod document;
mod envelope;
mod status;

pub use document::{Header, TaskDocument, ACTION_LOG_HEADING};
pub use envelope::{encode, full_content, SourceContent, PREVIEW_CHARS};
pub use status::TaskStatus;
