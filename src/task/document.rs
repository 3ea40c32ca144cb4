//! Structured view of a task record: header zone plus verbatim body.
//!
//! Parsing keeps every byte it does not understand, so
//! `TaskDocument::parse(text).render() == text` for any input. Edits touch
//! only the header line or log position they target.

use std::fmt::Write as _;

/// Line that opens and closes the header zone.
const HEADER_MARKER: &str = "---";

/// Heading of the append-only log section.
pub const ACTION_LOG_HEADING: &str = "## Action Log";

#[derive(Debug, Clone, PartialEq, Eq)]
enum HeaderLine {
    Field { key: String, value: String, raw: String },
    Other(String),
}

impl HeaderLine {
    fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => Self::Field {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
                raw: raw.to_string(),
            },
            _ => Self::Other(raw.to_string()),
        }
    }

    fn field(key: &str, value: &str) -> Self {
        Self::Field {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{key}: {value}"),
        }
    }

    fn raw(&self) -> &str {
        match self {
            Self::Field { raw, .. } | Self::Other(raw) => raw,
        }
    }
}

/// Ordered `key: value` mapping from a record's header zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    lines: Vec<HeaderLine>,
}

impl Header {
    fn parse(zone: &str) -> Self {
        if zone.is_empty() {
            return Self::default();
        }
        let zone = zone.strip_suffix('\n').unwrap_or(zone);
        Self { lines: zone.split('\n').map(HeaderLine::parse).collect() }
    }

    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Fields in order of first appearance.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            HeaderLine::Field { key, value, .. } => Some((key.as_str(), value.as_str())),
            HeaderLine::Other(_) => None,
        })
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields().count()
    }

    /// `true` when the header holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces `key` in place, or appends it after the last line.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut found = false;
        for line in &mut self.lines {
            if matches!(line, HeaderLine::Field { key: k, .. } if k == key) {
                *line = HeaderLine::field(key, value);
                found = true;
            }
        }
        if !found {
            self.lines.push(HeaderLine::field(key, value));
        }
    }

    fn render_into(&self, out: &mut String) {
        for line in &self.lines {
            out.push_str(line.raw());
            out.push('\n');
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderZone {
    open: String,
    header: Header,
    close: String,
}

/// A parsed task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDocument {
    zone: Option<HeaderZone>,
    body: String,
}

impl TaskDocument {
    /// Splits `text` into header zone and body. Text without a leading
    /// `---` block is all body.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match split_header(text) {
            Some((open, zone, close, body)) => Self {
                zone: Some(HeaderZone {
                    open: open.to_string(),
                    header: Header::parse(zone),
                    close: close.to_string(),
                }),
                body: body.to_string(),
            },
            None => Self { zone: None, body: text.to_string() },
        }
    }

    /// The header mapping; empty when the record has no header zone.
    #[must_use]
    pub fn header(&self) -> Header {
        self.zone.as_ref().map(|z| z.header.clone()).unwrap_or_default()
    }

    /// `true` if the record opens with a header zone.
    #[must_use]
    pub fn has_header(&self) -> bool {
        self.zone.is_some()
    }

    /// Value of a single header key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.zone.as_ref().and_then(|z| z.header.get(key))
    }

    /// Applies header updates in order. A record without a header zone
    /// gains one at the top.
    pub fn update_header<'a, I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let zone = self.zone.get_or_insert_with(|| {
            self.body.insert(0, '\n');
            HeaderZone {
                open: format!("{HEADER_MARKER}\n"),
                header: Header::default(),
                close: HEADER_MARKER.to_string(),
            }
        });
        for (key, value) in updates {
            zone.header.set(key, value);
        }
    }

    /// Inserts `- [timestamp] entry` directly under the Action Log heading,
    /// creating the section at the end when it is missing.
    pub fn append_log(&mut self, entry: &str, timestamp: &str) {
        let line = format!("- [{timestamp}] {entry}");
        match log_insert_point(&self.body) {
            Some(at) if at == self.body.len() && !self.body.ends_with('\n') => {
                self.body.push('\n');
                self.body.push_str(&line);
            }
            Some(at) => self.body.insert_str(at, &format!("{line}\n")),
            None => {
                if !self.body.is_empty() && !self.body.ends_with('\n') {
                    self.body.push('\n');
                }
                let _ = write!(self.body, "\n{ACTION_LOG_HEADING}\n{line}\n");
            }
        }
    }

    /// Entries of the Action Log in display order (newest first).
    #[must_use]
    pub fn log_entries(&self) -> Vec<&str> {
        let Some(start) = log_insert_point(&self.body) else {
            return Vec::new();
        };
        self.body[start..]
            .lines()
            .take_while(|l| l.starts_with("- ["))
            .collect()
    }

    /// Serializes the record back to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        if let Some(zone) = &self.zone {
            out.push_str(&zone.open);
            zone.header.render_into(&mut out);
            out.push_str(&zone.close);
        }
        out.push_str(&self.body);
        out
    }
}

/// Returns (open line incl. newline, header lines, close line, rest).
fn split_header(text: &str) -> Option<(&str, &str, &str, &str)> {
    let first_end = text.find('\n')?;
    if text[..first_end].trim_end() != HEADER_MARKER {
        return None;
    }
    let zone_start = first_end + 1;
    let mut pos = zone_start;
    while pos <= text.len() {
        let end = text[pos..].find('\n').map_or(text.len(), |i| pos + i);
        if text[pos..end].trim_end() == HEADER_MARKER {
            let zone = &text[zone_start..pos];
            return Some((&text[..zone_start], zone, &text[pos..end], &text[end..]));
        }
        if end == text.len() {
            break;
        }
        pos = end + 1;
    }
    None
}

/// Byte offset just past the last Action Log heading line.
fn log_insert_point(body: &str) -> Option<usize> {
    let mut found = None;
    let mut pos = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_end() == ACTION_LOG_HEADING {
            found = Some(pos + line.len());
        }
        pos += line.len();
    }
    found
}
