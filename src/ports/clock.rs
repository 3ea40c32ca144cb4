//! Clock port for obtaining the current time.

use chrono::{DateTime, Local, Utc};

/// Provides the current time.
///
/// Abstracting time access lets tests pin every timestamp written into a
/// task record or the dashboard.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current time rendered as `YYYY-MM-DD HH:MM:SS` local time.
    fn timestamp(&self) -> String {
        format_timestamp(self.now())
    }
}

/// Renders an instant the way task records and the dashboard print it.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders an instant as `HH:MM` local time for dashboard activity rows.
#[must_use]
pub fn format_short_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}
