//! Utility modules for memlog.

mod interval;

pub use interval::{IntervalParseError, format_interval, parse_interval};

use chrono::{DateTime, Local, TimeZone};

/// Timestamp format used in the CSV, e.g. `2024-01-01 00:00:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats `time` as `YYYY-MM-DD HH:MM:SS` in its own time zone.
pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time formatted with [`TIMESTAMP_FORMAT`].
pub fn local_timestamp() -> String {
    format_timestamp(&Local::now())
}
