//! Timestamp parsing.
//!
//! Input timestamps are ISO-8601-like without a timezone. Sub-second
//! precision is accepted and truncated.

use chrono::{NaiveDateTime, Timelike};

/// Layouts tried in order.
const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp, truncating to whole seconds.
///
/// # Examples
/// ```
/// use linecycle_core::extraction::parse_timestamp;
/// let ts = parse_timestamp("2024-03-01T08:15:30.750").unwrap();
/// assert_eq!(ts.to_string(), "2024-03-01 08:15:30");
/// ```
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.with_nanosecond(0).unwrap_or(ts))
}
