//! Production events and quarantine records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical timestamp layout used for storage and reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Status reported by a production line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Start,
    On,
    Stop,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Start, Status::On, Status::Stop];

    /// Literal token as it appears in input files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Start => "START",
            Status::On => "ON",
            Status::Stop => "STOP",
        }
    }

    /// Small integer code stored in the status dimension.
    pub fn code(&self) -> i64 {
        match self {
            Status::Start => 1,
            Status::On => 2,
            Status::Stop => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Status::Start),
            2 => Some(Status::On),
            3 => Some(Status::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status token is not one of START, ON, STOP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status token {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "START" => Ok(Status::Start),
            "ON" => Ok(Status::On),
            "STOP" => Ok(Status::Stop),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// An accepted production-line event.
///
/// The natural key is `(line_id, event_time)`. Ordering compares
/// `event_time` first so a line's events sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub line_id: String,
    pub status: Status,
    pub event_time: NaiveDateTime,
}

impl ProductionEvent {
    pub fn new(line_id: impl Into<String>, status: Status, event_time: NaiveDateTime) -> Self {
        Self {
            line_id: line_id.into(),
            status,
            event_time,
        }
    }
}

impl PartialOrd for ProductionEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProductionEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.event_time
            .cmp(&other.event_time)
            .then_with(|| self.line_id.cmp(&other.line_id))
            .then_with(|| self.status.cmp(&other.status))
    }
}

/// Why an input row was routed to quarantine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineReason {
    UnknownStatus,
    MalformedInput,
    DuplicateEvent,
    MissingStart,
    DuplicateStartWithoutStop,
    OutOfOrder,
}

impl QuarantineReason {
    pub const ALL: [QuarantineReason; 6] = [
        QuarantineReason::UnknownStatus,
        QuarantineReason::MalformedInput,
        QuarantineReason::DuplicateEvent,
        QuarantineReason::MissingStart,
        QuarantineReason::DuplicateStartWithoutStop,
        QuarantineReason::OutOfOrder,
    ];

    /// Inverse of [`QuarantineReason::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == label)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuarantineReason::UnknownStatus => "unknown status",
            QuarantineReason::MalformedInput => "malformed input",
            QuarantineReason::DuplicateEvent => "duplicate event",
            QuarantineReason::MissingStart => "missing START",
            QuarantineReason::DuplicateStartWithoutStop => "duplicate START without STOP",
            QuarantineReason::OutOfOrder => "out-of-order event",
        }
    }
}

impl fmt::Display for QuarantineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected input row, kept verbatim for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantinedEvent {
    pub line_id: String,
    /// Status exactly as given in the input.
    pub status: String,
    /// Timestamp exactly as given in the input.
    pub event_time: String,
    pub reason: QuarantineReason,
    pub rejected_at: DateTime<Utc>,
}

impl QuarantinedEvent {
    pub fn new(
        line_id: &str,
        status: &str,
        event_time: &str,
        reason: QuarantineReason,
        rejected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            line_id: line_id.to_string(),
            status: status.to_string(),
            event_time: event_time.to_string(),
            reason,
            rejected_at,
        }
    }
}

/// Render a timestamp in the canonical layout.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("START".parse::<Status>(), Ok(Status::Start));
        assert_eq!(" ON ".parse::<Status>(), Ok(Status::On));
        assert_eq!("STOP".parse::<Status>(), Ok(Status::Stop));
        assert!("PAUSE".parse::<Status>().is_err());
        assert!("start".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(0), None);
    }

    #[test]
    fn test_event_ordering_by_time() {
        let t0 = NaiveDateTime::parse_from_str("2024-01-01 08:00:00", TIMESTAMP_FORMAT).unwrap();
        let t1 = NaiveDateTime::parse_from_str("2024-01-01 08:00:05", TIMESTAMP_FORMAT).unwrap();
        let a = ProductionEvent::new("zz", Status::Stop, t0);
        let b = ProductionEvent::new("aa", Status::Start, t1);
        assert!(a < b);
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(QuarantineReason::MissingStart.as_str(), "missing START");
        assert_eq!(
            QuarantineReason::DuplicateStartWithoutStop.to_string(),
            "duplicate START without STOP"
        );
        for reason in QuarantineReason::ALL {
            assert_eq!(QuarantineReason::from_label(reason.as_str()), Some(reason));
        }
    }
}
