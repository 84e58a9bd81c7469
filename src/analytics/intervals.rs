//! Interval derivation.
//!
//! Every adjacent pair of a line's events yields one interval. Dwell time
//! after START or ON is uptime; dwell time after STOP is downtime. The last
//! event of a line has no successor and yields nothing.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::event::{ProductionEvent, Status};

/// Whether an interval counts as productive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalClass {
    Uptime,
    Downtime,
}

impl IntervalClass {
    /// Classify by the status of the interval's earlier event.
    pub fn after(status: Status) -> Self {
        match status {
            Status::Start | Status::On => IntervalClass::Uptime,
            Status::Stop => IntervalClass::Downtime,
        }
    }
}

/// Gap between two time-adjacent events of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub line_id: String,
    pub from_status: Status,
    pub from_time: NaiveDateTime,
    pub to_time: NaiveDateTime,
    pub gap_secs: i64,
    pub class: IntervalClass,
}

impl Interval {
    pub fn between(from: &ProductionEvent, to: &ProductionEvent) -> Self {
        Self {
            line_id: from.line_id.clone(),
            from_status: from.status,
            from_time: from.event_time,
            to_time: to.event_time,
            gap_secs: (to.event_time - from.event_time).num_seconds(),
            class: IntervalClass::after(from.status),
        }
    }
}

/// Derive the intervals of one line from its time-ordered events.
pub fn derive_intervals(events: &[ProductionEvent]) -> Vec<Interval> {
    events
        .windows(2)
        .map(|pair| Interval::between(&pair[0], &pair[1]))
        .collect()
}
