//! Per-line lifecycle state.
//!
//! `LineState` is derived, never persisted: it is rebuilt on each run by
//! replaying a line's persisted accepted events, then advanced by the
//! events accepted from the current batch.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::event::{ProductionEvent, Status};
use crate::routing::Expected;

/// Accepted history of one line as found in the fact store.
#[derive(Debug, Clone, Default)]
pub struct LineHistory {
    pub expected: Expected,
    pub last_time: Option<NaiveDateTime>,
    pub keys: HashMap<NaiveDateTime, Status>,
}

impl LineHistory {
    /// Replay a line's accepted events (any order) into its final state.
    pub fn replay(events: &[&ProductionEvent]) -> Self {
        let mut ordered: Vec<&ProductionEvent> = events.to_vec();
        ordered.sort();

        let mut history = LineHistory::default();
        for event in ordered {
            history.expected = next_expected(history.expected, event.status);
            history.last_time = Some(event.event_time);
            history.keys.insert(event.event_time, event.status);
        }
        history
    }

    pub fn status_at(&self, ts: &NaiveDateTime) -> Option<Status> {
        self.keys.get(ts).copied()
    }

    /// Whether `ts` falls at or before the last persisted event.
    pub fn precedes_end(&self, ts: &NaiveDateTime) -> bool {
        self.last_time.map_or(false, |last| *ts <= last)
    }
}

/// Persisted history for every line in the fact store.
#[derive(Debug, Clone, Default)]
pub struct PersistedHistory {
    lines: HashMap<String, LineHistory>,
}

impl PersistedHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_events(events: &[ProductionEvent]) -> Self {
        let mut by_line: HashMap<&str, Vec<&ProductionEvent>> = HashMap::new();
        for event in events {
            by_line.entry(event.line_id.as_str()).or_default().push(event);
        }
        let lines = by_line
            .into_iter()
            .map(|(line, events)| (line.to_string(), LineHistory::replay(&events)))
            .collect();
        Self { lines }
    }

    pub fn line(&self, line_id: &str) -> Option<&LineHistory> {
        self.lines.get(line_id)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Live lifecycle state of one line while a batch is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineState {
    pub line_id: String,
    pub expected: Expected,
    pub accepted: usize,
}

impl LineState {
    pub fn new(line_id: &str) -> Self {
        Self {
            line_id: line_id.to_string(),
            expected: Expected::AwaitingStart,
            accepted: 0,
        }
    }

    /// Start from where the persisted history left off.
    pub fn seeded(line_id: &str, history: Option<&LineHistory>) -> Self {
        let mut state = Self::new(line_id);
        if let Some(h) = history {
            state.expected = h.expected;
        }
        state
    }

    /// The set of statuses that would be accepted next.
    pub fn expected_next(&self) -> &'static [Status] {
        self.expected.acceptable()
    }

    pub fn advance(&mut self, next: Expected) {
        self.expected = next;
        self.accepted += 1;
    }
}

fn next_expected(current: Expected, status: Status) -> Expected {
    match status {
        Status::Start => Expected::InProgress,
        Status::Stop => Expected::AwaitingStart,
        Status::On => current,
    }
}
