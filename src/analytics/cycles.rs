//! Cycle derivation.
//!
//! A cycle runs from a START to the STOP that immediately follows it once a
//! line's events are reduced to START/STOP. A trailing START with no STOP
//! yields an open cycle.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::event::{ProductionEvent, Status};

/// One START -> STOP cycle of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub line_id: String,
    pub start: NaiveDateTime,
    /// `None` while the cycle is still open.
    pub stop: Option<NaiveDateTime>,
    /// Whole seconds; `None` while the cycle is still open.
    pub duration_secs: Option<i64>,
}

impl Cycle {
    pub fn completed(line_id: &str, start: NaiveDateTime, stop: NaiveDateTime) -> Self {
        Self {
            line_id: line_id.to_string(),
            start,
            stop: Some(stop),
            duration_secs: Some((stop - start).num_seconds()),
        }
    }

    pub fn open(line_id: &str, start: NaiveDateTime) -> Self {
        Self {
            line_id: line_id.to_string(),
            start,
            stop: None,
            duration_secs: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }
}

/// Incremental cycle builder fed one event at a time in time order.
#[derive(Debug, Default)]
pub struct CycleTracker {
    pending_start: Option<NaiveDateTime>,
    cycles: Vec<Cycle>,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &ProductionEvent) {
        match event.status {
            // A second START replaces an unmatched one; only adjacent
            // START/STOP pairs form a cycle.
            Status::Start => self.pending_start = Some(event.event_time),
            Status::Stop => {
                if let Some(start) = self.pending_start.take() {
                    self.cycles
                        .push(Cycle::completed(&event.line_id, start, event.event_time));
                }
            }
            Status::On => {}
        }
    }

    pub fn finish(mut self, line_id: &str) -> Vec<Cycle> {
        if let Some(start) = self.pending_start.take() {
            self.cycles.push(Cycle::open(line_id, start));
        }
        self.cycles
    }
}

/// Derive all cycles of one line from its time-ordered events.
pub fn derive_cycles(line_id: &str, events: &[ProductionEvent]) -> Vec<Cycle> {
    let mut tracker = CycleTracker::new();
    for event in events {
        tracker.observe(event);
    }
    tracker.finish(line_id)
}
