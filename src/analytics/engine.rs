//! Cycle & interval engine.
//!
//! Recomputes cycles and intervals from the fact store on every pass; the
//! derived tables are never stored.

use std::collections::BTreeMap;

use crate::analytics::cycles::{derive_cycles, Cycle};
use crate::analytics::intervals::{derive_intervals, Interval};
use crate::analytics::kpi::{self, DowntimeRank, FloorSummary, LineCycles};
use crate::error::Result;
use crate::event::ProductionEvent;
use crate::storage::FactStore;

/// Everything derived from one line's accepted events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDerivation {
    pub line_id: String,
    pub event_count: usize,
    pub cycles: Vec<Cycle>,
    pub intervals: Vec<Interval>,
}

/// Derive cycles and intervals for one line.
///
/// `events` must belong to `line_id` and be sorted by event time.
pub fn derive_line(line_id: &str, events: &[ProductionEvent]) -> LineDerivation {
    LineDerivation {
        line_id: line_id.to_string(),
        event_count: events.len(),
        cycles: derive_cycles(line_id, events),
        intervals: derive_intervals(events),
    }
}

/// Group events by line, order each line by time, and derive every line.
pub fn derive_all(events: &[ProductionEvent]) -> BTreeMap<String, LineDerivation> {
    let mut by_line: BTreeMap<&str, Vec<ProductionEvent>> = BTreeMap::new();
    for event in events {
        by_line.entry(event.line_id.as_str()).or_default().push(event.clone());
    }

    by_line
        .into_iter()
        .map(|(line_id, mut line_events)| {
            line_events.sort_by_key(|e| e.event_time);
            (line_id.to_string(), derive_line(line_id, &line_events))
        })
        .collect()
}

/// Read-only query surface over a snapshot of the fact store.
#[derive(Debug, Clone, Default)]
pub struct Analytics {
    derivations: BTreeMap<String, LineDerivation>,
}

impl Analytics {
    pub fn from_events(events: &[ProductionEvent]) -> Self {
        Self {
            derivations: derive_all(events),
        }
    }

    pub fn from_store<S: FactStore + ?Sized>(store: &S) -> Result<Self> {
        let events = store.events()?;
        log::debug!("ANALYTICS_SNAPSHOT events={}", events.len());
        Ok(Self::from_events(&events))
    }

    pub fn line(&self, line_id: &str) -> Option<&LineDerivation> {
        self.derivations.get(line_id)
    }

    pub fn derivations(&self) -> impl Iterator<Item = &LineDerivation> {
        self.derivations.values()
    }

    /// Q1: cycles of one line, completed and in progress.
    pub fn cycles_for_line(&self, line_id: &str) -> LineCycles {
        kpi::line_cycles(line_id, self.line(line_id))
    }

    /// Q2: floor-wide and per-line uptime/downtime.
    pub fn floor_summary(&self) -> FloorSummary {
        kpi::floor_summary(self.derivations())
    }

    /// Q3: the line with the most downtime.
    pub fn worst_downtime_line(&self) -> Option<DowntimeRank> {
        kpi::worst_downtime_line(&self.floor_summary())
    }

    /// Q3 generalized to the top `n` lines.
    pub fn top_downtime_lines(&self, n: usize) -> Vec<DowntimeRank> {
        kpi::top_downtime_lines(&self.floor_summary(), n)
    }
}
