//! KPI aggregation.
//!
//! Reduces derived cycles and intervals to the three floor questions:
//! per-line cycles (Q1), uptime/downtime totals (Q2) and the line with the
//! most downtime (Q3).

use serde::Serialize;

use crate::analytics::cycles::Cycle;
use crate::analytics::engine::LineDerivation;
use crate::analytics::intervals::IntervalClass;

/// Q1 answer for one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineCycles {
    pub line_id: String,
    pub completed: Vec<Cycle>,
    pub in_progress: Vec<Cycle>,
}

impl LineCycles {
    pub fn total_completed_secs(&self) -> i64 {
        self.completed.iter().filter_map(|c| c.duration_secs).sum()
    }
}

/// Per-line subtotals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineTotals {
    pub line_id: String,
    pub uptime_secs: i64,
    pub downtime_secs: i64,
    /// Sum of completed cycle durations.
    pub cycle_secs: i64,
    pub completed_cycles: usize,
    pub open_cycles: usize,
}

/// Q2 answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FloorSummary {
    /// Sorted by line id.
    pub per_line: Vec<LineTotals>,
    pub total_uptime_secs: i64,
    pub total_downtime_secs: i64,
    /// Uptime counted only inside completed cycles.
    pub full_cycle_uptime_secs: i64,
}

impl FloorSummary {
    pub fn line(&self, line_id: &str) -> Option<&LineTotals> {
        self.per_line.iter().find(|t| t.line_id == line_id)
    }
}

/// A line ranked by downtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DowntimeRank {
    pub line_id: String,
    pub downtime_secs: i64,
}

/// Split a line's cycles into completed and in progress.
pub fn line_cycles(line_id: &str, derivation: Option<&LineDerivation>) -> LineCycles {
    let (in_progress, completed): (Vec<Cycle>, Vec<Cycle>) = derivation
        .map(|d| d.cycles.iter().cloned().partition(Cycle::is_open))
        .unwrap_or_default();
    LineCycles {
        line_id: line_id.to_string(),
        completed,
        in_progress,
    }
}

/// Subtotals for one line.
pub fn line_totals(derivation: &LineDerivation) -> LineTotals {
    let mut totals = LineTotals {
        line_id: derivation.line_id.clone(),
        ..LineTotals::default()
    };
    for interval in &derivation.intervals {
        match interval.class {
            IntervalClass::Uptime => totals.uptime_secs += interval.gap_secs,
            IntervalClass::Downtime => totals.downtime_secs += interval.gap_secs,
        }
    }
    for cycle in &derivation.cycles {
        match cycle.duration_secs {
            Some(secs) => {
                totals.cycle_secs += secs;
                totals.completed_cycles += 1;
            }
            None => totals.open_cycles += 1,
        }
    }
    totals
}

/// Aggregate every line into the floor summary.
pub fn floor_summary<'a>(derivations: impl IntoIterator<Item = &'a LineDerivation>) -> FloorSummary {
    let mut per_line: Vec<LineTotals> = derivations.into_iter().map(line_totals).collect();
    per_line.sort_by(|a, b| a.line_id.cmp(&b.line_id));

    FloorSummary {
        total_uptime_secs: per_line.iter().map(|t| t.uptime_secs).sum(),
        total_downtime_secs: per_line.iter().map(|t| t.downtime_secs).sum(),
        full_cycle_uptime_secs: per_line.iter().map(|t| t.cycle_secs).sum(),
        per_line,
    }
}

/// Lines ordered by downtime descending, ties by line id ascending.
pub fn top_downtime_lines(summary: &FloorSummary, n: usize) -> Vec<DowntimeRank> {
    let mut ranked: Vec<DowntimeRank> = summary
        .per_line
        .iter()
        .map(|t| DowntimeRank {
            line_id: t.line_id.clone(),
            downtime_secs: t.downtime_secs,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.downtime_secs
            .cmp(&a.downtime_secs)
            .then_with(|| a.line_id.cmp(&b.line_id))
    });
    ranked.truncate(n);
    ranked
}

/// The single worst line; `None` when no line has been loaded.
pub fn worst_downtime_line(summary: &FloorSummary) -> Option<DowntimeRank> {
    top_downtime_lines(summary, 1).into_iter().next()
}
