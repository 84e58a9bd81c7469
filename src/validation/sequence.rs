//! Sequential validator.
//!
//! Groups well-formed rows by line, orders each group by event time (ties
//! keep input order), and walks each group through the line lifecycle.
//! Bad rows are quarantined; nothing here aborts the batch.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::event::{ProductionEvent, QuarantineReason, QuarantinedEvent};
use crate::extraction::ParsedRow;
use crate::logging::structured::LogContext;
use crate::routing::{determine_routing, RoutingDecision};
use crate::validation::line_state::{LineState, PersistedHistory};
use crate::{log_debug, log_warn};

/// Result of validating a batch.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    /// Accepted events, grouped by line and in per-line time order.
    pub accepted: Vec<ProductionEvent>,
    /// Rows identical to an already persisted event; absorbed silently.
    pub resubmitted: Vec<ProductionEvent>,
    pub quarantined: Vec<QuarantinedEvent>,
    /// Final state of every line touched by the batch.
    pub line_states: BTreeMap<String, LineState>,
}

/// Validate a batch of well-formed rows against the persisted history.
pub fn validate_batch(
    rows: Vec<ParsedRow>,
    history: &PersistedHistory,
    rejected_at: DateTime<Utc>,
    ctx: &LogContext,
) -> ValidationOutcome {
    let mut groups: BTreeMap<String, Vec<ParsedRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.event.line_id.clone()).or_default().push(row);
    }

    let mut outcome = ValidationOutcome::default();

    for (line_id, mut group) in groups {
        group.sort_by_key(|r| (r.event.event_time, r.raw.position));
        let line_ctx = ctx.with_line(&line_id);
        let state = validate_line(&line_id, group, history, rejected_at, &line_ctx, &mut outcome);
        outcome.line_states.insert(line_id, state);
    }

    log::info!(
        "{} VALIDATION_COMPLETE lines={} accepted={} resubmitted={} quarantined={}",
        ctx,
        outcome.line_states.len(),
        outcome.accepted.len(),
        outcome.resubmitted.len(),
        outcome.quarantined.len()
    );

    outcome
}

/// Walk one line's time-ordered rows.
fn validate_line(
    line_id: &str,
    group: Vec<ParsedRow>,
    history: &PersistedHistory,
    rejected_at: DateTime<Utc>,
    ctx: &LogContext,
    outcome: &mut ValidationOutcome,
) -> LineState {
    let persisted = history.line(line_id);
    let mut state = LineState::seeded(line_id, persisted);
    let mut seen: HashSet<NaiveDateTime> = HashSet::new();

    for row in group {
        let ts = row.event.event_time;
        let first_sighting = seen.insert(ts);

        if let Some(persisted) = persisted {
            if let Some(stored) = persisted.status_at(&ts) {
                if first_sighting && stored == row.event.status {
                    log_debug!(ctx, "EVENT_RESUBMITTED", timestamp = row.raw.timestamp);
                    outcome.resubmitted.push(row.event);
                } else {
                    quarantine(&row, QuarantineReason::DuplicateEvent, rejected_at, ctx, outcome);
                }
                continue;
            }
            if first_sighting && persisted.precedes_end(&ts) {
                quarantine(&row, QuarantineReason::OutOfOrder, rejected_at, ctx, outcome);
                continue;
            }
        }

        match determine_routing(state.expected, row.event.status, !first_sighting, ctx) {
            RoutingDecision::Accept(next) => {
                log_debug!(
                    ctx,
                    "EVENT_ACCEPTED",
                    status = row.event.status.as_str(),
                    timestamp = row.raw.timestamp,
                );
                state.advance(next);
                outcome.accepted.push(row.event);
            }
            RoutingDecision::Quarantine(reason) => {
                log_debug!(
                    ctx,
                    "LIFECYCLE_VIOLATION",
                    expected = state.expected_next(),
                    status = row.event.status.as_str(),
                );
                quarantine(&row, reason, rejected_at, ctx, outcome);
            }
        }
    }

    state
}

fn quarantine(
    row: &ParsedRow,
    reason: QuarantineReason,
    rejected_at: DateTime<Utc>,
    ctx: &LogContext,
    outcome: &mut ValidationOutcome,
) {
    log_warn!(
        ctx,
        "EVENT_QUARANTINED",
        reason = reason.as_str(),
        status = row.raw.status,
        timestamp = row.raw.timestamp,
    );
    outcome.quarantined.push(QuarantinedEvent::new(
        &row.raw.line_id,
        &row.raw.status,
        &row.raw.timestamp,
        reason,
        rejected_at,
    ));
}
