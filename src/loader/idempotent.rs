//! Idempotent loader.
//!
//! Persists accepted events keyed by `(line_id, event_time)` and appends
//! quarantine rows, all inside one store transaction. Re-loading an event
//! that is already present is a no-op. Lines are registered in the line
//! dimension before their first fact.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::Result;
use crate::event::{ProductionEvent, QuarantinedEvent};
use crate::log_info;
use crate::logging::structured::LogContext;
use crate::storage::{FactStore, QuarantineRecord};

/// Counts from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub inserted: usize,
    pub already_present: usize,
    pub lines_registered: usize,
    pub quarantined: usize,
}

/// Load accepted events and quarantine rows in a single transaction.
///
/// Either everything is committed or, on error, nothing is.
pub fn load_batch<S: FactStore + ?Sized>(
    store: &mut S,
    accepted: &[ProductionEvent],
    quarantined: &[QuarantinedEvent],
    ctx: &LogContext,
) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut known_lines: HashSet<&str> = HashSet::new();

    let mut writer = store.begin()?;

    for event in accepted {
        if known_lines.insert(event.line_id.as_str()) && writer.register_line(&event.line_id)? {
            summary.lines_registered += 1;
            log_info!(ctx, "LINE_REGISTERED", line = event.line_id);
        }

        if writer.insert_event(event)? {
            summary.inserted += 1;
        } else {
            summary.already_present += 1;
            log::debug!(
                "{} FACT_ALREADY_PRESENT line={} event_time={}",
                ctx,
                event.line_id,
                event.event_time
            );
        }
    }

    for q in quarantined {
        writer.append_quarantine(&QuarantineRecord::new(&ctx.run_id, q.clone()))?;
        summary.quarantined += 1;
    }

    writer.commit()?;

    log::info!(
        "{} LOAD_COMPLETE inserted={} already_present={} lines_registered={} quarantined={}",
        ctx,
        summary.inserted,
        summary.already_present,
        summary.lines_registered,
        summary.quarantined
    );

    Ok(summary)
}
