//! Main event ingestion pipeline.
//!
//! Coordinates one batch end to end:
//! 1. Row extraction (header, timestamps, status tokens)
//! 2. Persisted history lookup
//! 3. Sequential validation per line
//! 4. Idempotent load of accepted events plus quarantine rows
//!
//! Fatal errors stop the run before the load transaction commits.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::event::QuarantinedEvent;
use crate::extraction::{extract_rows, read_input_file};
use crate::loader::{load_batch, LoadSummary};
use crate::storage::FactStore;
use crate::validation::{validate_batch, PersistedHistory};

use super::context::RunContext;

/// Result of processing a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub run_id: String,
    pub received_count: usize,
    pub accepted_count: usize,
    pub resubmitted_count: usize,
    pub quarantined: Vec<QuarantinedEvent>,
    pub load: LoadSummary,
}

impl BatchResult {
    pub fn quarantined_count(&self) -> usize {
        self.quarantined.len()
    }
}

/// Process a batch held in memory, as text or raw bytes.
pub fn process_batch<S: FactStore + ?Sized>(
    ctx: &RunContext,
    store: &mut S,
    input: impl AsRef<[u8]>,
) -> Result<BatchResult> {
    let log_ctx = ctx.log_context();
    let rejected_at = Utc::now();

    let extracted = extract_rows(input, rejected_at, &log_ctx)?;
    let history = PersistedHistory::from_events(&store.events()?);
    log::debug!(
        "{} HISTORY_LOADED lines={}",
        log_ctx,
        history.line_count()
    );

    let outcome = validate_batch(extracted.rows, &history, rejected_at, &log_ctx);

    let mut quarantined = extracted.rejected;
    quarantined.extend(outcome.quarantined);

    let load = load_batch(store, &outcome.accepted, &quarantined, &log_ctx)?;

    log::info!(
        "{} BATCH_COMPLETE received={} accepted={} resubmitted={} quarantined={}",
        log_ctx,
        extracted.received,
        outcome.accepted.len(),
        outcome.resubmitted.len(),
        quarantined.len()
    );

    Ok(BatchResult {
        run_id: ctx.run_id.clone(),
        received_count: extracted.received,
        accepted_count: outcome.accepted.len(),
        resubmitted_count: outcome.resubmitted.len(),
        quarantined,
        load,
    })
}

/// Read `path` and process it as one batch.
pub fn process_file<S: FactStore + ?Sized>(
    ctx: &RunContext,
    store: &mut S,
    path: &Path,
) -> Result<BatchResult> {
    let input = read_input_file(path)?;
    log::info!(
        "{} INPUT_READ path={} bytes={}",
        ctx.log_context(),
        path.display(),
        input.len()
    );
    process_batch(ctx, store, &input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::event::QuarantineReason;
    use crate::storage::SqliteStore;

    fn store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    const INPUT: &str = "production_line_id,status,timestamp\n\
                         L1,START,2024-01-01 08:00:00\n\
                         L1,ON,2024-01-01 08:01:00\n\
                         L1,STOP,2024-01-01 08:10:00\n\
                         L2,ON,2024-01-01 08:00:00\n\
                         L3,BOGUS,2024-01-01 08:00:00\n";

    #[test]
    fn test_process_batch_routes_rows() {
        let mut store = store();
        let result = process_batch(&RunContext::new(), &mut store, INPUT).unwrap();
        assert_eq!(result.received_count, 5);
        assert_eq!(result.accepted_count, 3);
        assert_eq!(result.quarantined_count(), 2);
        assert_eq!(result.load.inserted, 3);
        let reasons: Vec<QuarantineReason> = result.quarantined.iter().map(|q| q.reason).collect();
        assert!(reasons.contains(&QuarantineReason::UnknownStatus));
        assert!(reasons.contains(&QuarantineReason::MissingStart));
    }

    #[test]
    fn test_rerun_same_input() {
        let mut store = store();
        process_batch(&RunContext::new(), &mut store, INPUT).unwrap();
        let facts_before = store.events().unwrap();

        let second = process_batch(&RunContext::new(), &mut store, INPUT).unwrap();
        assert_eq!(second.accepted_count, 0);
        assert_eq!(second.resubmitted_count, 3);
        assert_eq!(second.load.inserted, 0);
        assert_eq!(store.events().unwrap(), facts_before);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut store = store();
        let err = process_file(&RunContext::new(), &mut store, Path::new("/no/such/input.csv"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InputMissing { .. }));
        assert_eq!(store.quarantine_count().unwrap(), 0);
    }
}
