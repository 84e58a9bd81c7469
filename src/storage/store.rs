//! Storage traits.
//!
//! The fact store is the single source of truth. Writers are
//! transactional: dropping a writer without `commit` discards its changes.

use crate::error::Result;
use crate::event::{ProductionEvent, Status};
use crate::storage::models::QuarantineRecord;

/// Read side and lifecycle of a fact store.
pub trait FactStore {
    /// Create missing tables and seed the status dimension. Idempotent.
    fn ensure_schema(&mut self) -> Result<()>;

    /// Check that the schema exists and the status seed matches, without
    /// creating anything.
    fn verify_schema(&self) -> Result<()>;

    /// Open a transactional writer.
    fn begin(&mut self) -> Result<Box<dyn StoreWriter + '_>>;

    /// Every accepted event, ordered by line then time.
    fn events(&self) -> Result<Vec<ProductionEvent>>;

    /// One line's accepted events in time order.
    fn events_for_line(&self, line_id: &str) -> Result<Vec<ProductionEvent>>;

    /// Registered line ids, sorted.
    fn lines(&self) -> Result<Vec<String>>;

    fn quarantined(&self) -> Result<Vec<QuarantineRecord>>;

    fn quarantine_count(&self) -> Result<usize>;
}

/// Write side of a fact store, scoped to one transaction.
pub trait StoreWriter {
    /// Register a line in the line dimension. Returns `true` if it was new.
    fn register_line(&mut self, line_id: &str) -> Result<bool>;

    /// Insert an accepted event. Returns `false` when the key already exists.
    fn insert_event(&mut self, event: &ProductionEvent) -> Result<bool>;

    fn append_quarantine(&mut self, record: &QuarantineRecord) -> Result<()>;

    fn commit(self: Box<Self>) -> Result<()>;
}

/// The fixed status seed as `(code, token)` pairs.
pub fn status_seed() -> Vec<(i64, &'static str)> {
    Status::ALL.iter().map(|s| (s.code(), s.as_str())).collect()
}
