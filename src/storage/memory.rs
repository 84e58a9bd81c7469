//! In-memory fact store.
//!
//! Mirrors the SQLite store's constraints (registered lines, unique natural
//! key, seeded status dimension) without touching disk. Used for dry runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use parking_lot::RwLock;

use crate::error::{PipelineError, Result};
use crate::event::{ProductionEvent, Status};
use crate::storage::models::QuarantineRecord;
use crate::storage::store::{status_seed, FactStore, StoreWriter};

#[derive(Debug, Clone, Default)]
struct MemoryTables {
    statuses: BTreeMap<i64, String>,
    lines: BTreeSet<String>,
    facts: BTreeMap<(String, NaiveDateTime), Status>,
    quarantine: Vec<QuarantineRecord>,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fact_count(&self) -> usize {
        self.tables.read().facts.len()
    }
}

impl FactStore for MemoryStore {
    fn ensure_schema(&mut self) -> Result<()> {
        {
            let mut tables = self.tables.write();
            for (code, name) in status_seed() {
                tables.statuses.entry(code).or_insert_with(|| name.to_string());
            }
        }
        self.verify_schema()
    }

    fn verify_schema(&self) -> Result<()> {
        let tables = self.tables.read();
        let matches = status_seed()
            .into_iter()
            .all(|(code, name)| tables.statuses.get(&code).map(String::as_str) == Some(name));
        if !matches || tables.statuses.len() != Status::ALL.len() {
            return Err(PipelineError::schema_mismatch(format!(
                "status dimension holds {:?}",
                tables.statuses
            )));
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<Box<dyn StoreWriter + '_>> {
        let staged = self.tables.read().clone();
        Ok(Box::new(MemoryWriter {
            target: &self.tables,
            staged,
        }))
    }

    fn events(&self) -> Result<Vec<ProductionEvent>> {
        let tables = self.tables.read();
        Ok(tables
            .facts
            .iter()
            .map(|((line, ts), status)| ProductionEvent::new(line.clone(), *status, *ts))
            .collect())
    }

    fn events_for_line(&self, line_id: &str) -> Result<Vec<ProductionEvent>> {
        Ok(self
            .events()?
            .into_iter()
            .filter(|e| e.line_id == line_id)
            .collect())
    }

    fn lines(&self) -> Result<Vec<String>> {
        Ok(self.tables.read().lines.iter().cloned().collect())
    }

    fn quarantined(&self) -> Result<Vec<QuarantineRecord>> {
        Ok(self.tables.read().quarantine.clone())
    }

    fn quarantine_count(&self) -> Result<usize> {
        Ok(self.tables.read().quarantine.len())
    }
}

/// Stages changes on a copy; `commit` swaps the copy in.
struct MemoryWriter<'a> {
    target: &'a RwLock<MemoryTables>,
    staged: MemoryTables,
}

impl StoreWriter for MemoryWriter<'_> {
    fn register_line(&mut self, line_id: &str) -> Result<bool> {
        Ok(self.staged.lines.insert(line_id.to_string()))
    }

    fn insert_event(&mut self, event: &ProductionEvent) -> Result<bool> {
        if !self.staged.lines.contains(&event.line_id) {
            return Err(PipelineError::schema_mismatch(format!(
                "line {:?} is not registered",
                event.line_id
            )));
        }
        if !self.staged.statuses.contains_key(&event.status.code()) {
            return Err(PipelineError::schema_mismatch("status dimension is not seeded"));
        }
        let key = (event.line_id.clone(), event.event_time);
        if self.staged.facts.contains_key(&key) {
            return Ok(false);
        }
        self.staged.facts.insert(key, event.status);
        Ok(true)
    }

    fn append_quarantine(&mut self, record: &QuarantineRecord) -> Result<()> {
        self.staged.quarantine.push(record.clone());
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let MemoryWriter { target, staged } = *self;
        *target.write() = staged;
        Ok(())
    }
}
