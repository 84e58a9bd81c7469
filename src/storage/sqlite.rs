//! SQLite-backed fact store.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, Row, Transaction};

use crate::error::{PipelineError, Result};
use crate::event::{ProductionEvent, QuarantineReason, QuarantinedEvent, Status, TIMESTAMP_FORMAT};
use crate::storage::models::{FactRecord, QuarantineRecord};
use crate::storage::queries::{
    build_fact_insert, build_fact_select, build_line_insert, build_line_select,
    build_quarantine_count, build_quarantine_insert, build_quarantine_select, build_schema_ddl,
    build_status_seed, build_status_select, build_table_check, REQUIRED_TABLES,
};
use crate::storage::store::{status_seed, FactStore, StoreWriter};

/// Fact store persisted in a SQLite database.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::configure(conn)
    }

    /// Open an existing database without creating it. Used by read-only
    /// passes so a wrong path fails instead of leaving an empty file.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path.as_ref(), flags)?;
        Self::configure(conn)
    }

    /// Open a private in-memory database (for tests and dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }
}

impl FactStore for SqliteStore {
    fn ensure_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(build_schema_ddl())?;
        for (code, name) in status_seed() {
            tx.execute(build_status_seed(), params![code, name])?;
        }
        tx.commit()?;
        log::info!("SCHEMA_ENSURED tables={:?}", REQUIRED_TABLES);
        self.verify_schema()
    }

    fn verify_schema(&self) -> Result<()> {
        let mut stmt = self.conn.prepare(&build_table_check())?;
        let present: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        let missing: Vec<&str> = REQUIRED_TABLES
            .iter()
            .copied()
            .filter(|t| !present.iter().any(|p| p.as_str() == *t))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::schema_mismatch(format!(
                "missing tables: {}",
                missing.join(", ")
            )));
        }

        let mut stmt = self.conn.prepare(build_status_select())?;
        let statuses: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
        let expected: Vec<(i64, String)> = status_seed()
            .into_iter()
            .map(|(code, name)| (code, name.to_string()))
            .collect();
        if statuses != expected {
            return Err(PipelineError::schema_mismatch(format!(
                "dim_status holds {:?}, expected {:?}",
                statuses, expected
            )));
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<Box<dyn StoreWriter + '_>> {
        let tx = self.conn.transaction()?;
        Ok(Box::new(SqliteWriter { tx }))
    }

    fn events(&self) -> Result<Vec<ProductionEvent>> {
        let mut stmt = self.conn.prepare(&build_fact_select(false))?;
        let rows = stmt
            .query_map([], event_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn events_for_line(&self, line_id: &str) -> Result<Vec<ProductionEvent>> {
        let mut stmt = self.conn.prepare(&build_fact_select(true))?;
        let rows = stmt
            .query_map(params![line_id], event_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn lines(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(build_line_select())?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn quarantined(&self) -> Result<Vec<QuarantineRecord>> {
        let mut stmt = self.conn.prepare(build_quarantine_select())?;
        let rows = stmt
            .query_map([], quarantine_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    fn quarantine_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(build_quarantine_count(), [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Writer holding an open SQLite transaction; rolls back on drop.
struct SqliteWriter<'conn> {
    tx: Transaction<'conn>,
}

impl StoreWriter for SqliteWriter<'_> {
    fn register_line(&mut self, line_id: &str) -> Result<bool> {
        let changed = self.tx.execute(build_line_insert(), params![line_id])?;
        Ok(changed > 0)
    }

    fn insert_event(&mut self, event: &ProductionEvent) -> Result<bool> {
        let record = FactRecord::from(event);
        let changed = self.tx.execute(
            build_fact_insert(),
            params![record.production_line_id, record.status_id, record.event_time],
        )?;
        Ok(changed > 0)
    }

    fn append_quarantine(&mut self, record: &QuarantineRecord) -> Result<()> {
        self.tx.execute(
            build_quarantine_insert(),
            params![
                record.run_id,
                record.event.line_id,
                record.event.status,
                record.event.event_time,
                record.event.reason.as_str(),
                record.event.rejected_at.to_rfc3339(),
                record.content_hash,
            ],
        )?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<ProductionEvent> {
    let line_id: String = row.get(0)?;
    let code: i64 = row.get(1)?;
    let raw_time: String = row.get(2)?;

    let status = Status::from_code(code)
        .ok_or_else(|| conversion_error(1, format!("unknown status_id {}", code)))?;
    let event_time = NaiveDateTime::parse_from_str(&raw_time, TIMESTAMP_FORMAT)
        .map_err(|e| conversion_error(2, format!("bad event_time {:?}: {}", raw_time, e)))?;

    Ok(ProductionEvent::new(line_id, status, event_time))
}

fn quarantine_from_row(row: &Row<'_>) -> rusqlite::Result<QuarantineRecord> {
    let reason_label: String = row.get(4)?;
    let reason = QuarantineReason::from_label(&reason_label)
        .ok_or_else(|| conversion_error(4, format!("unknown reason {:?}", reason_label)))?;
    let raw_rejected: String = row.get(5)?;
    let rejected_at = DateTime::parse_from_rfc3339(&raw_rejected)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(5, format!("bad rejected_at {:?}: {}", raw_rejected, e)))?;

    Ok(QuarantineRecord {
        run_id: row.get(0)?,
        event: QuarantinedEvent {
            line_id: row.get(1)?,
            status: row.get(2)?,
            event_time: row.get(3)?,
            reason,
            rejected_at,
        },
        content_hash: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::format_timestamp;
    use crate::extraction::parse_timestamp;

    fn store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn ev(line: &str, status: Status, ts: &str) -> ProductionEvent {
        ProductionEvent::new(line, status, parse_timestamp(ts).unwrap())
    }

    #[test]
    fn test_ensure_schema_twice() {
        let mut store = store();
        store.ensure_schema().unwrap();
        store.verify_schema().unwrap();
    }

    #[test]
    fn test_open_existing_does_not_create() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let err = SqliteStore::open_existing(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
        assert!(!path.exists());

        SqliteStore::open(&path).unwrap().ensure_schema().unwrap();
        let store = SqliteStore::open_existing(&path).unwrap();
        store.verify_schema().unwrap();
    }

    #[test]
    fn test_verify_without_schema_fails() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.verify_schema().unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_tampered_status_seed_detected() {
        let mut store = store();
        store
            .conn
            .execute("UPDATE dim_status SET status_name = 'RUN' WHERE status_id = 2", [])
            .unwrap();
        assert!(matches!(
            store.ensure_schema().unwrap_err(),
            PipelineError::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut store = store();
        let event = ev("L1", Status::Start, "2024-01-01 08:00:00");

        let mut writer = store.begin().unwrap();
        assert!(writer.register_line("L1").unwrap());
        assert!(!writer.register_line("L1").unwrap());
        assert!(writer.insert_event(&event).unwrap());
        assert!(!writer.insert_event(&event).unwrap());
        writer.commit().unwrap();

        assert_eq!(store.events().unwrap(), vec![event]);
        assert_eq!(store.lines().unwrap(), vec!["L1".to_string()]);
    }

    #[test]
    fn test_fact_requires_registered_line() {
        let mut store = store();
        let mut writer = store.begin().unwrap();
        let err = writer
            .insert_event(&ev("L9", Status::Start, "2024-01-01 08:00:00"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
    }

    #[test]
    fn test_uncommitted_writer_rolls_back() {
        let mut store = store();
        {
            let mut writer = store.begin().unwrap();
            writer.register_line("L1").unwrap();
            writer
                .insert_event(&ev("L1", Status::Start, "2024-01-01 08:00:00"))
                .unwrap();
        }
        assert!(store.events().unwrap().is_empty());
        assert!(store.lines().unwrap().is_empty());
    }

    #[test]
    fn test_quarantine_round_trip() {
        let mut store = store();
        let record = QuarantineRecord::new(
            "run-1",
            QuarantinedEvent::new("L2", "ON", "2024-01-01 08:00:00", QuarantineReason::MissingStart, Utc::now()),
        );
        let mut writer = store.begin().unwrap();
        writer.append_quarantine(&record).unwrap();
        writer.append_quarantine(&record).unwrap();
        writer.commit().unwrap();

        assert_eq!(store.quarantine_count().unwrap(), 2);
        let stored = store.quarantined().unwrap();
        assert_eq!(stored[0].event.reason, QuarantineReason::MissingStart);
        assert_eq!(stored[0].content_hash, record.content_hash);
    }

    #[test]
    fn test_events_ordered_by_line_then_time() {
        let mut store = store();
        let mut writer = store.begin().unwrap();
        writer.register_line("B").unwrap();
        writer.register_line("A").unwrap();
        writer.insert_event(&ev("B", Status::Start, "2024-01-01 07:00:00")).unwrap();
        writer.insert_event(&ev("A", Status::Stop, "2024-01-01 09:00:00")).unwrap();
        writer.insert_event(&ev("A", Status::Start, "2024-01-01 08:00:00")).unwrap();
        writer.commit().unwrap();

        let events = store.events().unwrap();
        let keys: Vec<(String, String)> = events
            .iter()
            .map(|e| (e.line_id.clone(), format_timestamp(&e.event_time)))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A".to_string(), "2024-01-01 08:00:00".to_string()),
                ("A".to_string(), "2024-01-01 09:00:00".to_string()),
                ("B".to_string(), "2024-01-01 07:00:00".to_string()),
            ]
        );
        assert_eq!(store.events_for_line("B").unwrap().len(), 1);
    }
}
