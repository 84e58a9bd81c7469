//! SQL statements.
//!
//! Star schema: two dimensions (`dim_status`, `dim_production_line`), one
//! fact table (`fact_process_events`) and the append-only
//! `quarantine_events` table.

/// Tables every store must have.
pub const REQUIRED_TABLES: &[&str] = &[
    "dim_status",
    "dim_production_line",
    "fact_process_events",
    "quarantine_events",
];

/// Idempotent schema creation.
pub fn build_schema_ddl() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS dim_status (
        status_id   INTEGER PRIMARY KEY,
        status_name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS dim_production_line (
        production_line_id TEXT PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS fact_process_events (
        production_line_id TEXT NOT NULL
            REFERENCES dim_production_line (production_line_id),
        status_id  INTEGER NOT NULL REFERENCES dim_status (status_id),
        event_time TEXT NOT NULL,
        PRIMARY KEY (production_line_id, event_time)
    );

    CREATE TABLE IF NOT EXISTS quarantine_events (
        quarantine_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id             TEXT NOT NULL,
        production_line_id TEXT NOT NULL,
        status_as_given    TEXT NOT NULL,
        event_time         TEXT NOT NULL,
        reason             TEXT NOT NULL,
        rejected_at        TEXT NOT NULL,
        content_hash       TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_quarantine_run ON quarantine_events (run_id);
    "#
}

/// Seed one status row; existing rows are left alone.
pub fn build_status_seed() -> &'static str {
    "INSERT INTO dim_status (status_id, status_name) VALUES (?1, ?2) ON CONFLICT (status_id) DO NOTHING"
}

pub fn build_status_select() -> &'static str {
    "SELECT status_id, status_name FROM dim_status ORDER BY status_id"
}

/// Check which of the required tables exist.
pub fn build_table_check() -> String {
    let names: Vec<String> = REQUIRED_TABLES.iter().map(|t| format!("'{}'", t)).collect();
    format!(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ({})",
        names.join(", ")
    )
}

/// Register a line; a no-op when the line exists.
pub fn build_line_insert() -> &'static str {
    "INSERT INTO dim_production_line (production_line_id) VALUES (?1) \
     ON CONFLICT (production_line_id) DO NOTHING"
}

/// Insert a fact; a no-op when the natural key exists.
pub fn build_fact_insert() -> &'static str {
    "INSERT INTO fact_process_events (production_line_id, status_id, event_time) \
     VALUES (?1, ?2, ?3) ON CONFLICT (production_line_id, event_time) DO NOTHING"
}

pub fn build_quarantine_insert() -> &'static str {
    r#"
    INSERT INTO quarantine_events
        (run_id, production_line_id, status_as_given, event_time, reason, rejected_at, content_hash)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#
}

/// All facts, grouped by line and in time order.
pub fn build_fact_select(by_line: bool) -> String {
    let filter = if by_line {
        " WHERE production_line_id = ?1"
    } else {
        ""
    };
    format!(
        "SELECT production_line_id, status_id, event_time FROM fact_process_events{} \
         ORDER BY production_line_id, event_time",
        filter
    )
}

pub fn build_line_select() -> &'static str {
    "SELECT production_line_id FROM dim_production_line ORDER BY production_line_id"
}

pub fn build_quarantine_select() -> &'static str {
    r#"
    SELECT run_id, production_line_id, status_as_given, event_time, reason, rejected_at, content_hash
    FROM quarantine_events
    ORDER BY quarantine_id
    "#
}

pub fn build_quarantine_count() -> &'static str {
    "SELECT COUNT(*) FROM quarantine_events"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_insert_is_idempotent() {
        let query = build_fact_insert();
        assert!(query.contains("INSERT INTO fact_process_events"));
        assert!(query.contains("ON CONFLICT (production_line_id, event_time) DO NOTHING"));
    }

    #[test]
    fn test_fact_select_filter() {
        assert!(build_fact_select(true).contains("WHERE production_line_id = ?1"));
        assert!(!build_fact_select(false).contains("WHERE"));
    }

    #[test]
    fn test_table_check_lists_all_tables() {
        let query = build_table_check();
        for table in REQUIRED_TABLES {
            assert!(query.contains(table));
        }
    }
}
