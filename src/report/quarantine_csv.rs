//! Quarantine CSV export.

use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::event::QuarantinedEvent;

const HEADER: &str = "production_line_id,status,timestamp,reason,rejected_at";

/// Render quarantined rows as CSV with a header.
pub fn render_quarantine_csv(rows: &[QuarantinedEvent]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for q in rows {
        let fields = [
            escape(&q.line_id),
            escape(&q.status),
            escape(&q.event_time),
            escape(q.reason.as_str()),
            q.rejected_at.to_rfc3339(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Write the current run's quarantined rows to `path`.
pub fn write_quarantine_csv(path: &Path, rows: &[QuarantinedEvent]) -> Result<()> {
    std::fs::write(path, render_quarantine_csv(rows)).map_err(|source| {
        PipelineError::ReportWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    log::info!(
        "QUARANTINE_EXPORTED path={} rows={}",
        path.display(),
        rows.len()
    );
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
