//! Database models for event storage.
//!
//! These models represent the structure of data in the database tables.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::event::{format_timestamp, ProductionEvent, QuarantinedEvent};

/// A fact-store row, as written to `fact_process_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRecord {
    pub production_line_id: String,
    pub status_id: i64,
    pub event_time: String,
}

impl From<&ProductionEvent> for FactRecord {
    fn from(event: &ProductionEvent) -> Self {
        Self {
            production_line_id: event.line_id.clone(),
            status_id: event.status.code(),
            event_time: format_timestamp(&event.event_time),
        }
    }
}

/// A quarantine-store row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub run_id: String,
    #[serde(flatten)]
    pub event: QuarantinedEvent,
    /// SHA-256 of the raw row, for spotting the same bad row across runs.
    pub content_hash: String,
}

impl QuarantineRecord {
    pub fn new(run_id: &str, event: QuarantinedEvent) -> Self {
        let content_hash = compute_hash(&format!(
            "{},{},{}",
            event.line_id, event.status, event.event_time
        ));
        Self {
            run_id: run_id.to_string(),
            event,
            content_hash,
        }
    }
}

/// Compute SHA256 hash of content.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}
