//! Pipeline orchestration module.
//!
//! Main ingestion pipeline that coordinates:
//! - Row extraction
//! - Sequential validation
//! - Idempotent loading
//! - Quarantine recording

pub mod context;
pub mod ingestion;

pub use context::*;
pub use ingestion::*;
