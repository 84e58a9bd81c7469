//! LineCycle Core - production-line event pipeline
//!
//! Ingests production-line status events (line id, START/ON/STOP, timestamp),
//! validates them against each line's START → ON → STOP lifecycle, loads the
//! accepted ones idempotently, and answers three floor questions from the
//! loaded facts. The implementation prioritizes:
//!
//! 1. **Correctness** - Every row is either accepted or quarantined with a reason
//! 2. **Logging** - Every decision point logged with run and line context
//! 3. **Idempotence** - Re-running the same input never changes the facts
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `event` - Status vocabulary, events and quarantine reasons
//! - `extraction` - Row parsing and timestamp normalization
//! - `routing` - Per-event lifecycle decision table
//! - `validation` - Per-line sequential validation seeded by persisted history
//! - `storage` - Fact store trait, SQLite and in-memory implementations
//! - `loader` - Transactional, idempotent loading
//! - `analytics` - Cycle/interval derivation and floor KPIs
//! - `report` - Text/JSON report and quarantine CSV export
//! - `pipeline` - Run orchestration
//! - `config` / `error` / `logging` - Ambient plumbing

pub mod analytics;
pub mod config;
pub mod error;
pub mod event;
pub mod extraction;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod routing;
pub mod storage;
pub mod validation;

pub use error::{ExitStatus, PipelineError, Result};
pub use logging::init_logger;
