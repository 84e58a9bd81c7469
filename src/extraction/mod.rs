//! Input extraction module.
//!
//! Reads the tabular input and types each row:
//! - Header detection and column mapping
//! - Timestamp parsing (second precision)
//! - Pre-validation rejection of malformed rows and unknown statuses

pub mod rows;
pub mod timestamp;

pub use rows::*;
pub use timestamp::*;
