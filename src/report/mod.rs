//! Report module.
//!
//! Human-readable and JSON reports of the floor KPIs, plus the quarantine
//! CSV export.

pub mod builder;
pub mod markdown;
pub mod quarantine_csv;

pub use builder::*;
pub use markdown::*;
pub use quarantine_csv::*;
