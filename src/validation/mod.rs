//! Sequential validation module.
//!
//! Enforces the per-line START -> (ON)* -> STOP lifecycle:
//! - Line state derived from persisted accepted history
//! - Time-ordered walk of each line's rows
//! - Quarantine with a reason for every violation

pub mod line_state;
pub mod sequence;

pub use line_state::*;
pub use sequence::*;
