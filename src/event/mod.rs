//! Event model.
//!
//! The immutable production-line event, its three status values, and the
//! quarantine record produced for every rejected input row.

pub mod model;

pub use model::*;
