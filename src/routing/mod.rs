//! Routing decision module.
//!
//! Determines where each well-formed event goes:
//! - Fact store (accepted, advancing the line lifecycle)
//! - Quarantine store (rejected with a reason, state unchanged)

pub mod decision;

pub use decision::*;
