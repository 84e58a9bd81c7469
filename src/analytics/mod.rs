//! Analytics module.
//!
//! Derived, recomputable views over the fact store:
//! - Cycles (START -> STOP, open cycles flagged)
//! - Intervals between adjacent events, classed uptime or downtime
//! - KPIs: per-line cycles, floor totals, worst-downtime line

pub mod cycles;
pub mod engine;
pub mod intervals;
pub mod kpi;

pub use cycles::*;
pub use engine::*;
pub use intervals::*;
pub use kpi::*;
