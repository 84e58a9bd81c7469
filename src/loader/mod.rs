//! Idempotent loading of validated events.

pub mod idempotent;

pub use idempotent::*;
