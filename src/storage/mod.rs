//! Storage module.
//!
//! Star-schema persistence for accepted events and the quarantine:
//! - `FactStore` / `StoreWriter` traits
//! - SQLite implementation (the production store)
//! - In-memory implementation (dry runs)
//! - SQL statement builders and row models

pub mod memory;
pub mod models;
pub mod queries;
pub mod sqlite;
pub mod store;

pub use memory::*;
pub use models::*;
pub use queries::*;
pub use sqlite::*;
pub use store::*;
