//! Storage engine for SelfHub
//!
//! The [`EntityStore`] trait plus its two implementations: an in-process
//! store and a SQLite document store with an FTS5 index.

mod backend;
mod connection;
mod memory_backend;
mod migrations;
pub mod queries;
mod sqlite_backend;

pub use backend::{open_store, EntityStore, HealthStatus};
pub use connection::Storage;
pub use memory_backend::InMemoryStore;
pub use migrations::SCHEMA_VERSION;
pub use sqlite_backend::SqliteStore;
