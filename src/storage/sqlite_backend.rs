//! Document-store implementation of [`EntityStore`] on SQLite
//!
//! Wraps [`Storage`] and delegates to the functions in `queries.rs`.
//! Writes run inside a transaction so projections, tags and the FTS index
//! move together with the stored document.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};

use super::backend::{EntityStore, HealthStatus};
use super::connection::Storage;
use super::migrations;
use super::queries;
use crate::error::{HubError, Result};
use crate::query::aggregation::HubStats;
use crate::types::{
    Context, ContextFilter, ContextPatch, Memory, MemoryFilter, MemoryPatch, StorageConfig,
};

/// SQLite-backed entity store
pub struct SqliteStore {
    storage: Storage,
}

impl SqliteStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let storage = Storage::open(config.clone())?;
        if let Some(warning) = storage.storage_mode_warning() {
            warn!("{}", warning);
        }
        Ok(Self { storage })
    }

    /// Private in-process database (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let storage = Storage::open_in_memory()?;
        Ok(Self { storage })
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl EntityStore for SqliteStore {
    fn create_memory(&self, memory: Memory) -> Result<Memory> {
        memory.validate()?;
        self.storage
            .with_transaction(|conn| queries::create_memory(conn, &memory))?;
        debug!(id = %memory.id, "memory stored");
        Ok(memory)
    }

    fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        self.storage
            .with_transaction(|conn| queries::touch_memory(conn, id))
    }

    fn peek_memory(&self, id: &str) -> Result<Option<Memory>> {
        self.storage
            .with_connection(|conn| queries::get_memory(conn, id))
    }

    fn update_memory(&self, id: &str, patch: MemoryPatch) -> Result<Memory> {
        self.storage
            .with_transaction(|conn| queries::update_memory(conn, id, patch))
    }

    fn delete_memory(&self, id: &str) -> Result<bool> {
        self.storage
            .with_transaction(|conn| queries::delete_memory(conn, id))
    }

    fn list_memories(&self, filter: &MemoryFilter) -> Result<Vec<Memory>> {
        self.storage
            .with_connection(|conn| queries::list_memories(conn, filter))
    }

    fn search_memories(&self, query: &str, candidate_limit: usize) -> Result<Vec<Memory>> {
        self.storage
            .with_connection(|conn| queries::search_memories(conn, query, candidate_limit))
    }

    fn count_memories(&self) -> Result<usize> {
        self.storage.with_connection(queries::count_memories)
    }

    fn create_context(&self, context: Context) -> Result<Context> {
        context.validate()?;
        self.storage
            .with_transaction(|conn| queries::create_context(conn, &context))?;
        Ok(context)
    }

    fn get_context(&self, id: &str) -> Result<Option<Context>> {
        self.storage
            .with_connection(|conn| queries::get_context(conn, id))
    }

    fn update_context(&self, id: &str, patch: ContextPatch) -> Result<Context> {
        self.storage
            .with_transaction(|conn| queries::update_context(conn, id, patch))
    }

    fn delete_context(&self, id: &str) -> Result<bool> {
        self.storage
            .with_transaction(|conn| queries::delete_context(conn, id))
    }

    fn list_contexts(&self, filter: &ContextFilter) -> Result<Vec<Context>> {
        self.storage
            .with_connection(|conn| queries::list_contexts(conn, filter))
    }

    fn count_contexts(&self) -> Result<usize> {
        self.storage.with_connection(queries::count_contexts)
    }

    fn link_memory_to_context(&self, memory_id: &str, context_id: &str) -> Result<()> {
        self.storage.with_transaction(|conn| {
            queries::link_memory_to_context(conn, memory_id, context_id)
        })?;
        debug!(memory_id, context_id, "memory linked");
        Ok(())
    }

    fn activate_context(&self, id: &str) -> Result<Context> {
        // The deactivation commits even when the target turns out to be missing
        let activated = self.storage.with_transaction(|conn| {
            let deactivated = queries::deactivate_all(conn)?;
            debug!(deactivated, "contexts deactivated");
            queries::mark_active(conn, id)
        })?;
        activated.ok_or_else(|| HubError::context_not_found(id))
    }

    fn stats(&self) -> Result<HubStats> {
        self.storage.with_connection(queries::get_stats)
    }

    fn health_check(&self) -> Result<HealthStatus> {
        let start = Instant::now();

        let result = self.storage.with_connection(migrations::schema_version);

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let db_path = self.storage.db_path().to_string();

        match result {
            Ok(version) => {
                let mut details = HashMap::from([
                    ("db_path".to_string(), db_path),
                    (
                        "storage_mode".to_string(),
                        format!("{:?}", self.storage.storage_mode()),
                    ),
                    ("schema_version".to_string(), version.to_string()),
                ]);
                if let Ok(size) = self.storage.db_size() {
                    details.insert("db_size_bytes".to_string(), size.to_string());
                }
                Ok(HealthStatus {
                    healthy: true,
                    latency_ms,
                    error: None,
                    details,
                })
            }
            Err(e) => Ok(HealthStatus {
                healthy: false,
                latency_ms,
                error: Some(e.to_string()),
                details: HashMap::from([("db_path".to_string(), db_path)]),
            }),
        }
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
