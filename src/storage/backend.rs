//! Entity store trait shared by the in-memory and document-store backends
//!
//! Backends persist whole [`Memory`] and [`Context`] documents. They own the
//! two multi-step operations that must not interleave with other writers
//! (linking a memory into a context and activating a context); everything
//! else is orchestrated by the service layer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{HubError, Result};
use crate::query::aggregation::{compute_stats, HubStats};
use crate::types::{
    BackendKind, Context, ContextFilter, ContextPatch, Memory, MemoryFilter, MemoryPatch,
    StorageConfig,
};

/// Health status of a store
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Latency of a trivial round trip in milliseconds
    pub latency_ms: f64,
    pub error: Option<String>,
    pub details: HashMap<String, String>,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            healthy: true,
            latency_ms: 0.0,
            error: None,
            details: HashMap::new(),
        }
    }
}

/// Persistence primitives for memories and contexts.
///
/// Absence is reported as `Ok(None)` from reads and `Ok(false)` from deletes;
/// updates of a missing entity return [`HubError::NotFound`].
pub trait EntityStore: Send + Sync {
    // ========================================================================
    // Memories
    // ========================================================================

    /// Store a new memory. `DuplicateKey` if the id is taken.
    fn create_memory(&self, memory: Memory) -> Result<Memory>;

    /// Read a memory by id, recording the access (`accessCount`,
    /// `lastAccessedAt`, `updatedAt`) before returning it.
    fn get_memory(&self, id: &str) -> Result<Option<Memory>>;

    /// Read a memory by id without touching access bookkeeping
    fn peek_memory(&self, id: &str) -> Result<Option<Memory>>;

    /// Merge a partial update, validate the result and persist it
    fn update_memory(&self, id: &str, patch: MemoryPatch) -> Result<Memory>;

    fn delete_memory(&self, id: &str) -> Result<bool>;

    /// All memories matching `filter`, newest first
    fn list_memories(&self, filter: &MemoryFilter) -> Result<Vec<Memory>>;

    /// Case-insensitive substring search over content, title, description
    /// and tags. Returns at most `candidate_limit` hits, best first.
    fn search_memories(&self, query: &str, candidate_limit: usize) -> Result<Vec<Memory>>;

    fn count_memories(&self) -> Result<usize> {
        Ok(self.list_memories(&MemoryFilter::default())?.len())
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    fn create_context(&self, context: Context) -> Result<Context>;

    fn get_context(&self, id: &str) -> Result<Option<Context>>;

    fn update_context(&self, id: &str, patch: ContextPatch) -> Result<Context>;

    fn delete_context(&self, id: &str) -> Result<bool>;

    /// All contexts matching `filter`, oldest first
    fn list_contexts(&self, filter: &ContextFilter) -> Result<Vec<Context>>;

    fn count_contexts(&self) -> Result<usize> {
        Ok(self.list_contexts(&ContextFilter::default())?.len())
    }

    // ========================================================================
    // Relations
    // ========================================================================

    /// Make `context_id` the owner of `memory_id` as one operation.
    ///
    /// Adds the id to the context's `memoryIds` (no duplicates), sets the
    /// memory's `relations.contextId`, and removes the id from any previous
    /// owner. `NotFound` if either side is missing.
    fn link_memory_to_context(&self, memory_id: &str, context_id: &str) -> Result<()>;

    /// Deactivate every active context, then activate `id`.
    ///
    /// When `id` does not exist the deactivation still happens and
    /// `NotFound` is returned.
    fn activate_context(&self, id: &str) -> Result<Context>;

    // ========================================================================
    // Maintenance
    // ========================================================================

    fn stats(&self) -> Result<HubStats> {
        let memories = self.list_memories(&MemoryFilter::default())?;
        let total_contexts = self.count_contexts()?;
        Ok(compute_stats(&memories, total_contexts))
    }

    fn health_check(&self) -> Result<HealthStatus>;

    fn backend_name(&self) -> &'static str;
}

/// Open the store selected by `config`
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn EntityStore>> {
    match config.backend {
        BackendKind::Memory => Ok(Arc::new(super::InMemoryStore::new())),
        BackendKind::Sqlite => {
            if config.db_path.trim().is_empty() {
                return Err(HubError::Config("db_path cannot be empty".to_string()));
            }
            Ok(Arc::new(super::SqliteStore::new(config)?))
        }
    }
}
