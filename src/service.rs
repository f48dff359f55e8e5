//! Memory and context use-cases over an injected [`EntityStore`]

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::{HubError, Result};
use crate::query::{
    filter_memories, paginate, sort_memories, HubStats, Page, SearchHit, DEFAULT_LIST_LIMIT,
    DEFAULT_SEARCH_LIMIT, SEARCH_CANDIDATE_LIMIT,
};
use crate::relations::RelationManager;
use crate::storage::{open_store, EntityStore, HealthStatus, InMemoryStore};
use crate::types::*;

/// Entry point for every memory/context operation
#[derive(Clone)]
pub struct MemoryHub {
    store: Arc<dyn EntityStore>,
}

impl MemoryHub {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Open the store selected by `config`
    pub fn open(config: &StorageConfig) -> Result<Self> {
        Ok(Self::new(open_store(config)?))
    }

    /// Hub over a fresh in-process store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn relations(&self) -> RelationManager<'_> {
        RelationManager::new(self.store.as_ref())
    }

    // ========================================================================
    // Memories
    // ========================================================================

    /// Store a new memory, linking it into `input.context_id` when given.
    pub fn store_memory(&self, input: CreateMemoryInput) -> Result<Memory> {
        let importance =
            validate_importance(input.metadata.importance.unwrap_or(DEFAULT_IMPORTANCE as i64))?;

        if let Some(ref context_id) = input.context_id {
            if self.store.get_context(context_id)?.is_none() {
                return Err(HubError::context_not_found(context_id));
            }
        }

        let mut memory = Memory::new(generate_id("mem"), input.content, Utc::now());
        memory.memory_type = input.memory_type.unwrap_or_default();
        memory.category = input.category.unwrap_or_default();
        memory.metadata.title = input.metadata.title;
        memory.metadata.description = input.metadata.description;
        memory.metadata.tags = dedup_tags(input.metadata.tags.unwrap_or_default());
        memory.metadata.source = input.metadata.source;
        memory.metadata.expires_at = input.metadata.expires_at;
        memory.metadata.importance = importance;
        memory.privacy.encrypted = input.encrypt;

        let memory = self.store.create_memory(memory)?;
        debug!(id = %memory.id, category = %memory.category, "memory created");

        match input.context_id {
            Some(context_id) => {
                self.relations().link(&context_id, &memory.id)?;
                self.store
                    .peek_memory(&memory.id)?
                    .ok_or_else(|| HubError::memory_not_found(&memory.id))
            }
            None => Ok(memory),
        }
    }

    /// Read a memory by id, counting the access
    pub fn retrieve_memory(&self, id: &str) -> Result<Memory> {
        self.store
            .get_memory(id)?
            .ok_or_else(|| HubError::memory_not_found(id))
    }

    pub fn update_memory(&self, input: UpdateMemoryInput) -> Result<Memory> {
        let patch = MemoryPatch {
            content: input.content,
            memory_type: input.memory_type,
            category: input.category,
            metadata: input.metadata,
            relations: None,
            privacy: input.privacy,
        };
        let memory = self.store.update_memory(&input.id, patch)?;
        debug!(id = %memory.id, "memory updated");
        Ok(memory)
    }

    /// Delete a memory, removing it from its context first.
    /// Returns false when nothing was stored under `id`.
    pub fn delete_memory(&self, id: &str) -> Result<bool> {
        let Some(memory) = self.store.peek_memory(id)? else {
            return Ok(false);
        };
        self.relations().detach_memory(&memory)?;
        let removed = self.store.delete_memory(id)?;
        debug!(id, removed, "memory deleted");
        Ok(removed)
    }

    pub fn list_memories(&self, input: ListMemoriesInput) -> Result<Page<Memory>> {
        let mut memories = self.store.list_memories(&input.filter())?;
        sort_memories(
            &mut memories,
            input.sort_by.unwrap_or_default(),
            input.sort_order.unwrap_or_default(),
        );
        Ok(paginate(
            memories,
            input.offset,
            input.limit,
            DEFAULT_LIST_LIMIT,
        ))
    }

    /// Lexical search; `total` counts the filtered candidates
    pub fn search_memories(&self, input: SearchMemoriesInput) -> Result<Page<SearchHit>> {
        if input.query.trim().is_empty() {
            return Err(HubError::validation("search query cannot be empty"));
        }

        let candidates = self
            .store
            .search_memories(&input.query, SEARCH_CANDIDATE_LIMIT)?;
        let hits = filter_memories(candidates, &input.filter());
        debug!(query = %input.query, hits = hits.len(), "search");

        Ok(paginate(hits, input.offset, input.limit, DEFAULT_SEARCH_LIMIT).map(SearchHit::from))
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    /// Create an inactive context and link the given memories into it
    pub fn create_context(&self, input: CreateContextInput) -> Result<Context> {
        let mut context = Context::new(generate_id("ctx"), input.name, input.context_type, Utc::now());
        context.description = input.description;
        context.metadata.tags = dedup_tags(input.tags.unwrap_or_default());

        let context = self.store.create_context(context)?;
        debug!(id = %context.id, "context created");

        match input.memory_ids {
            Some(ref memory_ids) if !memory_ids.is_empty() => {
                self.relations().link_all(&context.id, memory_ids)?;
                self.get_context(&context.id)
            }
            _ => Ok(context),
        }
    }

    pub fn get_context(&self, id: &str) -> Result<Context> {
        self.store
            .get_context(id)?
            .ok_or_else(|| HubError::context_not_found(id))
    }

    /// Update context fields. Setting `active: true` goes through activation
    /// so no other context stays active.
    pub fn update_context(&self, input: UpdateContextInput) -> Result<Context> {
        let deactivate = input.active == Some(false);
        let patch = ContextPatch {
            name: input.name,
            description: input.description,
            memory_ids: None,
            metadata: Some(ContextMetadataPatch {
                tags: input.tags,
                active: deactivate.then_some(false),
            }),
        };
        let context = self.store.update_context(&input.id, patch)?;

        if input.active == Some(true) {
            return self.activate_context(&context.id);
        }
        Ok(context)
    }

    /// Delete a context, clearing `contextId` on its members first.
    pub fn delete_context(&self, id: &str) -> Result<bool> {
        let Some(context) = self.store.get_context(id)? else {
            return Ok(false);
        };
        self.relations().release_context(&context)?;
        let removed = self.store.delete_context(id)?;
        debug!(id, removed, "context deleted");
        Ok(removed)
    }

    pub fn list_contexts(&self, filter: &ContextFilter) -> Result<Vec<Context>> {
        self.store.list_contexts(filter)
    }

    /// Make `id` the only active context
    pub fn activate_context(&self, id: &str) -> Result<Context> {
        let context = self.store.activate_context(id)?;
        debug!(id, "context activated");
        Ok(context)
    }

    /// Link a memory into a context and return the updated context
    pub fn add_memory_to_context(&self, context_id: &str, memory_id: &str) -> Result<Context> {
        self.relations().link(context_id, memory_id)?;
        self.get_context(context_id)
    }

    /// Member memories in `memoryIds` order. Dangling ids are skipped and
    /// access counters are left alone.
    pub fn get_context_memories(&self, context_id: &str) -> Result<Vec<Memory>> {
        let context = self.get_context(context_id)?;
        let mut memories = Vec::with_capacity(context.memory_ids.len());
        for memory_id in &context.memory_ids {
            if let Some(memory) = self.store.peek_memory(memory_id)? {
                memories.push(memory);
            }
        }
        Ok(memories)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    pub fn stats(&self) -> Result<HubStats> {
        self.store.stats()
    }

    pub fn health_check(&self) -> Result<HealthStatus> {
        self.store.health_check()
    }
}
