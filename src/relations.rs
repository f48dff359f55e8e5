//! Keeps the memory ↔ context link consistent on both sides
//!
//! A context lists its members in `memoryIds`; each member points back
//! through `relations.contextId`. The store links in one operation; this
//! module covers the multi-link and cleanup paths around it.

use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::EntityStore;
use crate::types::{Context, ContextPatch, Memory, MemoryFilter, MemoryId, MemoryPatch};

/// Relation maintenance over a borrowed store
pub struct RelationManager<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> RelationManager<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Link one memory into a context. `NotFound` if either is missing.
    pub fn link(&self, context_id: &str, memory_id: &str) -> Result<()> {
        self.store.link_memory_to_context(memory_id, context_id)
    }

    /// Link each id in order, skipping ids with no stored memory.
    /// Returns the ids that were linked.
    pub fn link_all(&self, context_id: &str, memory_ids: &[MemoryId]) -> Result<Vec<MemoryId>> {
        let mut linked = Vec::with_capacity(memory_ids.len());
        for memory_id in memory_ids {
            if self.store.peek_memory(memory_id)?.is_none() {
                warn!(memory_id = %memory_id, context_id, "skipping link to missing memory");
                continue;
            }
            self.link(context_id, memory_id)?;
            if !linked.contains(memory_id) {
                linked.push(memory_id.clone());
            }
        }
        Ok(linked)
    }

    /// Remove a memory from its owning context's member list.
    /// Called before the memory itself is deleted.
    pub fn detach_memory(&self, memory: &Memory) -> Result<()> {
        let Some(context_id) = memory.context_id() else {
            return Ok(());
        };
        let Some(context) = self.store.get_context(context_id)? else {
            return Ok(());
        };
        if !context.contains(&memory.id) {
            return Ok(());
        }

        let members: Vec<MemoryId> = context
            .memory_ids
            .into_iter()
            .filter(|id| id != &memory.id)
            .collect();
        self.store
            .update_context(context_id, ContextPatch::members(members))?;
        debug!(memory_id = %memory.id, context_id, "memory detached");
        Ok(())
    }

    /// Clear `contextId` on every memory still pointing at `context`.
    /// Called before the context itself is deleted. Returns how many
    /// memories were released.
    pub fn release_context(&self, context: &Context) -> Result<usize> {
        let members = self.store.list_memories(&MemoryFilter {
            context_id: Some(context.id.clone()),
            ..Default::default()
        })?;
        for memory in &members {
            self.store
                .update_memory(&memory.id, MemoryPatch::context(None))?;
        }
        debug!(context_id = %context.id, released = members.len(), "context released");
        Ok(members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::types::ContextType;
    use chrono::Utc;

    fn setup() -> InMemoryStore {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store.create_memory(Memory::new("mem_1", "one", now)).unwrap();
        store.create_memory(Memory::new("mem_2", "two", now)).unwrap();
        store
            .create_context(Context::new("ctx_1", "Work", ContextType::Project, now))
            .unwrap();
        store
    }

    #[test]
    fn test_link_all_skips_missing() {
        let store = setup();
        let relations = RelationManager::new(&store);
        let ids = vec!["mem_2".to_string(), "mem_x".to_string(), "mem_1".to_string()];

        let linked = relations.link_all("ctx_1", &ids).unwrap();
        assert_eq!(linked, vec!["mem_2", "mem_1"]);
        assert_eq!(
            store.get_context("ctx_1").unwrap().unwrap().memory_ids,
            vec!["mem_2", "mem_1"]
        );
    }

    #[test]
    fn test_link_is_idempotent() {
        let store = setup();
        let relations = RelationManager::new(&store);
        relations.link("ctx_1", "mem_1").unwrap();
        relations.link("ctx_1", "mem_1").unwrap();
        assert_eq!(
            store.get_context("ctx_1").unwrap().unwrap().memory_ids,
            vec!["mem_1"]
        );
    }

    #[test]
    fn test_detach_and_release() {
        let store = setup();
        let relations = RelationManager::new(&store);
        relations
            .link_all("ctx_1", &["mem_1".to_string(), "mem_2".to_string()])
            .unwrap();

        let memory = store.peek_memory("mem_1").unwrap().unwrap();
        relations.detach_memory(&memory).unwrap();
        assert!(store.delete_memory("mem_1").unwrap());
        assert_eq!(
            store.get_context("ctx_1").unwrap().unwrap().memory_ids,
            vec!["mem_2"]
        );

        let context = store.get_context("ctx_1").unwrap().unwrap();
        assert_eq!(relations.release_context(&context).unwrap(), 1);
        assert_eq!(store.peek_memory("mem_2").unwrap().unwrap().context_id(), None);
    }

    #[test]
    fn test_detach_without_context_is_noop() {
        let store = setup();
        let memory = store.peek_memory("mem_1").unwrap().unwrap();
        RelationManager::new(&store).detach_memory(&memory).unwrap();
    }
}
