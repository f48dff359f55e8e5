//! In-process entity store
//!
//! Keeps both collections behind one `parking_lot::RwLock`, so every
//! operation (including link and activate) sees a consistent snapshot.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use super::backend::{EntityStore, HealthStatus};
use crate::error::{EntityKind, HubError, Result};
use crate::types::{Context, ContextFilter, ContextPatch, Memory, MemoryFilter, MemoryPatch};

/// A stored entity plus its insertion sequence, used to break timestamp ties
struct Slot<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct Collections {
    memories: HashMap<String, Slot<Memory>>,
    contexts: HashMap<String, Slot<Context>>,
    next_seq: u64,
}

impl Collections {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Memories newest first; ties go to the later insertion
    fn memories_newest_first(&self) -> Vec<&Slot<Memory>> {
        let mut slots: Vec<&Slot<Memory>> = self.memories.values().collect();
        slots.sort_by_key(|s| (Reverse(s.value.metadata.created_at), Reverse(s.seq)));
        slots
    }
}

/// Entity store held entirely in process memory
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(memory: &Memory, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);
    contains(&memory.content)
        || memory.metadata.title.as_deref().is_some_and(contains)
        || memory.metadata.description.as_deref().is_some_and(contains)
        || memory.metadata.tags.iter().any(|tag| contains(tag))
}

impl EntityStore for InMemoryStore {
    fn create_memory(&self, memory: Memory) -> Result<Memory> {
        memory.validate()?;
        let mut inner = self.inner.write();
        if inner.memories.contains_key(&memory.id) {
            return Err(HubError::DuplicateKey {
                kind: EntityKind::Memory,
                id: memory.id,
            });
        }
        let seq = inner.next_seq();
        debug!(id = %memory.id, seq, "memory stored");
        inner.memories.insert(
            memory.id.clone(),
            Slot {
                seq,
                value: memory.clone(),
            },
        );
        Ok(memory)
    }

    fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        let mut inner = self.inner.write();
        Ok(inner.memories.get_mut(id).map(|slot| {
            slot.value.touch(Utc::now());
            slot.value.clone()
        }))
    }

    fn peek_memory(&self, id: &str) -> Result<Option<Memory>> {
        let inner = self.inner.read();
        Ok(inner.memories.get(id).map(|slot| slot.value.clone()))
    }

    fn update_memory(&self, id: &str, patch: MemoryPatch) -> Result<Memory> {
        let mut inner = self.inner.write();
        let slot = inner
            .memories
            .get_mut(id)
            .ok_or_else(|| HubError::memory_not_found(id))?;

        let mut updated = slot.value.clone();
        updated.apply_patch(patch, Utc::now())?;
        updated.validate()?;
        slot.value = updated.clone();
        Ok(updated)
    }

    fn delete_memory(&self, id: &str) -> Result<bool> {
        Ok(self.inner.write().memories.remove(id).is_some())
    }

    fn list_memories(&self, filter: &MemoryFilter) -> Result<Vec<Memory>> {
        let inner = self.inner.read();
        Ok(inner
            .memories_newest_first()
            .into_iter()
            .filter(|slot| filter.matches(&slot.value))
            .map(|slot| slot.value.clone())
            .collect())
    }

    fn search_memories(&self, query: &str, candidate_limit: usize) -> Result<Vec<Memory>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read();
        Ok(inner
            .memories_newest_first()
            .into_iter()
            .filter(|slot| matches_query(&slot.value, &needle))
            .take(candidate_limit)
            .map(|slot| slot.value.clone())
            .collect())
    }

    fn count_memories(&self) -> Result<usize> {
        Ok(self.inner.read().memories.len())
    }

    fn create_context(&self, context: Context) -> Result<Context> {
        context.validate()?;
        let mut inner = self.inner.write();
        if inner.contexts.contains_key(&context.id) {
            return Err(HubError::DuplicateKey {
                kind: EntityKind::Context,
                id: context.id,
            });
        }
        let seq = inner.next_seq();
        inner.contexts.insert(
            context.id.clone(),
            Slot {
                seq,
                value: context.clone(),
            },
        );
        Ok(context)
    }

    fn get_context(&self, id: &str) -> Result<Option<Context>> {
        let inner = self.inner.read();
        Ok(inner.contexts.get(id).map(|slot| slot.value.clone()))
    }

    fn update_context(&self, id: &str, patch: ContextPatch) -> Result<Context> {
        let mut inner = self.inner.write();
        let slot = inner
            .contexts
            .get_mut(id)
            .ok_or_else(|| HubError::context_not_found(id))?;

        let mut updated = slot.value.clone();
        updated.apply_patch(patch, Utc::now());
        updated.validate()?;
        slot.value = updated.clone();
        Ok(updated)
    }

    fn delete_context(&self, id: &str) -> Result<bool> {
        Ok(self.inner.write().contexts.remove(id).is_some())
    }

    fn list_contexts(&self, filter: &ContextFilter) -> Result<Vec<Context>> {
        let inner = self.inner.read();
        let mut slots: Vec<&Slot<Context>> = inner
            .contexts
            .values()
            .filter(|slot| filter.matches(&slot.value))
            .collect();
        slots.sort_by_key(|s| (s.value.metadata.created_at, s.seq));
        Ok(slots.into_iter().map(|slot| slot.value.clone()).collect())
    }

    fn count_contexts(&self) -> Result<usize> {
        Ok(self.inner.read().contexts.len())
    }

    fn link_memory_to_context(&self, memory_id: &str, context_id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.contexts.contains_key(context_id) {
            return Err(HubError::context_not_found(context_id));
        }
        let now = Utc::now();

        let previous = {
            let slot = inner
                .memories
                .get_mut(memory_id)
                .ok_or_else(|| HubError::memory_not_found(memory_id))?;
            let previous = slot.value.relations.context_id.replace(context_id.to_string());
            slot.value.metadata.updated_at = now;
            previous
        };

        if let Some(previous) = previous.filter(|p| p != context_id) {
            if let Some(slot) = inner.contexts.get_mut(&previous) {
                if slot.value.remove_member(memory_id) {
                    slot.value.metadata.updated_at = now;
                }
            }
        }

        if let Some(slot) = inner.contexts.get_mut(context_id) {
            slot.value.add_member(memory_id);
            slot.value.metadata.updated_at = now;
        }

        debug!(memory_id, context_id, "memory linked");
        Ok(())
    }

    fn activate_context(&self, id: &str) -> Result<Context> {
        let mut inner = self.inner.write();
        let now = Utc::now();

        for slot in inner.contexts.values_mut() {
            if slot.value.metadata.active {
                slot.value.metadata.active = false;
                slot.value.metadata.updated_at = now;
            }
        }

        let slot = inner
            .contexts
            .get_mut(id)
            .ok_or_else(|| HubError::context_not_found(id))?;
        slot.value.metadata.active = true;
        slot.value.metadata.updated_at = now;
        Ok(slot.value.clone())
    }

    fn health_check(&self) -> Result<HealthStatus> {
        let start = Instant::now();
        let inner = self.inner.read();
        let mut status = HealthStatus {
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            ..Default::default()
        };
        status
            .details
            .insert("memories".to_string(), inner.memories.len().to_string());
        status
            .details
            .insert("contexts".to_string(), inner.contexts.len().to_string());
        Ok(status)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
