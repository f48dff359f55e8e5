//! Behavior every `EntityStore` implementation must share
//!
//! Each check runs against the in-process store and the SQLite document
//! store.
//!
//! Run with: cargo test --test store_contract

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;

use selfhub::error::HubError;
use selfhub::storage::{EntityStore, InMemoryStore, SqliteStore};
use selfhub::types::*;

fn memory(id: &str, content: &str, age_secs: i64) -> Memory {
    Memory::new(id, content, Utc::now() - Duration::seconds(age_secs))
}

fn tagged(id: &str, content: &str, tags: &[&str], age_secs: i64) -> Memory {
    let mut m = memory(id, content, age_secs);
    m.metadata.tags = tags.iter().map(|t| t.to_string()).collect();
    m
}

fn context(id: &str, name: &str, age_secs: i64) -> Context {
    Context::new(
        id,
        name,
        ContextType::Project,
        Utc::now() - Duration::seconds(age_secs),
    )
}

fn ids(memories: &[Memory]) -> Vec<&str> {
    memories.iter().map(|m| m.id.as_str()).collect()
}

// ============================================================================
// Contract checks
// ============================================================================

fn create_and_read_back(store: &dyn EntityStore) {
    let mut input = tagged("mem_1", "Use dark mode", &["ui"], 0);
    input.category = DataCategory::Personal;
    input.metadata.title = Some("UI".to_string());

    let created = store.create_memory(input.clone()).unwrap();
    assert_eq!(created, input);

    let peeked = store.peek_memory("mem_1").unwrap().unwrap();
    assert_eq!(peeked, input);
    assert!(store.get_memory("mem_missing").unwrap().is_none());
}

fn duplicate_ids_rejected(store: &dyn EntityStore) {
    store.create_memory(memory("mem_1", "a", 0)).unwrap();
    let err = store.create_memory(memory("mem_1", "b", 0)).unwrap_err();
    assert!(matches!(err, HubError::DuplicateKey { .. }));

    store.create_context(context("ctx_1", "A", 0)).unwrap();
    let err = store.create_context(context("ctx_1", "B", 0)).unwrap_err();
    assert!(matches!(err, HubError::DuplicateKey { .. }));
}

fn invalid_documents_rejected(store: &dyn EntityStore) {
    let err = store.create_memory(memory("mem_1", "   ", 0)).unwrap_err();
    assert!(matches!(err, HubError::Validation(_)));

    let mut too_important = memory("mem_2", "x", 0);
    too_important.metadata.importance = 6;
    assert!(store.create_memory(too_important).is_err());
    assert_eq!(store.count_memories().unwrap(), 0);
}

fn reads_count_access(store: &dyn EntityStore) {
    let original = memory("mem_1", "a", 60);
    store.create_memory(original.clone()).unwrap();

    let first = store.get_memory("mem_1").unwrap().unwrap();
    assert!(first.metadata.updated_at > original.metadata.updated_at);
    assert_eq!(first.metadata.last_accessed_at, Some(first.metadata.updated_at));
    assert_eq!(first.metadata.created_at, original.metadata.created_at);
    let second = store.get_memory("mem_1").unwrap().unwrap();
    assert_eq!(first.metadata.access_count, 1);
    assert_eq!(second.metadata.access_count, 2);
    assert!(second.metadata.last_accessed_at.is_some());

    let peeked = store.peek_memory("mem_1").unwrap().unwrap();
    assert_eq!(peeked.metadata.access_count, 2);
}

fn list_and_search_leave_access_alone(store: &dyn EntityStore) {
    let original = tagged("mem_1", "rust borrow checker", &["rust"], 60);
    store.create_memory(original.clone()).unwrap();

    for _ in 0..3 {
        assert_eq!(store.list_memories(&MemoryFilter::default()).unwrap().len(), 1);
        assert_eq!(store.search_memories("rust", 10).unwrap().len(), 1);
        assert_eq!(store.search_memories("borrow", 10).unwrap().len(), 1);
    }

    let peeked = store.peek_memory("mem_1").unwrap().unwrap();
    assert_eq!(peeked.metadata.access_count, 0);
    assert_eq!(peeked.metadata.last_accessed_at, None);
    assert_eq!(peeked.metadata.updated_at, original.metadata.updated_at);
}

fn update_merges_and_reports_missing(store: &dyn EntityStore) {
    let mut original = tagged("mem_1", "old", &["a"], 10);
    original.metadata.title = Some("Title".to_string());
    store.create_memory(original.clone()).unwrap();

    let updated = store
        .update_memory(
            "mem_1",
            MemoryPatch {
                content: Some("new".to_string()),
                metadata: Some(MetadataPatch {
                    importance: Some(5),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.content, "new");
    assert_eq!(updated.metadata.title.as_deref(), Some("Title"));
    assert_eq!(updated.metadata.tags, vec!["a"]);
    assert_eq!(updated.metadata.importance, 5);
    assert_eq!(updated.metadata.created_at, original.metadata.created_at);
    assert!(updated.metadata.updated_at > original.metadata.updated_at);
    assert_eq!(store.peek_memory("mem_1").unwrap().unwrap(), updated);

    let err = store
        .update_memory("mem_missing", MemoryPatch::default())
        .unwrap_err();
    assert!(err.is_not_found());

    let err = store
        .update_memory(
            "mem_1",
            MemoryPatch {
                content: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, HubError::Validation(_)));
    assert_eq!(store.peek_memory("mem_1").unwrap().unwrap().content, "new");
}

fn delete_reports_presence(store: &dyn EntityStore) {
    store.create_memory(memory("mem_1", "a", 0)).unwrap();
    assert!(store.delete_memory("mem_1").unwrap());
    assert!(!store.delete_memory("mem_1").unwrap());
    assert!(store.peek_memory("mem_1").unwrap().is_none());

    store.create_context(context("ctx_1", "A", 0)).unwrap();
    assert!(store.delete_context("ctx_1").unwrap());
    assert!(!store.delete_context("ctx_1").unwrap());
}

fn list_filters_and_orders(store: &dyn EntityStore) {
    let mut old = tagged("mem_old", "old", &["rust"], 30);
    old.category = DataCategory::Code;
    let mut mid = tagged("mem_mid", "mid", &["python"], 20);
    mid.memory_type = MemoryType::ShortTerm;
    let new = tagged("mem_new", "new", &["rust", "cli"], 10);
    for m in [mid, new, old] {
        store.create_memory(m).unwrap();
    }

    let all = store.list_memories(&MemoryFilter::default()).unwrap();
    assert_eq!(ids(&all), vec!["mem_new", "mem_mid", "mem_old"]);

    let rust = store
        .list_memories(&MemoryFilter {
            tags: Some(vec!["rust".to_string(), "go".to_string()]),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ids(&rust), vec!["mem_new", "mem_old"]);

    let code = store
        .list_memories(&MemoryFilter {
            category: Some(DataCategory::Code),
            tags: Some(vec!["rust".to_string()]),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ids(&code), vec!["mem_old"]);

    let short = store
        .list_memories(&MemoryFilter {
            memory_type: Some(MemoryType::ShortTerm),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ids(&short), vec!["mem_mid"]);
    assert_eq!(store.count_memories().unwrap(), 3);
}

fn search_is_case_insensitive_substring(store: &dyn EntityStore) {
    store
        .create_memory(tagged("mem_tag", "Coding standards", &["TypeScript"], 30))
        .unwrap();
    store
        .create_memory(memory("mem_body", "Always use typescript for new work", 20))
        .unwrap();
    let mut titled = memory("mem_title", "body text", 10);
    titled.metadata.title = Some("Notes on TYPESCRIPT generics".to_string());
    store.create_memory(titled).unwrap();
    store.create_memory(memory("mem_other", "Rust notes", 0)).unwrap();

    let hits: BTreeSet<String> = store
        .search_memories("typescript", 100)
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    let expected: BTreeSet<String> = ["mem_tag", "mem_body", "mem_title"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(hits, expected);

    let partial = store.search_memories("script", 100).unwrap();
    assert_eq!(partial.len(), 3);

    assert_eq!(store.search_memories("typescript", 2).unwrap().len(), 2);
    assert!(store.search_memories("haskell", 100).unwrap().is_empty());
}

fn contexts_list_oldest_first(store: &dyn EntityStore) {
    store.create_context(context("ctx_new", "New", 10)).unwrap();
    let mut topic = context("ctx_old", "Old", 20);
    topic.context_type = ContextType::Topic;
    store.create_context(topic).unwrap();

    let all = store.list_contexts(&ContextFilter::default()).unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(names, vec!["ctx_old", "ctx_new"]);

    let topics = store
        .list_contexts(&ContextFilter {
            context_type: Some(ContextType::Topic),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(store.count_contexts().unwrap(), 2);
}

fn link_is_bidirectional_and_idempotent(store: &dyn EntityStore) {
    store.create_memory(memory("mem_1", "a", 0)).unwrap();
    store.create_context(context("ctx_a", "A", 20)).unwrap();
    store.create_context(context("ctx_b", "B", 10)).unwrap();

    store.link_memory_to_context("mem_1", "ctx_a").unwrap();
    store.link_memory_to_context("mem_1", "ctx_a").unwrap();
    assert_eq!(
        store.get_context("ctx_a").unwrap().unwrap().memory_ids,
        vec!["mem_1"]
    );
    assert_eq!(
        store.peek_memory("mem_1").unwrap().unwrap().context_id(),
        Some("ctx_a")
    );

    // Relinking moves the memory
    store.link_memory_to_context("mem_1", "ctx_b").unwrap();
    assert!(store.get_context("ctx_a").unwrap().unwrap().memory_ids.is_empty());
    assert_eq!(
        store.get_context("ctx_b").unwrap().unwrap().memory_ids,
        vec!["mem_1"]
    );

    let filtered = store
        .list_memories(&MemoryFilter {
            context_id: Some("ctx_b".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ids(&filtered), vec!["mem_1"]);

    assert!(store
        .link_memory_to_context("mem_missing", "ctx_a")
        .unwrap_err()
        .is_not_found());
    assert!(store
        .link_memory_to_context("mem_1", "ctx_missing")
        .unwrap_err()
        .is_not_found());
}

fn activation_is_exclusive(store: &dyn EntityStore) {
    store.create_context(context("ctx_a", "A", 20)).unwrap();
    store.create_context(context("ctx_b", "B", 10)).unwrap();

    let active = |store: &dyn EntityStore| -> Vec<String> {
        store
            .list_contexts(&ContextFilter {
                active: Some(true),
                ..Default::default()
            })
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect()
    };

    assert!(store.activate_context("ctx_a").unwrap().is_active());
    assert_eq!(active(store), vec!["ctx_a"]);

    store.activate_context("ctx_b").unwrap();
    assert_eq!(active(store), vec!["ctx_b"]);

    let err = store.activate_context("ctx_missing").unwrap_err();
    assert!(err.is_not_found());
    assert!(active(store).is_empty());
}

fn stats_aggregate_everything(store: &dyn EntityStore) {
    let mut a = tagged("mem_a", "a", &["rust", "cli"], 0);
    a.category = DataCategory::Code;
    let mut b = tagged("mem_b", "b", &["rust"], 0);
    b.memory_type = MemoryType::ShortTerm;
    let c = tagged("mem_c", "c", &["ai"], 0);
    for m in [a, b, c] {
        store.create_memory(m).unwrap();
    }
    store.create_context(context("ctx_1", "A", 0)).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_memories, 3);
    assert_eq!(stats.total_contexts, 1);
    assert_eq!(stats.by_category.get(&DataCategory::Code), Some(&1));
    assert_eq!(stats.by_category.get(&DataCategory::Custom), Some(&2));
    assert_eq!(stats.by_type.get(&MemoryType::ShortTerm), Some(&1));
    assert_eq!(stats.by_type.get(&MemoryType::LongTerm), Some(&2));

    let top: Vec<(&str, usize)> = stats
        .top_tags
        .iter()
        .map(|t| (t.tag.as_str(), t.count))
        .collect();
    assert_eq!(top, vec![("rust", 2), ("ai", 1), ("cli", 1)]);
}

fn health_check_reports_backend(store: &dyn EntityStore) {
    let status = store.health_check().unwrap();
    assert!(status.healthy);
    assert!(status.error.is_none());
    assert!(!store.backend_name().is_empty());
}

macro_rules! contract_suite {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            fn store() -> Box<dyn EntityStore> {
                Box::new($make)
            }

            #[test]
            fn create_and_read_back() {
                super::create_and_read_back(store().as_ref());
            }

            #[test]
            fn duplicate_ids_rejected() {
                super::duplicate_ids_rejected(store().as_ref());
            }

            #[test]
            fn invalid_documents_rejected() {
                super::invalid_documents_rejected(store().as_ref());
            }

            #[test]
            fn reads_count_access() {
                super::reads_count_access(store().as_ref());
            }

            #[test]
            fn list_and_search_leave_access_alone() {
                super::list_and_search_leave_access_alone(store().as_ref());
            }

            #[test]
            fn update_merges_and_reports_missing() {
                super::update_merges_and_reports_missing(store().as_ref());
            }

            #[test]
            fn delete_reports_presence() {
                super::delete_reports_presence(store().as_ref());
            }

            #[test]
            fn list_filters_and_orders() {
                super::list_filters_and_orders(store().as_ref());
            }

            #[test]
            fn search_is_case_insensitive_substring() {
                super::search_is_case_insensitive_substring(store().as_ref());
            }

            #[test]
            fn contexts_list_oldest_first() {
                super::contexts_list_oldest_first(store().as_ref());
            }

            #[test]
            fn link_is_bidirectional_and_idempotent() {
                super::link_is_bidirectional_and_idempotent(store().as_ref());
            }

            #[test]
            fn activation_is_exclusive() {
                super::activation_is_exclusive(store().as_ref());
            }

            #[test]
            fn stats_aggregate_everything() {
                super::stats_aggregate_everything(store().as_ref());
            }

            #[test]
            fn health_check_reports_backend() {
                super::health_check_reports_backend(store().as_ref());
            }
        }
    };
}

contract_suite!(in_memory, InMemoryStore::new());
contract_suite!(sqlite, SqliteStore::in_memory().unwrap());

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn sqlite_documents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        backend: BackendKind::Sqlite,
        db_path: dir.path().join("nested").join("hub.db").to_string_lossy().to_string(),
        storage_mode: StorageMode::Local,
    };

    let mut original = tagged("mem_1", "persist me", &["keep"], 60);
    original.metadata.title = Some("Persisted".to_string());
    {
        let store = SqliteStore::new(&config).unwrap();
        store.create_memory(original.clone()).unwrap();
        store.create_context(context("ctx_1", "Work", 0)).unwrap();
        store.link_memory_to_context("mem_1", "ctx_1").unwrap();
        store.activate_context("ctx_1").unwrap();
    }

    let store = SqliteStore::new(&config).unwrap();
    let reopened = store.peek_memory("mem_1").unwrap().unwrap();
    assert_eq!(reopened.content, original.content);
    assert_eq!(reopened.metadata.title, original.metadata.title);
    assert_eq!(reopened.metadata.created_at, original.metadata.created_at);
    assert_eq!(reopened.context_id(), Some("ctx_1"));

    let context = store.get_context("ctx_1").unwrap().unwrap();
    assert!(context.is_active());
    assert_eq!(context.memory_ids, vec!["mem_1"]);

    assert_eq!(store.search_memories("persist", 10).unwrap().len(), 1);
}

#[test]
fn cloud_safe_mode_opens() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig {
        backend: BackendKind::Sqlite,
        db_path: dir.path().join("cloud.db").to_string_lossy().to_string(),
        storage_mode: StorageMode::CloudSafe,
    };
    let store = SqliteStore::new(&config).unwrap();
    store.create_memory(memory("mem_1", "a", 0)).unwrap();
    assert_eq!(store.count_memories().unwrap(), 1);
}
