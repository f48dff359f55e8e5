//! Sample data for a fresh hub
//!
//! Fixed ids make seeding idempotent: entities that already exist are
//! skipped, everything else is inserted and linked.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{HubError, Result};
use crate::relations::RelationManager;
use crate::service::MemoryHub;
use crate::types::*;

/// What a seeding run inserted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub memories_created: usize,
    pub memories_skipped: usize,
    pub contexts_created: usize,
    pub contexts_skipped: usize,
}

struct SampleMemory {
    id: &'static str,
    memory_type: MemoryType,
    category: DataCategory,
    content: &'static str,
    title: &'static str,
    description: Option<&'static str>,
    tags: &'static [&'static str],
    importance: u8,
    access_count: u64,
    age_days: i64,
    expires_in_days: Option<i64>,
    related_ids: &'static [&'static str],
}

struct SampleContext {
    id: &'static str,
    name: &'static str,
    context_type: ContextType,
    description: &'static str,
    tags: &'static [&'static str],
    members: &'static [&'static str],
    age_days: i64,
}

const ID_UTILITY: &str = r#"// Rust utility to generate unique IDs
pub fn generate_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &uuid[..8])
}"#;

const SAMPLE_MEMORIES: &[SampleMemory] = &[
    SampleMemory {
        id: "mem_001",
        memory_type: MemoryType::LongTerm,
        category: DataCategory::Personal,
        content: "I prefer dark mode in all my applications for better eye comfort during long coding sessions.",
        title: "UI Preference - Dark Mode",
        description: None,
        tags: &["preferences", "ui", "coding"],
        importance: 3,
        access_count: 5,
        age_days: 7,
        expires_in_days: None,
        related_ids: &[],
    },
    SampleMemory {
        id: "mem_002",
        memory_type: MemoryType::LongTerm,
        category: DataCategory::Professional,
        content: "Always use TypeScript for new projects. It catches bugs early and improves code maintainability.",
        title: "Coding Standard - TypeScript",
        description: None,
        tags: &["coding", "typescript", "best-practices"],
        importance: 5,
        access_count: 12,
        age_days: 14,
        expires_in_days: None,
        related_ids: &[],
    },
    SampleMemory {
        id: "mem_003",
        memory_type: MemoryType::LongTerm,
        category: DataCategory::Learning,
        content: "Vector embeddings are numerical representations of text that capture semantic meaning. Used in RAG systems for semantic search.",
        title: "AI Concept - Vector Embeddings",
        description: Some("Learning about embeddings for the SelfHub project"),
        tags: &["ai", "embeddings", "learning", "mcp"],
        importance: 4,
        access_count: 8,
        age_days: 3,
        expires_in_days: None,
        related_ids: &[],
    },
    SampleMemory {
        id: "mem_004",
        memory_type: MemoryType::Contextual,
        category: DataCategory::Projects,
        content: "SelfHub uses MCP protocol to provide memory tools to AI assistants.",
        title: "SelfHub Project Overview",
        description: None,
        tags: &["selfhub", "mcp", "project", "typescript"],
        importance: 5,
        access_count: 15,
        age_days: 1,
        expires_in_days: None,
        related_ids: &["mem_002", "mem_003"],
    },
    SampleMemory {
        id: "mem_005",
        memory_type: MemoryType::ShortTerm,
        category: DataCategory::Tasks,
        content: "TODO: Implement the database layer with SQLite for persistent storage.",
        title: "Next Development Task",
        description: None,
        tags: &["todo", "database", "development"],
        importance: 4,
        access_count: 2,
        age_days: 0,
        expires_in_days: Some(7),
        related_ids: &[],
    },
    SampleMemory {
        id: "mem_006",
        memory_type: MemoryType::LongTerm,
        category: DataCategory::Code,
        content: ID_UTILITY,
        title: "ID Generation Utility",
        description: Some("Reusable function for generating unique IDs with prefixes"),
        tags: &["code", "rust", "utility"],
        importance: 3,
        access_count: 3,
        age_days: 5,
        expires_in_days: None,
        related_ids: &[],
    },
];

const SAMPLE_CONTEXTS: &[SampleContext] = &[
    SampleContext {
        id: "ctx_001",
        name: "SelfHub Development",
        context_type: ContextType::Project,
        description: "All notes and decisions related to building SelfHub MCP server",
        tags: &["selfhub", "development", "mcp"],
        members: &["mem_004", "mem_005"],
        age_days: 10,
    },
    SampleContext {
        id: "ctx_002",
        name: "AI & Machine Learning",
        context_type: ContextType::Topic,
        description: "Learning resources and notes about AI/ML concepts",
        tags: &["ai", "learning", "ml"],
        members: &["mem_003"],
        age_days: 20,
    },
];

/// The context activated on first seed
const ACTIVE_CONTEXT: &str = "ctx_001";

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn build_memory(sample: &SampleMemory, now: DateTime<Utc>) -> Memory {
    let created = now - Duration::days(sample.age_days);
    let mut memory = Memory::new(sample.id, sample.content, created);
    memory.memory_type = sample.memory_type;
    memory.category = sample.category;
    memory.metadata.title = Some(sample.title.to_string());
    memory.metadata.description = sample.description.map(str::to_string);
    memory.metadata.tags = to_strings(sample.tags);
    memory.metadata.importance = sample.importance;
    memory.metadata.access_count = sample.access_count;
    memory.metadata.expires_at = sample.expires_in_days.map(|d| now + Duration::days(d));
    memory.relations.related_ids = to_strings(sample.related_ids);
    memory
}

fn build_context(sample: &SampleContext, now: DateTime<Utc>) -> Context {
    let created = now - Duration::days(sample.age_days);
    let mut context = Context::new(sample.id, sample.name, sample.context_type, created);
    context.description = Some(sample.description.to_string());
    context.metadata.tags = to_strings(sample.tags);
    context
}

/// Insert the sample memories and contexts, skipping ids already present
pub fn seed_sample_data(hub: &MemoryHub) -> Result<SeedSummary> {
    let store = hub.store();
    let relations = RelationManager::new(store);
    let now = Utc::now();
    let mut summary = SeedSummary::default();

    for sample in SAMPLE_MEMORIES {
        match store.create_memory(build_memory(sample, now)) {
            Ok(_) => summary.memories_created += 1,
            Err(HubError::DuplicateKey { .. }) => summary.memories_skipped += 1,
            Err(e) => return Err(e),
        }
    }

    let mut fresh_contexts = Vec::new();
    for sample in SAMPLE_CONTEXTS {
        match store.create_context(build_context(sample, now)) {
            Ok(_) => {
                summary.contexts_created += 1;
                fresh_contexts.push(sample.id);
            }
            Err(HubError::DuplicateKey { .. }) => summary.contexts_skipped += 1,
            Err(e) => return Err(e),
        }
        relations.link_all(sample.id, &to_strings(sample.members))?;
    }

    if fresh_contexts.contains(&ACTIVE_CONTEXT) {
        store.activate_context(ACTIVE_CONTEXT)?;
    }

    info!(
        memories = summary.memories_created,
        contexts = summary.contexts_created,
        skipped = summary.memories_skipped + summary.contexts_skipped,
        backend = hub.backend_name(),
        "sample data seeded"
    );
    Ok(summary)
}
