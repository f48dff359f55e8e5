//! Core types for SelfHub
//!
//! The serde layout of [`Memory`] and [`Context`] is the persisted document
//! shape shared by every storage backend, so field names and enum spellings
//! here must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

/// Unique identifier for a memory (`mem_xxxxxxxx`)
pub type MemoryId = String;

/// Unique identifier for a context (`ctx_xxxxxxxx`)
pub type ContextId = String;

/// Maximum memory content length, in characters
pub const MAX_CONTENT_CHARS: usize = 50_000;
/// Maximum memory title length, in characters
pub const MAX_TITLE_CHARS: usize = 200;
/// Maximum memory description length, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 1_000;
/// Maximum length of a single tag, in characters
pub const MAX_TAG_CHARS: usize = 50;
/// Maximum context name length, in characters
pub const MAX_CONTEXT_NAME_CHARS: usize = 100;
/// Maximum context description length, in characters
pub const MAX_CONTEXT_DESCRIPTION_CHARS: usize = 500;
/// Importance bounds (inclusive)
pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 5;
pub const DEFAULT_IMPORTANCE: u8 = 3;

/// Generate a prefixed identifier such as `mem_1a2b3c4d`
pub fn generate_id(prefix: &str) -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &uuid[..8])
}

// ============================================================================
// Enumerations
// ============================================================================

/// Memory retention class
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryType {
    ShortTerm,
    #[default]
    LongTerm,
    Contextual,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::ShortTerm => "short-term",
            MemoryType::LongTerm => "long-term",
            MemoryType::Contextual => "contextual",
        }
    }

    pub fn all() -> &'static [MemoryType] {
        &[
            MemoryType::ShortTerm,
            MemoryType::LongTerm,
            MemoryType::Contextual,
        ]
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short-term" => Ok(MemoryType::ShortTerm),
            "long-term" => Ok(MemoryType::LongTerm),
            "contextual" => Ok(MemoryType::Contextual),
            _ => Err(format!("Unknown memory type: {}", s)),
        }
    }
}

/// Fixed set of memory categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    Personal,
    Professional,
    Learning,
    Projects,
    Conversations,
    Documents,
    Code,
    Tasks,
    Contacts,
    Timeline,
    #[default]
    Custom,
}

impl DataCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::Personal => "personal",
            DataCategory::Professional => "professional",
            DataCategory::Learning => "learning",
            DataCategory::Projects => "projects",
            DataCategory::Conversations => "conversations",
            DataCategory::Documents => "documents",
            DataCategory::Code => "code",
            DataCategory::Tasks => "tasks",
            DataCategory::Contacts => "contacts",
            DataCategory::Timeline => "timeline",
            DataCategory::Custom => "custom",
        }
    }

    pub fn all() -> &'static [DataCategory] {
        &[
            DataCategory::Personal,
            DataCategory::Professional,
            DataCategory::Learning,
            DataCategory::Projects,
            DataCategory::Conversations,
            DataCategory::Documents,
            DataCategory::Code,
            DataCategory::Tasks,
            DataCategory::Contacts,
            DataCategory::Timeline,
            DataCategory::Custom,
        ]
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        DataCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Privacy label stored with a memory (not enforced)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Private,
    Shared,
    Public,
}

/// Kind of grouping a context represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Project,
    Conversation,
    Topic,
    Temporal,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Project => "project",
            ContextType::Conversation => "conversation",
            ContextType::Topic => "topic",
            ContextType::Temporal => "temporal",
        }
    }
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContextType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(ContextType::Project),
            "conversation" => Ok(ContextType::Conversation),
            "topic" => Ok(ContextType::Topic),
            "temporal" => Ok(ContextType::Temporal),
            _ => Err(format!("Unknown context type: {}", s)),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Descriptive and bookkeeping fields of a memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default)]
    pub access_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

/// Links from a memory to other entities
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRelations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MemoryId>,
    #[serde(default)]
    pub related_ids: Vec<MemoryId>,
    /// Back edge of `Context::memory_ids`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<ContextId>,
}

/// Stored privacy label
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPrivacy {
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub access_level: AccessLevel,
}

/// A memory document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: MemoryId,
    #[serde(rename = "type", default)]
    pub memory_type: MemoryType,
    #[serde(default)]
    pub category: DataCategory,
    pub content: String,
    pub metadata: MemoryMetadata,
    #[serde(default)]
    pub relations: MemoryRelations,
    #[serde(default)]
    pub privacy: MemoryPrivacy,
}

impl Memory {
    /// A fresh memory with defaults for everything but id and content
    pub fn new(id: impl Into<MemoryId>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            memory_type: MemoryType::default(),
            category: DataCategory::default(),
            content: content.into(),
            metadata: MemoryMetadata {
                title: None,
                description: None,
                tags: Vec::new(),
                source: None,
                created_at: now,
                updated_at: now,
                expires_at: None,
                importance: DEFAULT_IMPORTANCE,
                access_count: 0,
                last_accessed_at: None,
            },
            relations: MemoryRelations::default(),
            privacy: MemoryPrivacy::default(),
        }
    }

    pub fn context_id(&self) -> Option<&str> {
        self.relations.context_id.as_deref()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }

    /// Record a read-by-id
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.metadata.access_count += 1;
        self.metadata.last_accessed_at = Some(now);
        self.metadata.updated_at = now;
    }

    /// Merge a partial update into this memory.
    ///
    /// Body fields are replaced when present; `metadata`, `relations` and
    /// `privacy` are each merged field by field. `updatedAt` is refreshed.
    pub fn apply_patch(&mut self, patch: MemoryPatch, now: DateTime<Utc>) -> Result<()> {
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(memory_type) = patch.memory_type {
            self.memory_type = memory_type;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }

        if let Some(metadata) = patch.metadata {
            let m = &mut self.metadata;
            if let Some(title) = metadata.title {
                m.title = Some(title);
            }
            if let Some(description) = metadata.description {
                m.description = Some(description);
            }
            if let Some(tags) = metadata.tags {
                m.tags = dedup_tags(tags);
            }
            if let Some(source) = metadata.source {
                m.source = Some(source);
            }
            if let Some(expires_at) = metadata.expires_at {
                m.expires_at = Some(expires_at);
            }
            if let Some(importance) = metadata.importance {
                m.importance = validate_importance(importance)?;
            }
        }

        if let Some(relations) = patch.relations {
            let r = &mut self.relations;
            if let Some(parent_id) = relations.parent_id {
                r.parent_id = parent_id;
            }
            if let Some(related_ids) = relations.related_ids {
                r.related_ids = related_ids;
            }
            if let Some(context_id) = relations.context_id {
                r.context_id = context_id;
            }
        }

        if let Some(privacy) = patch.privacy {
            if let Some(encrypted) = privacy.encrypted {
                self.privacy.encrypted = encrypted;
            }
            if let Some(access_level) = privacy.access_level {
                self.privacy.access_level = access_level;
            }
        }

        self.metadata.updated_at = now;
        Ok(())
    }

    /// Check every declared bound. Nothing is truncated or clamped.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(HubError::validation("memory id cannot be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(HubError::validation("content cannot be empty"));
        }
        check_len("content", &self.content, MAX_CONTENT_CHARS)?;
        if let Some(ref title) = self.metadata.title {
            check_len("title", title, MAX_TITLE_CHARS)?;
        }
        if let Some(ref description) = self.metadata.description {
            check_len("description", description, MAX_DESCRIPTION_CHARS)?;
        }
        validate_tags(&self.metadata.tags)?;
        validate_importance(i64::from(self.metadata.importance))?;
        Ok(())
    }
}

// ============================================================================
// Context
// ============================================================================

/// Bookkeeping fields of a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A named grouping of memories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub id: ContextId,
    pub name: String,
    #[serde(rename = "type")]
    pub context_type: ContextType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Forward edge of `MemoryRelations::context_id`, insertion ordered
    #[serde(default)]
    pub memory_ids: Vec<MemoryId>,
    pub metadata: ContextMetadata,
}

impl Context {
    pub fn new(
        id: impl Into<ContextId>,
        name: impl Into<String>,
        context_type: ContextType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context_type,
            description: None,
            memory_ids: Vec::new(),
            metadata: ContextMetadata {
                created_at: now,
                updated_at: now,
                active: false,
                tags: Vec::new(),
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.metadata.active
    }

    pub fn contains(&self, memory_id: &str) -> bool {
        self.memory_ids.iter().any(|id| id == memory_id)
    }

    /// Append a member id unless already present. Returns whether it was added.
    pub fn add_member(&mut self, memory_id: &str) -> bool {
        if self.contains(memory_id) {
            return false;
        }
        self.memory_ids.push(memory_id.to_string());
        true
    }

    /// Remove a member id. Returns whether it was present.
    pub fn remove_member(&mut self, memory_id: &str) -> bool {
        let before = self.memory_ids.len();
        self.memory_ids.retain(|id| id != memory_id);
        self.memory_ids.len() != before
    }

    pub fn apply_patch(&mut self, patch: ContextPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(memory_ids) = patch.memory_ids {
            self.memory_ids = Vec::new();
            for id in memory_ids {
                self.add_member(&id);
            }
        }
        if let Some(metadata) = patch.metadata {
            if let Some(tags) = metadata.tags {
                self.metadata.tags = dedup_tags(tags);
            }
            if let Some(active) = metadata.active {
                self.metadata.active = active;
            }
        }
        self.metadata.updated_at = now;
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(HubError::validation("context id cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(HubError::validation("context name cannot be empty"));
        }
        check_len("name", &self.name, MAX_CONTEXT_NAME_CHARS)?;
        if let Some(ref description) = self.description {
            check_len("description", description, MAX_CONTEXT_DESCRIPTION_CHARS)?;
        }
        validate_tags(&self.metadata.tags)
    }
}

// ============================================================================
// Partial updates
// ============================================================================

/// Partial memory metadata. Also the metadata shape accepted on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Kept wide so out-of-range input is rejected rather than wrapped
    pub importance: Option<i64>,
}

/// Partial relations; the inner `Option` of `parent_id`/`context_id` allows clearing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationsPatch {
    pub parent_id: Option<Option<MemoryId>>,
    pub related_ids: Option<Vec<MemoryId>>,
    pub context_id: Option<Option<ContextId>>,
}

/// Partial privacy label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPatch {
    pub encrypted: Option<bool>,
    pub access_level: Option<AccessLevel>,
}

/// Store-level partial update of a memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPatch {
    pub content: Option<String>,
    pub memory_type: Option<MemoryType>,
    pub category: Option<DataCategory>,
    pub metadata: Option<MetadataPatch>,
    pub relations: Option<RelationsPatch>,
    pub privacy: Option<PrivacyPatch>,
}

impl MemoryPatch {
    /// Patch that only rewrites the owning context
    pub fn context(context_id: Option<ContextId>) -> Self {
        Self {
            relations: Some(RelationsPatch {
                context_id: Some(context_id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMetadataPatch {
    pub tags: Option<Vec<String>>,
    pub active: Option<bool>,
}

/// Store-level partial update of a context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub memory_ids: Option<Vec<MemoryId>>,
    pub metadata: Option<ContextMetadataPatch>,
}

impl ContextPatch {
    pub fn active(active: bool) -> Self {
        Self {
            metadata: Some(ContextMetadataPatch {
                active: Some(active),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn members(memory_ids: Vec<MemoryId>) -> Self {
        Self {
            memory_ids: Some(memory_ids),
            ..Default::default()
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Conjunction of optional memory predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryFilter {
    #[serde(rename = "type")]
    pub memory_type: Option<MemoryType>,
    pub category: Option<DataCategory>,
    /// Matches when the memory carries ANY of these tags
    pub tags: Option<Vec<String>>,
    pub context_id: Option<ContextId>,
}

impl MemoryFilter {
    pub fn matches(&self, memory: &Memory) -> bool {
        if let Some(memory_type) = self.memory_type {
            if memory.memory_type != memory_type {
                return false;
            }
        }
        if let Some(category) = self.category {
            if memory.category != category {
                return false;
            }
        }
        if let Some(ref tags) = self.tags {
            if !tags.is_empty() && !tags.iter().any(|tag| memory.has_tag(tag)) {
                return false;
            }
        }
        if let Some(ref context_id) = self.context_id {
            if memory.context_id() != Some(context_id.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Optional context predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextFilter {
    #[serde(rename = "type")]
    pub context_type: Option<ContextType>,
    pub active: Option<bool>,
}

impl ContextFilter {
    pub fn matches(&self, context: &Context) -> bool {
        if let Some(context_type) = self.context_type {
            if context.context_type != context_type {
                return false;
            }
        }
        if let Some(active) = self.active {
            if context.metadata.active != active {
                return false;
            }
        }
        true
    }
}

/// Fields to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Importance,
    AccessCount,
}

/// Sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

// ============================================================================
// Service inputs
// ============================================================================

/// Input for storing a new memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoryInput {
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: Option<MemoryType>,
    pub category: Option<DataCategory>,
    #[serde(default)]
    pub metadata: MetadataPatch,
    /// Context to link the new memory into
    pub context_id: Option<ContextId>,
    #[serde(default)]
    pub encrypt: bool,
}

/// Input for updating a memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoryInput {
    pub id: MemoryId,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub memory_type: Option<MemoryType>,
    pub category: Option<DataCategory>,
    pub metadata: Option<MetadataPatch>,
    pub privacy: Option<PrivacyPatch>,
}

/// Input for listing memories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMemoriesInput {
    #[serde(rename = "type")]
    pub memory_type: Option<MemoryType>,
    pub category: Option<DataCategory>,
    pub tags: Option<Vec<String>>,
    pub context_id: Option<ContextId>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl ListMemoriesInput {
    pub fn filter(&self) -> MemoryFilter {
        MemoryFilter {
            memory_type: self.memory_type,
            category: self.category,
            tags: self.tags.clone(),
            context_id: self.context_id.clone(),
        }
    }
}

/// Input for searching memories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMemoriesInput {
    pub query: String,
    pub category: Option<DataCategory>,
    #[serde(rename = "type")]
    pub memory_type: Option<MemoryType>,
    pub tags: Option<Vec<String>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SearchMemoriesInput {
    pub fn filter(&self) -> MemoryFilter {
        MemoryFilter {
            memory_type: self.memory_type,
            category: self.category,
            tags: self.tags.clone(),
            context_id: None,
        }
    }
}

/// Input for creating a context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContextInput {
    pub name: String,
    #[serde(rename = "type")]
    pub context_type: ContextType,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub memory_ids: Option<Vec<MemoryId>>,
}

/// Input for updating a context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContextInput {
    pub id: ContextId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub active: Option<bool>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Which `EntityStore` implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    #[default]
    Sqlite,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            "sqlite" | "document" => Ok(BackendKind::Sqlite),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// Storage mode for SQLite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    #[default]
    Local,
    CloudSafe,
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "cloud-safe" => Ok(StorageMode::CloudSafe),
            _ => Err(format!("Unknown storage mode: {}", s)),
        }
    }
}

/// Configuration for the storage engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Path to SQLite database (`:memory:` for a private in-process database)
    pub db_path: String,
    #[serde(default)]
    pub storage_mode: StorageMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            db_path: ":memory:".to_string(),
            storage_mode: StorageMode::Local,
        }
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(HubError::validation(format!(
            "{} exceeds {} characters (got {})",
            field, max, len
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<()> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(HubError::validation("tags cannot be empty"));
        }
        check_len("tag", tag, MAX_TAG_CHARS)?;
    }
    Ok(())
}

/// Accept an importance in [1, 5]; anything else is an error, never clamped
pub fn validate_importance(value: i64) -> Result<u8> {
    if value < i64::from(MIN_IMPORTANCE) || value > i64::from(MAX_IMPORTANCE) {
        return Err(HubError::validation(format!(
            "importance must be between {} and {} (got {})",
            MIN_IMPORTANCE, MAX_IMPORTANCE, value
        )));
    }
    Ok(value as u8)
}

/// Drop repeated tags, keeping first-seen order
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
