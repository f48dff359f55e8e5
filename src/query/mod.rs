//! Result shaping: sorting, pagination, relevance and statistics

pub mod aggregation;
mod relevance;

use std::cmp::Ordering;

use serde::Serialize;

use crate::types::{Memory, MemoryFilter, SortField, SortOrder};

pub use aggregation::{compute_stats, HubStats, TagCount};
pub use relevance::{Relevance, SearchHit};

/// Page size for listings when the caller gives none
pub const DEFAULT_LIST_LIMIT: usize = 50;
/// Page size for searches when the caller gives none
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// How many hits a search asks the store for before filtering
pub const SEARCH_CANDIDATE_LIMIT: usize = 100;

/// One page of a larger result set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole result set before pagination
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

/// Skip `offset` items, then keep at most `limit`
pub fn paginate<T>(
    items: Vec<T>,
    offset: Option<usize>,
    limit: Option<usize>,
    default_limit: usize,
) -> Page<T> {
    let total = items.len();
    let offset = offset.unwrap_or(0);
    let limit = limit.unwrap_or(default_limit);
    let items = items.into_iter().skip(offset).take(limit).collect();
    Page {
        items,
        total,
        offset,
        limit,
    }
}

fn compare(a: &Memory, b: &Memory, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.metadata.created_at.cmp(&b.metadata.created_at),
        SortField::UpdatedAt => a.metadata.updated_at.cmp(&b.metadata.updated_at),
        SortField::Importance => a.metadata.importance.cmp(&b.metadata.importance),
        SortField::AccessCount => a.metadata.access_count.cmp(&b.metadata.access_count),
    }
}

/// Stable sort; equal keys keep the order they came in
pub fn sort_memories(memories: &mut [Memory], field: SortField, order: SortOrder) {
    memories.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Keep the memories matching every predicate of `filter`
pub fn filter_memories(memories: Vec<Memory>, filter: &MemoryFilter) -> Vec<Memory> {
    memories.into_iter().filter(|m| filter.matches(m)).collect()
}
