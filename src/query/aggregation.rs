//! Statistics over the memory collection

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::{DataCategory, Memory, MemoryType};

/// Number of tags reported in [`HubStats::top_tags`]
pub const TOP_TAGS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Summary of the hub contents. Category and type maps only hold values
/// that occur at least once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub total_memories: usize,
    pub total_contexts: usize,
    pub by_category: BTreeMap<DataCategory, usize>,
    pub by_type: BTreeMap<MemoryType, usize>,
    /// Most frequent tags, count descending then name ascending
    pub top_tags: Vec<TagCount>,
}

/// Aggregate statistics in process
pub fn compute_stats(memories: &[Memory], total_contexts: usize) -> HubStats {
    let mut by_category = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    let mut tag_counts: HashMap<&str, usize> = HashMap::new();

    for memory in memories {
        *by_category.entry(memory.category).or_insert(0) += 1;
        *by_type.entry(memory.memory_type).or_insert(0) += 1;

        let mut seen: Vec<&str> = Vec::with_capacity(memory.metadata.tags.len());
        for tag in &memory.metadata.tags {
            if !seen.contains(&tag.as_str()) {
                seen.push(tag);
                *tag_counts.entry(tag).or_insert(0) += 1;
            }
        }
    }

    HubStats {
        total_memories: memories.len(),
        total_contexts,
        by_category,
        by_type,
        top_tags: top_tags(tag_counts),
    }
}

fn top_tags(counts: HashMap<&str, usize>) -> Vec<TagCount> {
    let mut tags: Vec<(&str, usize)> = counts.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    tags.truncate(TOP_TAGS);
    tags.into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect()
}
