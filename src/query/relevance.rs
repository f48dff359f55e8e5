//! Coarse relevance labels for search hits

use serde::{Deserialize, Serialize};

use crate::types::Memory;

/// Relevance bucket derived from a memory's importance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    /// importance >= 4 is high, 3 is medium, anything lower is low
    pub fn from_importance(importance: u8) -> Self {
        match importance {
            i if i >= 4 => Relevance::High,
            3 => Relevance::Medium,
            _ => Relevance::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relevance::High => "high",
            Relevance::Medium => "medium",
            Relevance::Low => "low",
        }
    }
}

/// A search result: the memory plus its bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub memory: Memory,
    pub relevance: Relevance,
}

impl From<Memory> for SearchHit {
    fn from(memory: Memory) -> Self {
        let relevance = Relevance::from_importance(memory.metadata.importance);
        Self { memory, relevance }
    }
}
