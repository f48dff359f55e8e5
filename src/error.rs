//! Error types for SelfHub

use std::fmt;

use thiserror::Error;

/// Result type alias for SelfHub operations
pub type Result<T> = std::result::Result<T, HubError>;

/// Which entity collection an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Memory,
    Context,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Memory => write!(f, "Memory"),
            EntityKind::Context => write!(f, "Context"),
        }
    }
}

/// Main error type for SelfHub
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Duplicate key: {kind} {id} already exists")]
    DuplicateKey { kind: EntityKind, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    pub fn memory_not_found(id: impl Into<String>) -> Self {
        HubError::NotFound {
            kind: EntityKind::Memory,
            id: id.into(),
        }
    }

    pub fn context_not_found(id: impl Into<String>) -> Self {
        HubError::NotFound {
            kind: EntityKind::Context,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        HubError::Validation(message.into())
    }

    /// True for the absence signal, as opposed to a storage failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, HubError::NotFound { .. })
    }

    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            HubError::NotFound { .. } => -32001,
            HubError::Validation(_) => -32602,
            HubError::DuplicateKey { .. } => -32006,
            _ => -32000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_kind() {
        let err = HubError::memory_not_found("mem_1234abcd");
        assert_eq!(err.to_string(), "Memory not found: mem_1234abcd");
        assert!(err.is_not_found());

        let err = HubError::context_not_found("ctx_00000000");
        assert_eq!(err.to_string(), "Context not found: ctx_00000000");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(HubError::memory_not_found("x").code(), -32001);
        assert_eq!(HubError::validation("bad").code(), -32602);
        assert_eq!(
            HubError::DuplicateKey {
                kind: EntityKind::Context,
                id: "ctx_1".to_string()
            }
            .code(),
            -32006
        );
        assert_eq!(HubError::Internal("boom".to_string()).code(), -32000);
    }
}
