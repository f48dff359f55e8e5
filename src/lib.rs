//! SelfHub - personal memory hub
//!
//! Stores memories and groups them into contexts, with lexical search,
//! statistics and an MCP server front end.

pub mod error;
pub mod mcp;
pub mod query;
pub mod relations;
pub mod seed;
pub mod service;
pub mod storage;
pub mod types;

pub use error::{HubError, Result};
pub use service::MemoryHub;
pub use storage::EntityStore;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
