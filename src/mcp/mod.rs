//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio exposing the memory hub as tools.

mod handler;
pub mod protocol;
pub mod tools;

pub use handler::HubHandler;
pub use protocol::{
    codes, methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer,
    ToolCallResult,
};
pub use tools::{get_tool_definitions, TOOL_DEFINITIONS};
