//! MCP tool definitions for SelfHub

use serde_json::json;

use super::protocol::ToolDefinition;

/// All tool definitions: (name, description, JSON schema)
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    // Memories
    (
        "store_memory",
        "Store a new piece of information in your memory hub",
        r#"{
            "type": "object",
            "properties": {
                "content": {"type": "string", "description": "The content to store"},
                "type": {"type": "string", "enum": ["short-term", "long-term", "contextual"], "description": "Type of memory (default: long-term)"},
                "category": {"type": "string", "enum": ["personal", "professional", "learning", "projects", "conversations", "documents", "code", "tasks", "contacts", "timeline", "custom"], "description": "Category of the memory"},
                "title": {"type": "string", "description": "Optional title for the memory"},
                "description": {"type": "string", "description": "Optional longer description"},
                "tags": {"type": "array", "items": {"type": "string"}, "description": "Tags for categorization"},
                "source": {"type": "string", "description": "Where the information came from"},
                "importance": {"type": "integer", "minimum": 1, "maximum": 5, "description": "Importance level (1-5, default 3)"},
                "contextId": {"type": "string", "description": "Optional context ID to associate with"},
                "encrypt": {"type": "boolean", "default": false, "description": "Label the memory as encrypted"}
            },
            "required": ["content"]
        }"#,
    ),
    (
        "retrieve_memory",
        "Retrieve a specific memory by ID",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Memory ID to retrieve"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "update_memory",
        "Update an existing memory. Metadata fields are merged, not replaced",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Memory ID to update"},
                "content": {"type": "string"},
                "type": {"type": "string", "enum": ["short-term", "long-term", "contextual"]},
                "category": {"type": "string", "enum": ["personal", "professional", "learning", "projects", "conversations", "documents", "code", "tasks", "contacts", "timeline", "custom"]},
                "metadata": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "description": {"type": "string"},
                        "tags": {"type": "array", "items": {"type": "string"}},
                        "source": {"type": "string"},
                        "importance": {"type": "integer", "minimum": 1, "maximum": 5}
                    }
                },
                "privacy": {
                    "type": "object",
                    "properties": {
                        "encrypted": {"type": "boolean"},
                        "accessLevel": {"type": "string", "enum": ["private", "shared", "public"]}
                    }
                }
            },
            "required": ["id"]
        }"#,
    ),
    (
        "list_memories",
        "List memories with optional filtering, sorting and pagination",
        r#"{
            "type": "object",
            "properties": {
                "type": {"type": "string", "enum": ["short-term", "long-term", "contextual"], "description": "Filter by memory type"},
                "category": {"type": "string", "description": "Filter by category"},
                "tags": {"type": "array", "items": {"type": "string"}, "description": "Filter by tags (any match)"},
                "contextId": {"type": "string", "description": "Filter by context ID"},
                "limit": {"type": "integer", "minimum": 0, "description": "Maximum number of results (default: 50)"},
                "offset": {"type": "integer", "minimum": 0, "description": "Offset for pagination (default: 0)"},
                "sortBy": {"type": "string", "enum": ["createdAt", "updatedAt", "importance", "accessCount"], "default": "createdAt"},
                "sortOrder": {"type": "string", "enum": ["asc", "desc"], "default": "desc"}
            }
        }"#,
    ),
    (
        "search_memories",
        "Search memories using a text query",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "category": {"type": "string", "description": "Filter by category"},
                "type": {"type": "string", "enum": ["short-term", "long-term", "contextual"], "description": "Filter by memory type"},
                "tags": {"type": "array", "items": {"type": "string"}, "description": "Filter by tags (any match)"},
                "limit": {"type": "integer", "minimum": 0, "description": "Maximum number of results (default: 10)"},
                "offset": {"type": "integer", "minimum": 0, "description": "Offset for pagination (default: 0)"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        "delete_memory",
        "Delete a memory by ID",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Memory ID to delete"}
            },
            "required": ["id"]
        }"#,
    ),
    // Contexts
    (
        "create_context",
        "Create a new context for organizing memories",
        r#"{
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Context name"},
                "type": {"type": "string", "enum": ["project", "conversation", "topic", "temporal"], "description": "Type of context"},
                "description": {"type": "string", "description": "Optional description"},
                "tags": {"type": "array", "items": {"type": "string"}, "description": "Tags for the context"},
                "memoryIds": {"type": "array", "items": {"type": "string"}, "description": "Memories to add to the new context"}
            },
            "required": ["name", "type"]
        }"#,
    ),
    (
        "get_context",
        "Get a context and its member memories",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Context ID"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "update_context",
        "Update a context's name, description, tags or active flag",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Context ID"},
                "name": {"type": "string"},
                "description": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "active": {"type": "boolean"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "delete_context",
        "Delete a context. Its memories are kept and unlinked",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Context ID to delete"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "activate_context",
        "Activate a context and load its memories",
        r#"{
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Context ID to activate"}
            },
            "required": ["id"]
        }"#,
    ),
    (
        "list_contexts",
        "List all contexts with optional filtering",
        r#"{
            "type": "object",
            "properties": {
                "type": {"type": "string", "enum": ["project", "conversation", "topic", "temporal"], "description": "Filter by context type"},
                "active": {"type": "boolean", "description": "Filter by active status"}
            }
        }"#,
    ),
    (
        "add_memory_to_context",
        "Link an existing memory into a context",
        r#"{
            "type": "object",
            "properties": {
                "contextId": {"type": "string", "description": "Context ID"},
                "memoryId": {"type": "string", "description": "Memory ID"}
            },
            "required": ["contextId", "memoryId"]
        }"#,
    ),
    // Analytics
    (
        "get_stats",
        "Get usage statistics about your memory hub",
        r#"{
            "type": "object",
            "properties": {}
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}
