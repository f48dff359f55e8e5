//! Tool dispatch for the SelfHub MCP server

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::{
    codes, methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use super::tools::get_tool_definitions;
use crate::error::{HubError, Result};
use crate::service::MemoryHub;
use crate::types::*;

/// Preview length for memory listings
const LIST_PREVIEW_CHARS: usize = 100;
/// Preview length for search results
const SEARCH_PREVIEW_CHARS: usize = 150;

/// Flat `store_memory` arguments, folded into a [`CreateMemoryInput`]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreMemoryArgs {
    content: String,
    #[serde(rename = "type")]
    memory_type: Option<MemoryType>,
    category: Option<DataCategory>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    source: Option<String>,
    importance: Option<i64>,
    context_id: Option<ContextId>,
    #[serde(default)]
    encrypt: bool,
}

impl From<StoreMemoryArgs> for CreateMemoryInput {
    fn from(args: StoreMemoryArgs) -> Self {
        CreateMemoryInput {
            content: args.content,
            memory_type: args.memory_type,
            category: args.category,
            metadata: MetadataPatch {
                title: args.title,
                description: args.description,
                tags: args.tags,
                source: args.source,
                expires_at: None,
                importance: args.importance,
            },
            context_id: args.context_id,
            encrypt: args.encrypt,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkArgs {
    context_id: ContextId,
    memory_id: MemoryId,
}

fn parse_args<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| HubError::validation(format!("invalid arguments: {}", e)))
}

/// First `max` characters of `content`, with `...` appended when cut
fn preview(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// MCP request handler over a [`MemoryHub`]
pub struct HubHandler {
    hub: MemoryHub,
}

impl HubHandler {
    pub fn new(hub: MemoryHub) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &MemoryHub {
        &self.hub
    }

    /// Run one tool; failures come back in-band with `isError` set
    pub fn handle_tool_call(&self, name: &str, params: Value) -> ToolCallResult {
        let result = match name {
            "store_memory" => self.tool_store_memory(params),
            "retrieve_memory" => self.tool_retrieve_memory(params),
            "update_memory" => self.tool_update_memory(params),
            "list_memories" => self.tool_list_memories(params),
            "search_memories" => self.tool_search_memories(params),
            "delete_memory" => self.tool_delete_memory(params),
            "create_context" => self.tool_create_context(params),
            "get_context" => self.tool_get_context(params),
            "update_context" => self.tool_update_context(params),
            "delete_context" => self.tool_delete_context(params),
            "activate_context" => self.tool_activate_context(params),
            "list_contexts" => self.tool_list_contexts(params),
            "add_memory_to_context" => self.tool_add_memory_to_context(params),
            "get_stats" => self.tool_get_stats(params),
            _ => return ToolCallResult::error(format!("Unknown tool: {}", name)),
        };

        match result {
            Ok(value) => ToolCallResult::json(&value),
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }

    // ========================================================================
    // Memories
    // ========================================================================

    fn tool_store_memory(&self, params: Value) -> Result<Value> {
        let args: StoreMemoryArgs = parse_args(params)?;
        let memory = self.hub.store_memory(args.into())?;
        Ok(json!({
            "success": true,
            "message": "Memory stored successfully",
            "memory": {
                "id": memory.id,
                "type": memory.memory_type,
                "category": memory.category,
                "title": memory.metadata.title,
                "tags": memory.metadata.tags,
            }
        }))
    }

    fn tool_retrieve_memory(&self, params: Value) -> Result<Value> {
        let args: IdArgs = parse_args(params)?;
        let memory = self.hub.retrieve_memory(&args.id)?;
        Ok(serde_json::to_value(memory)?)
    }

    fn tool_update_memory(&self, params: Value) -> Result<Value> {
        let input: UpdateMemoryInput = parse_args(params)?;
        let memory = self.hub.update_memory(input)?;
        Ok(json!({
            "success": true,
            "message": "Memory updated successfully",
            "memory": memory,
        }))
    }

    fn tool_list_memories(&self, params: Value) -> Result<Value> {
        let input: ListMemoriesInput = parse_args(params)?;
        let page = self.hub.list_memories(input)?;
        let memories: Vec<Value> = page
            .items
            .iter()
            .map(|m| {
                json!({
                    "id": m.id,
                    "type": m.memory_type,
                    "category": m.category,
                    "title": m.metadata.title,
                    "content": preview(&m.content, LIST_PREVIEW_CHARS),
                    "tags": m.metadata.tags,
                    "importance": m.metadata.importance,
                    "createdAt": m.metadata.created_at,
                })
            })
            .collect();
        Ok(json!({
            "memories": memories,
            "total": page.total,
            "showing": page.len(),
        }))
    }

    fn tool_search_memories(&self, params: Value) -> Result<Value> {
        let input: SearchMemoriesInput = parse_args(params)?;
        let page = self.hub.search_memories(input)?;
        let results: Vec<Value> = page
            .items
            .iter()
            .map(|hit| {
                let m = &hit.memory;
                json!({
                    "id": m.id,
                    "title": m.metadata.title,
                    "content": preview(&m.content, SEARCH_PREVIEW_CHARS),
                    "relevance": hit.relevance,
                    "tags": m.metadata.tags,
                    "category": m.category,
                })
            })
            .collect();
        Ok(json!({"results": results, "total": page.total}))
    }

    fn tool_delete_memory(&self, params: Value) -> Result<Value> {
        let args: IdArgs = parse_args(params)?;
        let success = self.hub.delete_memory(&args.id)?;
        let message = if success {
            "Memory deleted successfully"
        } else {
            "Memory not found"
        };
        Ok(json!({"success": success, "message": message}))
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    fn tool_create_context(&self, params: Value) -> Result<Value> {
        let input: CreateContextInput = parse_args(params)?;
        let context = self.hub.create_context(input)?;
        Ok(json!({
            "success": true,
            "message": "Context created successfully",
            "context": {
                "id": context.id,
                "name": context.name,
                "type": context.context_type,
                "memoryCount": context.memory_ids.len(),
            }
        }))
    }

    fn tool_get_context(&self, params: Value) -> Result<Value> {
        let args: IdArgs = parse_args(params)?;
        let context = self.hub.get_context(&args.id)?;
        let memories = self.hub.get_context_memories(&context.id)?;
        Ok(json!({
            "context": context,
            "memories": member_previews(&memories),
        }))
    }

    fn tool_update_context(&self, params: Value) -> Result<Value> {
        let input: UpdateContextInput = parse_args(params)?;
        let context = self.hub.update_context(input)?;
        Ok(json!({
            "success": true,
            "message": "Context updated successfully",
            "context": context,
        }))
    }

    fn tool_delete_context(&self, params: Value) -> Result<Value> {
        let args: IdArgs = parse_args(params)?;
        let success = self.hub.delete_context(&args.id)?;
        let message = if success {
            "Context deleted successfully"
        } else {
            "Context not found"
        };
        Ok(json!({"success": success, "message": message}))
    }

    fn tool_activate_context(&self, params: Value) -> Result<Value> {
        let args: IdArgs = parse_args(params)?;
        let context = self.hub.activate_context(&args.id)?;
        let memories = self.hub.get_context_memories(&context.id)?;
        Ok(json!({
            "success": true,
            "message": "Context activated",
            "context": {
                "id": context.id,
                "name": context.name,
                "type": context.context_type,
                "memoryCount": memories.len(),
            },
            "memories": member_previews(&memories),
        }))
    }

    fn tool_list_contexts(&self, params: Value) -> Result<Value> {
        let filter: ContextFilter = parse_args(params)?;
        let contexts = self.hub.list_contexts(&filter)?;
        let items: Vec<Value> = contexts
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "name": c.name,
                    "type": c.context_type,
                    "description": c.description,
                    "active": c.metadata.active,
                    "memoryCount": c.memory_ids.len(),
                    "tags": c.metadata.tags,
                })
            })
            .collect();
        Ok(json!({"contexts": items, "total": contexts.len()}))
    }

    fn tool_add_memory_to_context(&self, params: Value) -> Result<Value> {
        let args: LinkArgs = parse_args(params)?;
        let context = self
            .hub
            .add_memory_to_context(&args.context_id, &args.memory_id)?;
        Ok(json!({
            "success": true,
            "message": "Memory added to context",
            "context": {
                "id": context.id,
                "name": context.name,
                "memoryCount": context.memory_ids.len(),
            }
        }))
    }

    // ========================================================================
    // Analytics
    // ========================================================================

    fn tool_get_stats(&self, _params: Value) -> Result<Value> {
        Ok(serde_json::to_value(self.hub.stats()?)?)
    }
}

fn member_previews(memories: &[Memory]) -> Vec<Value> {
    memories
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "title": m.metadata.title,
                "content": preview(&m.content, LIST_PREVIEW_CHARS),
            })
        })
        .collect()
}

impl McpHandler for HubHandler {
    fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::INITIALIZED => {
                tracing::info!("client initialized");
                McpResponse::success(request.id, json!({}))
            }
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({"tools": tools}))
            }
            methods::CALL_TOOL => {
                let name = match request.params.get("name").and_then(|v| v.as_str()) {
                    Some(name) => name,
                    None => {
                        return McpResponse::from_error(
                            request.id,
                            HubError::validation("tools/call requires a tool name"),
                        )
                    }
                };
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .filter(|v| !v.is_null())
                    .unwrap_or(json!({}));

                let tool_result = self.handle_tool_call(name, arguments);
                McpResponse::success(request.id, json!(tool_result))
            }
            _ => McpResponse::error(
                request.id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> HubHandler {
        HubHandler::new(MemoryHub::in_memory())
    }

    fn call(handler: &HubHandler, name: &str, args: Value) -> (Value, bool) {
        let result = handler.handle_tool_call(name, args);
        let body = serde_json::from_str(result.first_text().unwrap()).unwrap();
        (body, result.is_error.unwrap_or(false))
    }

    #[test]
    fn test_preview_counts_characters() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 3), "ééé...");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_store_then_retrieve() {
        let handler = handler();
        let (stored, is_error) = call(
            &handler,
            "store_memory",
            json!({
                "content": "Use dark mode",
                "category": "personal",
                "title": "UI",
                "tags": ["ui"]
            }),
        );
        assert!(!is_error);
        assert_eq!(stored["success"], true);
        assert_eq!(stored["memory"]["type"], "long-term");
        assert_eq!(stored["memory"]["tags"], json!(["ui"]));

        let id = stored["memory"]["id"].as_str().unwrap();
        let (memory, _) = call(&handler, "retrieve_memory", json!({"id": id}));
        assert_eq!(memory["content"], "Use dark mode");
        assert_eq!(memory["metadata"]["accessCount"], 1);
    }

    #[test]
    fn test_errors_are_in_band() {
        let handler = handler();
        let (body, is_error) = call(&handler, "retrieve_memory", json!({"id": "mem_nope"}));
        assert!(is_error);
        assert_eq!(body["error"], true);
        assert_eq!(body["message"], "Memory not found: mem_nope");

        let (body, is_error) = call(&handler, "bogus_tool", json!({}));
        assert!(is_error);
        assert_eq!(body["message"], "Unknown tool: bogus_tool");

        let (_, is_error) = call(&handler, "store_memory", json!({"content": "x", "importance": 9}));
        assert!(is_error);
        let (_, is_error) = call(&handler, "store_memory", json!({"content": "x", "type": "forever"}));
        assert!(is_error);
    }

    #[test]
    fn test_delete_reports_missing() {
        let handler = handler();
        let (body, is_error) = call(&handler, "delete_memory", json!({"id": "mem_nope"}));
        assert!(!is_error);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Memory not found");
    }

    #[test]
    fn test_context_flow() {
        let handler = handler();
        let (created, _) = call(
            &handler,
            "create_context",
            json!({"name": "Work", "type": "project"}),
        );
        let ctx_id = created["context"]["id"].as_str().unwrap().to_string();

        let (stored, _) = call(
            &handler,
            "store_memory",
            json!({"content": "a".repeat(120), "contextId": ctx_id}),
        );
        let mem_id = stored["memory"]["id"].as_str().unwrap().to_string();

        let (activated, is_error) = call(&handler, "activate_context", json!({"id": ctx_id}));
        assert!(!is_error);
        assert_eq!(activated["context"]["memoryCount"], 1);
        assert_eq!(activated["memories"][0]["id"], mem_id.as_str());
        assert_eq!(
            activated["memories"][0]["content"].as_str().unwrap().len(),
            103
        );

        let (listed, _) = call(&handler, "list_contexts", json!({"active": true}));
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["contexts"][0]["active"], true);
    }

    #[test]
    fn test_list_and_search_shapes() {
        let handler = handler();
        for (content, importance) in [("typescript tips", 5), ("rust notes", 2)] {
            call(
                &handler,
                "store_memory",
                json!({"content": content, "importance": importance}),
            );
        }

        let (listed, _) = call(&handler, "list_memories", json!({"limit": 1}));
        assert_eq!(listed["total"], 2);
        assert_eq!(listed["showing"], 1);

        let (found, _) = call(&handler, "search_memories", json!({"query": "typescript"}));
        assert_eq!(found["total"], 1);
        assert_eq!(found["results"][0]["relevance"], "high");
    }

    #[test]
    fn test_protocol_methods() {
        let handler = handler();
        let response = handler.handle_request(McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: methods::LIST_TOOLS.to_string(),
            params: Value::Null,
        });
        assert_eq!(response.result.unwrap()["tools"].as_array().unwrap().len(), 14);

        let response = handler.handle_request(McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(2)),
            method: "resources/list".to_string(),
            params: Value::Null,
        });
        assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_call_without_tool_name_is_protocol_error() {
        let handler = handler();
        let response = handler.handle_request(McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(3)),
            method: methods::CALL_TOOL.to_string(),
            params: json!({"arguments": {"id": "mem_1"}}),
        });
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("tool name"));
    }
}
