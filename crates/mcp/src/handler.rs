//! MCP request handling.
//!
//! Implements the subset of the Model Context Protocol a tool server needs:
//! `initialize`, `notifications/initialized`, `ping`, `tools/list` and
//! `tools/call`. Messages are JSON-RPC 2.0 objects, one per line.

use onboardctx_core::error::ToolError;
use onboardctx_core::tool::{ToolCall, ToolRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// MCP request (JSON-RPC 2.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn jsonrpc_version() -> String {
    "2.0".to_string()
}

/// MCP response (JSON-RPC 2.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    /// `null` when the request id could not be determined.
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Dispatches MCP requests to the tool registry.
pub struct McpHandler {
    registry: ToolRegistry,
    server_name: String,
}

impl McpHandler {
    pub fn new(registry: ToolRegistry, server_name: impl Into<String>) -> Self {
        Self {
            registry,
            server_name: server_name.into(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw line. Returns the serialized response, if any.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => {
                warn!(error = %e, "Unparseable MCP message");
                Some(McpResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")))
            }
            Ok(value) => {
                let id = value.get("id").cloned();
                match serde_json::from_value::<McpRequest>(value) {
                    Ok(request) => self.handle(request).await,
                    Err(e) => Some(McpResponse::error(
                        id,
                        INVALID_REQUEST,
                        format!("Invalid request: {e}"),
                    )),
                }
            }
        }?;

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize MCP response");
                None
            }
        }
    }

    /// Handle a parsed request. Notifications get no response.
    pub async fn handle(&self, request: McpRequest) -> Option<McpResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "MCP notification");
            return None;
        };
        debug!(method = %request.method, "MCP request");
        let id = Some(id);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, &request.params),
            "ping" => McpResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            other => McpResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: &Value) -> McpResponse {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);

        McpResponse::success(
            id,
            json!({
                "protocolVersion": protocol_version,
                "capabilities": {
                    "tools": { "listChanged": false }
                },
                "serverInfo": {
                    "name": self.server_name,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_list_tools(&self, id: Option<Value>) -> McpResponse {
        McpResponse::success(id, json!({ "tools": self.registry.definitions() }))
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Value) -> McpResponse {
        let mut call: ToolCall = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return McpResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"));
            }
        };
        if call.arguments.is_null() {
            call.arguments = json!({});
        }
        debug!(tool = %call.name, "MCP tool call");

        match self.registry.execute(&call).await {
            Ok(result) => {
                let mut body = json!({
                    "content": [{ "type": "text", "text": result.output }],
                    "isError": !result.success,
                });
                if let Some(data) = result.data {
                    body["structuredContent"] = data;
                }
                McpResponse::success(id, body)
            }
            Err(ToolError::NotFound(name)) => {
                McpResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {name}"))
            }
            Err(ToolError::InvalidArguments(msg)) => McpResponse::error(id, INVALID_PARAMS, msg),
            Err(e) => McpResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools;
    use onboardctx_context::{ContextService, TokenBudgetAssembler};
    use onboardctx_core::document::{Document, DocumentSet};
    use onboardctx_core::store::StaticStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn handler() -> McpHandler {
        let store = StaticStore::new().insert(
            DocumentSet::new(
                "Alien",
                vec![Document::new("on_boarding", "Overview", "alpha beta gamma delta")],
            )
            .unwrap(),
        );
        let service = ContextService::new(
            Arc::new(store),
            TokenBudgetAssembler::default(),
            Duration::from_secs(5),
        );
        McpHandler::new(tools::registry(service, 10_000), "onboardctx")
    }

    async fn roundtrip(handler: &McpHandler, message: Value) -> Value {
        let line = handler.handle_line(&message.to_string()).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn initialize_reports_tools_capability() {
        let resp = roundtrip(
            &handler(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2025-03-26"}}),
        )
        .await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(resp["result"]["serverInfo"]["name"], "onboardctx");
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let h = handler();
        let out = h
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn ping_answers_empty_result() {
        let resp = roundtrip(&handler(), json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(resp["id"], "p");
        assert_eq!(resp["result"], json!({}));
    }

    #[tokio::test]
    async fn tools_list_has_exactly_two_tools() {
        let resp = roundtrip(&handler(), json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = resp["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec![tools::WITH_CODE, tools::WITHOUT_CODE]);
        assert!(tools[0]["inputSchema"]["properties"]["token_budget"].is_object());
    }

    #[tokio::test]
    async fn tools_call_returns_text_and_structured_content() {
        let resp = roundtrip(
            &handler(),
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": tools::WITHOUT_CODE, "arguments": {"repo_name": "Alien", "token_budget": 3}}
            }),
        )
        .await;
        let result = &resp["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], "alpha beta gamma");
        assert_eq!(result["structuredContent"]["truncated"], true);
        assert_eq!(result["structuredContent"]["total_tokens"], 3);
    }

    #[tokio::test]
    async fn domain_failure_is_flagged_not_truncated() {
        let resp = roundtrip(
            &handler(),
            json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": {"name": tools::WITH_CODE, "arguments": {"repo_name": "Predator"}}
            }),
        )
        .await;
        let result = &resp["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["error"]["kind"], "not_found");
        assert!(resp.get("error").is_none());
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let resp = roundtrip(
            &handler(),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .await;
        assert_eq!(resp["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let resp = roundtrip(&handler(), json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).await;
        assert_eq!(resp["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(resp["id"], 6);
    }

    #[tokio::test]
    async fn malformed_json_is_parse_error_with_null_id() {
        let line = handler().handle_line("{not json").await.unwrap();
        let resp: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(resp["error"]["code"], PARSE_ERROR);
        assert!(resp["id"].is_null());
    }

    #[tokio::test]
    async fn request_without_method_is_invalid() {
        let resp = roundtrip(&handler(), json!({"jsonrpc": "2.0", "id": 7})).await;
        assert_eq!(resp["error"]["code"], INVALID_REQUEST);
        assert_eq!(resp["id"], 7);
    }
}
