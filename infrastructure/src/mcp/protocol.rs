//! JSON-RPC and MCP message types.
//!
//! Messages travel as newline-delimited JSON over the server's stdin and
//! stdout.
//!
//! # Protocol Overview
//!
//! - **Requests**: client → server (`initialize`, `tools/list`, `tools/call`)
//!   and occasionally server → client (`ping`)
//! - **Responses**: correlated to requests by `id`
//! - **Notifications**: no `id` (`notifications/initialized`, server log messages)

use crate::mcp::error::McpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision sent in `initialize`.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Protocol revisions this client understands.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// JSON-RPC "method not found" error code.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Ids are allocated by the session; see `RpcClient`.
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC notification (no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    /// Turn the response into its result, or the error it carries.
    pub fn into_result(self) -> Result<Value, McpError> {
        if let Some(error) = self.error {
            return Err(McpError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outgoing JSON-RPC response (client → server), used to answer server requests.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponseOut {
    pub jsonrpc: &'static str,
    /// Echoed verbatim; servers may use string ids.
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponseOut {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", method),
                data: None,
            }),
        }
    }
}

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq)]
pub enum MessageKind {
    /// A response to one of our requests (has `id`, no `method`).
    Response,
    /// A request from the server (has `id` + `method`), e.g. `ping`.
    IncomingRequest { id: Value, method: String },
    /// A notification (has `method`, no `id`).
    Notification,
    /// Valid JSON that is not a JSON-RPC message.
    Unknown,
}

/// Classify a JSON-RPC message by inspecting its `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let id = json.get("id").filter(|v| !v.is_null());
    let method = json.get("method").and_then(|v| v.as_str());

    match (id, method) {
        (Some(id), Some(method)) => MessageKind::IncomingRequest {
            id: id.clone(),
            method: method.to_string(),
        },
        (Some(_), None) => MessageKind::Response,
        (None, Some(_)) => MessageKind::Notification,
        (None, None) => MessageKind::Unknown,
    }
}

// ==================== MCP payloads ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// `initialize` request parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: Implementation,
}

impl InitializeParams {
    pub fn new(client_name: &str, client_version: &str) -> Self {
        Self {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: Implementation {
                name: client_name.to_string(),
                version: client_version.to_string(),
            },
        }
    }
}

/// `initialize` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub server_info: Option<Implementation>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl InitializeResult {
    pub fn is_supported_version(&self) -> bool {
        SUPPORTED_PROTOCOL_VERSIONS.contains(&self.protocol_version.as_str())
    }
}

/// Tool as advertised by `tools/list`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
}

/// `tools/list` result (one page)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<McpTool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// `tools/call` request parameters
#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Value,
}

/// One block of `tools/call` output
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

/// `tools/call` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Flatten the content blocks into the text handed to the engine.
    ///
    /// Text blocks are joined with newlines. Other blocks (images, resource
    /// links) are described by type so the engine knows they exist.
    pub fn render_text(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.content.len());
        for block in &self.content {
            match (&block.kind[..], &block.text) {
                ("text", Some(text)) => parts.push(text.clone()),
                ("resource", _) => {
                    let resource = block.rest.get("resource");
                    let text = resource.and_then(|r| r.get("text")).and_then(|t| t.as_str());
                    let uri = resource
                        .and_then(|r| r.get("uri"))
                        .and_then(|u| u.as_str())
                        .unwrap_or("unknown");
                    match text {
                        Some(text) => parts.push(text.to_string()),
                        None => parts.push(format!("[resource: {}]", uri)),
                    }
                }
                (kind, _) => {
                    let mime = block
                        .rest
                        .get("mimeType")
                        .and_then(|m| m.as_str())
                        .unwrap_or("unknown");
                    parts.push(format!("[{} content: {}]", kind, mime));
                }
            }
        }

        if parts.is_empty()
            && let Some(structured) = &self.structured_content
        {
            return structured.to_string();
        }
        parts.join("\n")
    }
}
