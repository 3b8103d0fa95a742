//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptor of a tool exposed by the tool server.
///
/// Discovered once during session initialization and never modified
/// afterwards. The [`ToolRegistry`](super::registry::ToolRegistry) owns
/// every descriptor; everything else borrows them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name of the tool within a session (e.g., "firecrawl_search")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema describing the accepted arguments
    pub parameter_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameter_schema = schema;
        self
    }

    /// Names listed in the schema's `required` array.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameter_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Names declared under the schema's `properties` object.
    pub fn declared_parameters(&self) -> Vec<&str> {
        self.parameter_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| props.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default()
    }

    /// Whether the schema forbids arguments outside `properties`.
    pub fn rejects_unknown_parameters(&self) -> bool {
        self.parameter_schema
            .get("additionalProperties")
            .and_then(|v| v.as_bool())
            == Some(false)
    }
}

/// A request from the reasoning engine to call a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Engine-assigned identifier, used to pair the result with the request
    /// when the engine's wire format needs it (e.g. "call_abc123").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments keyed by parameter name
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            call_id: None,
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: HashMap<String, serde_json::Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Arguments as a JSON object, suitable for putting on the wire.
    pub fn arguments_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.arguments
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_schema_helpers() {
        let descriptor = ToolDescriptor::new("search", "Search the web").with_schema(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "limit": {"type": "integer"}
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        );

        assert_eq!(descriptor.required_parameters(), vec!["query"]);
        let mut declared = descriptor.declared_parameters();
        declared.sort();
        assert_eq!(declared, vec!["limit", "query"]);
        assert!(descriptor.rejects_unknown_parameters());
    }

    #[test]
    fn test_descriptor_default_schema_is_permissive() {
        let descriptor = ToolDescriptor::new("fetch", "Fetch a page");
        assert!(descriptor.required_parameters().is_empty());
        assert!(!descriptor.rejects_unknown_parameters());
    }

    #[test]
    fn test_request_builder() {
        let request = ToolCallRequest::new("search")
            .with_call_id("call_1")
            .with_arg("q", "rust");

        assert_eq!(request.call_id.as_deref(), Some("call_1"));
        assert_eq!(request.get_string("q"), Some("rust"));
        assert_eq!(request.arguments_json()["q"], "rust");
    }
}
