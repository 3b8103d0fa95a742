//! OpenAI chat completions adapter for the [`ReasoningEngine`] port.
//!
//! The conversation is replayed in full on every call. Tool messages are
//! expanded into the assistant `tool_calls` / `tool` pair the API expects,
//! one pair per recorded call.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use toolbridge_application::ports::reasoning_engine::{ReasoningEngine, ReasoningError};
use toolbridge_domain::{
    Message, MessageContent, ReasoningOutput, ToolCallRequest, ToolDescriptor,
};
use tracing::{debug, trace};

/// Connection and sampling settings for [`OpenAiReasoningEngine`].
#[derive(Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

// ==================== Request wire types ====================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Serialize)]
struct ChatTool {
    r#type: &'static str,
    function: ChatFunction,
}

#[derive(Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    r#type: String,
    function: ChatToolCallFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCallFunction {
    name: String,
    arguments: String,
}

// ==================== Response wire types ====================

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ==================== Conversion helpers ====================

fn call_id_for(message: &Message, request: &ToolCallRequest) -> String {
    request
        .call_id
        .clone()
        .unwrap_or_else(|| format!("call_{}", message.ordinal()))
}

fn to_wire_messages(system_prompt: Option<&str>, history: &[Message]) -> Vec<ChatMessage> {
    let mut wire = Vec::with_capacity(history.len() + 1);
    if let Some(system) = system_prompt {
        wire.push(ChatMessage::text("system", system));
    }

    for message in history {
        match message.content() {
            MessageContent::Text { text } => {
                wire.push(ChatMessage::text(message.role().as_str(), text.clone()));
            }
            MessageContent::TurnFailure { .. } => {
                wire.push(ChatMessage::text("assistant", message.render_text()));
            }
            MessageContent::ToolResult { request, result } => {
                let id = call_id_for(message, request);
                wire.push(ChatMessage {
                    role: "assistant",
                    content: None,
                    tool_calls: Some(vec![ChatToolCall {
                        id: id.clone(),
                        r#type: "function".into(),
                        function: ChatToolCallFunction {
                            name: request.tool_name.clone(),
                            arguments: request.arguments_json().to_string(),
                        },
                    }]),
                    tool_call_id: None,
                });
                wire.push(ChatMessage {
                    role: "tool",
                    content: Some(result.render_for_engine()),
                    tool_calls: None,
                    tool_call_id: Some(id),
                });
            }
        }
    }

    wire
}

fn to_wire_tools(tools: &[ToolDescriptor]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|t| ChatTool {
            r#type: "function",
            function: ChatFunction {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameter_schema.clone(),
            },
        })
        .collect()
}

fn parse_arguments(tool: &str, raw: &str) -> Result<HashMap<String, Value>, ReasoningError> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(Value::Null) => Ok(HashMap::new()),
        Ok(other) => Err(ReasoningError::MalformedOutput(format!(
            "arguments for '{}' are not an object: {}",
            tool, other
        ))),
        Err(e) => Err(ReasoningError::MalformedOutput(format!(
            "arguments for '{}' are not valid JSON: {}",
            tool, e
        ))),
    }
}

fn from_wire_response(resp: ChatResponse) -> Result<ReasoningOutput, ReasoningError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ReasoningError::MalformedOutput("empty choices array".into()))?;

    if let Some(reason) = &choice.finish_reason {
        trace!("finish_reason: {}", reason);
    }

    if !choice.message.tool_calls.is_empty() {
        let requests = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let arguments = parse_arguments(&tc.function.name, &tc.function.arguments)?;
                Ok(ToolCallRequest::new(tc.function.name)
                    .with_call_id(tc.id)
                    .with_arguments(arguments))
            })
            .collect::<Result<Vec<_>, ReasoningError>>()?;
        return Ok(ReasoningOutput::tool_calls(requests));
    }

    match choice.message.content {
        Some(text) => Ok(ReasoningOutput::final_response(text)),
        None => Err(ReasoningError::MalformedOutput(
            "response has neither content nor tool calls".into(),
        )),
    }
}

fn error_for_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> ReasoningError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ReasoningError::Auth(format!("{}: {}", status, body));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ReasoningError::RateLimited { retry_after };
    }
    let message = serde_json::from_str::<OpenAiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    ReasoningError::Api(format!("{}: {}", status, message))
}

// ==================== Engine ====================

pub struct OpenAiReasoningEngine {
    http: reqwest::Client,
    settings: OpenAiSettings,
    endpoint: String,
}

impl OpenAiReasoningEngine {
    pub fn new(settings: OpenAiSettings) -> Result<Self, ReasoningError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ReasoningError::Other(format!("Failed to build HTTP client: {}", e)))?;
        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            settings,
            endpoint,
        })
    }
}

#[async_trait]
impl ReasoningEngine for OpenAiReasoningEngine {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn reason(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ReasoningOutput, ReasoningError> {
        let start = Instant::now();

        let request = ChatRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: to_wire_messages(self.settings.system_prompt.as_deref(), history),
            tools: to_wire_tools(tools),
        };
        debug!(
            "POST {} ({} messages, {} tools)",
            self.endpoint,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReasoningError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after, &body));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            ReasoningError::MalformedOutput(format!("Failed to parse response: {}", e))
        })?;
        if let Some(usage) = &body.usage {
            debug!(
                "{} answered in {:.2}s ({} prompt / {} completion tokens)",
                self.settings.model,
                start.elapsed().as_secs_f64(),
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        from_wire_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbridge_domain::{ConversationState, ToolCallResult, ToolFailure};

    fn parse(json: &str) -> Result<ReasoningOutput, ReasoningError> {
        from_wire_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_text_response() {
        let output = parse(
            r#"{
                "choices": [{"message": {"content": "Hello world"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5}
            }"#,
        )
        .unwrap();

        assert_eq!(output, ReasoningOutput::final_response("Hello world"));
    }

    #[test]
    fn test_parse_tool_call_response() {
        let output = parse(
            r#"{
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_abc123",
                            "type": "function",
                            "function": {"name": "firecrawl_search", "arguments": "{\"query\": \"rust\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }"#,
        )
        .unwrap();

        match output {
            ReasoningOutput::ToolCalls { requests } => {
                assert_eq!(requests.len(), 1);
                assert_eq!(requests[0].tool_name, "firecrawl_search");
                assert_eq!(requests[0].call_id.as_deref(), Some("call_abc123"));
                assert_eq!(requests[0].get_string("query"), Some("rust"));
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_arguments_are_malformed() {
        let result = parse(
            r#"{"choices": [{"message": {"tool_calls": [{
                "id": "c1", "type": "function",
                "function": {"name": "fetch", "arguments": "{not json"}
            }]}}]}"#,
        );

        assert!(matches!(result, Err(ReasoningError::MalformedOutput(_))));
    }

    #[test]
    fn test_empty_choices_is_malformed() {
        let result = parse(r#"{"choices": []}"#);
        assert!(matches!(result, Err(ReasoningError::MalformedOutput(_))));
    }

    #[test]
    fn test_tool_result_expands_to_call_and_reply() {
        let mut conversation = ConversationState::default();
        conversation.append_user("find rust news");
        conversation.append_tool_result(
            ToolCallRequest::new("search")
                .with_call_id("call_1")
                .with_arg("query", "rust"),
            ToolCallResult::success("search", "3 results"),
        );
        conversation.append_tool_result(
            ToolCallRequest::new("fetch"),
            ToolCallResult::failure("fetch", ToolFailure::transport_closed()),
        );

        let wire = to_wire_messages(Some("be brief"), conversation.snapshot());

        let roles: Vec<_> = wire.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec!["system", "user", "assistant", "tool", "assistant", "tool"]
        );

        let call = &wire[2].tool_calls.as_ref().unwrap()[0];
        assert_eq!(call.id, "call_1");
        assert_eq!(call.function.name, "search");
        assert_eq!(wire[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(wire[3].content.as_deref(), Some("3 results"));

        // No engine-assigned id: derived from the message ordinal
        assert_eq!(wire[5].tool_call_id.as_deref(), Some("call_2"));
        assert!(
            wire[5]
                .content
                .as_deref()
                .unwrap()
                .starts_with("Error: [TRANSPORT_CLOSED]")
        );
    }

    #[test]
    fn test_turn_failure_replayed_as_assistant_text() {
        let mut conversation = ConversationState::default();
        conversation.append_user("hi");
        conversation.append_turn_failure("Rate limited");

        let wire = to_wire_messages(None, conversation.snapshot());

        assert_eq!(wire.len(), 2);
        assert_eq!(wire[1].role, "assistant");
        assert!(wire[1].content.as_deref().unwrap().contains("Rate limited"));
    }

    #[test]
    fn test_error_status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, None, "bad key"),
            ReasoningError::Auth(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, Some(20), ""),
            ReasoningError::RateLimited {
                retry_after: Some(20)
            }
        ));

        let api = error_for_status(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"error": {"message": "model not found"}}"#,
        );
        assert_eq!(api.to_string(), "API error: 400 Bad Request: model not found");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let engine = OpenAiReasoningEngine::new(OpenAiSettings {
            base_url: "http://localhost:8080/v1/".into(),
            api_key: "sk-test".into(),
            model: "gpt-4".into(),
            temperature: 0.0,
            max_tokens: 256,
            system_prompt: None,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap();

        assert_eq!(engine.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(engine.name(), "gpt-4");
    }
}
