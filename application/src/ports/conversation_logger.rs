//! Port for the structured conversation transcript.
//!
//! Defines the [`ConversationLogger`] trait for recording what happened in a
//! session (operator input, tool calls and their results, answers, failed
//! turns) to a machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the transcript
//! (written as JSONL by the infrastructure adapter).

use serde_json::{Value, json};
use std::time::Duration;
use toolbridge_domain::util::truncate_str;
use toolbridge_domain::{Message, ToolCallRequest, ToolCallResult, ToolDescriptor};

/// Tool payloads are clipped to this many bytes in the transcript.
const PAYLOAD_PREVIEW_BYTES: usize = 2_000;

/// A structured conversation event.
///
/// The adapter stamps each event with a UTC timestamp when it is written.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// Event type identifier (e.g. "tool_call", "assistant_response").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn session_started(engine: &str, tools: &[ToolDescriptor]) -> Self {
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        Self::new(
            "session_started",
            json!({ "engine": engine, "tools": names }),
        )
    }

    pub fn user_message(message: &Message) -> Self {
        Self::new(
            "user_message",
            json!({
                "ordinal": message.ordinal(),
                "text": message.text().unwrap_or_default(),
            }),
        )
    }

    pub fn tool_call(request: &ToolCallRequest) -> Self {
        Self::new(
            "tool_call",
            json!({
                "tool": request.tool_name,
                "call_id": request.call_id,
                "arguments": request.arguments_json(),
            }),
        )
    }

    pub fn tool_result(result: &ToolCallResult, elapsed: Duration) -> Self {
        let mut payload = json!({
            "tool": result.tool_name,
            "success": result.is_success(),
            "duration_ms": elapsed.as_millis() as u64,
        });
        if let Some(text) = result.payload() {
            payload["bytes"] = json!(text.len());
            payload["preview"] = json!(truncate_str(text, PAYLOAD_PREVIEW_BYTES));
        }
        if let Some(failure) = result.failure_detail() {
            payload["kind"] = json!(failure.kind.as_str());
            payload["message"] = json!(failure.message);
        }
        Self::new("tool_result", payload)
    }

    pub fn assistant_response(message: &Message) -> Self {
        Self::new(
            "assistant_response",
            json!({
                "ordinal": message.ordinal(),
                "text": message.text().unwrap_or_default(),
            }),
        )
    }

    pub fn turn_failed(reason: &str) -> Self {
        Self::new("turn_failed", json!({ "reason": reason }))
    }

    pub fn session_closed(reason: &str, message_count: usize) -> Self {
        Self::new(
            "session_closed",
            json!({ "reason": reason, "messages": message_count }),
        )
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and infallible so that a broken log file never
/// interrupts a turn; adapters swallow write errors.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when the transcript is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
