//! Tool domain value objects: the outcome side of a tool call
//!
//! Every [`ToolCallRequest`](super::entities::ToolCallRequest) produces
//! exactly one [`ToolCallResult`]. Failures are values, not errors: a
//! timed-out or unknown tool becomes a failure result that is appended
//! to the conversation so the reasoning engine can react to it.
//!
//! | Kind | Raised by | Session survives? |
//! |------|-----------|-------------------|
//! | `Timeout` | no response within the per-call timeout | Yes |
//! | `TransportClosed` | the tool server went away | No (degraded) |
//! | `UnknownTool` | name not in the registry snapshot | Yes |
//! | `InvalidArguments` | required argument missing | Yes |
//! | `ServerError` | JSON-RPC error object from the server | Yes |
//! | `ToolError` | the tool ran and reported failure | Yes |

use serde::{Deserialize, Serialize};

/// Classification of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailureKind {
    Timeout,
    TransportClosed,
    UnknownTool,
    InvalidArguments,
    ServerError,
    ToolError,
}

impl ToolFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolFailureKind::Timeout => "TIMEOUT",
            ToolFailureKind::TransportClosed => "TRANSPORT_CLOSED",
            ToolFailureKind::UnknownTool => "UNKNOWN_TOOL",
            ToolFailureKind::InvalidArguments => "INVALID_ARGUMENTS",
            ToolFailureKind::ServerError => "SERVER_ERROR",
            ToolFailureKind::ToolError => "TOOL_ERROR",
        }
    }
}

impl std::fmt::Display for ToolFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure detail carried by a failed [`ToolCallResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ToolFailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: ToolFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(tool_name: &str, after: std::time::Duration) -> Self {
        Self::new(
            ToolFailureKind::Timeout,
            format!("Tool '{}' did not respond within {:?}", tool_name, after),
        )
    }

    pub fn transport_closed() -> Self {
        Self::new(
            ToolFailureKind::TransportClosed,
            "Tool server connection is closed",
        )
    }

    pub fn unknown_tool(tool_name: &str) -> Self {
        Self::new(
            ToolFailureKind::UnknownTool,
            format!("Unknown tool: {}", tool_name),
        )
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::InvalidArguments, message)
    }

    pub fn server_error(code: i64, message: &str) -> Self {
        Self::new(
            ToolFailureKind::ServerError,
            format!("Server error (code {}): {}", code, message),
        )
    }

    pub fn tool_error(message: impl Into<String>) -> Self {
        Self::new(ToolFailureKind::ToolError, message)
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { payload: String },
    Failure(ToolFailure),
}

/// Result of one tool call, correlated to its request by invocation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Name of the tool that was called
    pub tool_name: String,
    /// Success payload or failure detail
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Success {
                payload: payload.into(),
            },
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, failure: ToolFailure) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Failure(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&str> {
        match &self.outcome {
            ToolOutcome::Success { payload } => Some(payload),
            ToolOutcome::Failure(_) => None,
        }
    }

    pub fn failure_detail(&self) -> Option<&ToolFailure> {
        match &self.outcome {
            ToolOutcome::Success { .. } => None,
            ToolOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn failure_kind(&self) -> Option<ToolFailureKind> {
        self.failure_detail().map(|f| f.kind)
    }

    /// Text the reasoning engine sees for this result.
    pub fn render_for_engine(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { payload } => payload.clone(),
            ToolOutcome::Failure(failure) => format!("Error: {}", failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_success_result() {
        let result = ToolCallResult::success("search", "3 hits");

        assert!(result.is_success());
        assert_eq!(result.payload(), Some("3 hits"));
        assert!(result.failure_detail().is_none());
        assert_eq!(result.render_for_engine(), "3 hits");
    }

    #[test]
    fn test_timeout_result() {
        let result = ToolCallResult::failure(
            "fetch",
            ToolFailure::timeout("fetch", Duration::from_secs(2)),
        );

        assert!(!result.is_success());
        assert_eq!(result.failure_kind(), Some(ToolFailureKind::Timeout));
        assert!(result.render_for_engine().starts_with("Error: [TIMEOUT]"));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let result = ToolCallResult::failure("x", ToolFailure::unknown_tool("x"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["status"], "failure");
        assert_eq!(json["outcome"]["kind"], "unknown_tool");
    }
}
