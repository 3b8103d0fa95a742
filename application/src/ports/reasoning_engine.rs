//! Reasoning engine port
//!
//! The language model is an opaque function from (history, tool catalog) to
//! either a final answer or a list of tool calls. Adapters live in the
//! infrastructure layer; tests substitute scripted fakes.

use async_trait::async_trait;
use thiserror::Error;
use toolbridge_domain::{Message, ReasoningOutput, ToolDescriptor};

/// Errors that can occur while asking the engine for its next step.
///
/// Every variant is turn-local: the orchestrator reports it and keeps the
/// session alive.
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited{}", .retry_after.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed engine output: {0}")]
    MalformedOutput(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// The model that decides what to say or which tools to call next
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Identifier for logs (usually the model name)
    fn name(&self) -> &str;

    /// Decide the next step for the given history and tool catalog
    async fn reason(
        &self,
        history: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ReasoningOutput, ReasoningError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display() {
        let with_hint = ReasoningError::RateLimited {
            retry_after: Some(30),
        };
        assert_eq!(with_hint.to_string(), "Rate limited (retry after 30s)");

        let without = ReasoningError::RateLimited { retry_after: None };
        assert_eq!(without.to_string(), "Rate limited");
    }
}
