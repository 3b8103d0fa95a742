//! Conversation domain entities

use crate::tool::{ToolCallRequest, ToolCallResult};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text from the operator or the model.
    Text { text: String },
    /// The outcome of one tool call, together with the request that caused it.
    ToolResult {
        request: ToolCallRequest,
        result: ToolCallResult,
    },
    /// Marker left in the history when a turn ended without a response.
    TurnFailure { reason: String },
}

/// A message in a conversation (Entity)
///
/// Messages are immutable once appended: the fields are private and only
/// [`ConversationState`](super::state::ConversationState) constructs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    ordinal: u64,
    role: Role,
    content: MessageContent,
}

impl Message {
    pub(crate) fn new(ordinal: u64, role: Role, content: MessageContent) -> Self {
        Self {
            ordinal,
            role,
            content,
        }
    }

    /// Position in the conversation, strictly increasing.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// The text of a `Text` message.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn tool_result(&self) -> Option<(&ToolCallRequest, &ToolCallResult)> {
        match &self.content {
            MessageContent::ToolResult { request, result } => Some((request, result)),
            _ => None,
        }
    }

    pub fn is_turn_failure(&self) -> bool {
        matches!(self.content, MessageContent::TurnFailure { .. })
    }

    /// Flatten the content to plain text.
    pub fn render_text(&self) -> String {
        match &self.content {
            MessageContent::Text { text } => text.clone(),
            MessageContent::ToolResult { result, .. } => result.render_for_engine(),
            MessageContent::TurnFailure { reason } => {
                format!("(The previous request could not be completed: {})", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_variants() {
        let text = Message::new(
            0,
            Role::User,
            MessageContent::Text {
                text: "hello".to_string(),
            },
        );
        assert_eq!(text.render_text(), "hello");
        assert_eq!(text.text(), Some("hello"));

        let failure = Message::new(
            1,
            Role::Assistant,
            MessageContent::TurnFailure {
                reason: "engine unavailable".to_string(),
            },
        );
        assert!(failure.is_turn_failure());
        assert!(failure.render_text().contains("engine unavailable"));
        assert!(failure.text().is_none());
    }

    #[test]
    fn test_tool_result_accessor() {
        let request = ToolCallRequest::new("search").with_arg("q", "x");
        let result = ToolCallResult::success("search", "found");
        let message = Message::new(
            2,
            Role::Tool,
            MessageContent::ToolResult {
                request: request.clone(),
                result: result.clone(),
            },
        );

        let (req, res) = message.tool_result().unwrap();
        assert_eq!(req, &request);
        assert_eq!(res, &result);
        assert_eq!(message.render_text(), "found");
    }
}
