//! Conversation state: the append-only message log
//!
//! Incoming operator text is capped at a fixed number of characters before
//! it becomes a [`Message`]; the excess is dropped silently. Model and tool
//! output are appended as-is. Nothing already in the log is ever removed or
//! rewritten, so [`ConversationState::snapshot`] only ever grows.

use super::entities::{Message, MessageContent, Role};
use crate::tool::{ToolCallRequest, ToolCallResult};
use crate::util::truncate_chars;

/// Default cap on operator input, in characters.
pub const DEFAULT_MAX_USER_CHARS: usize = 175_000;

/// Ordered message history owned by the turn orchestrator.
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    next_ordinal: u64,
    max_user_chars: usize,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_USER_CHARS)
    }
}

impl ConversationState {
    pub fn new(max_user_chars: usize) -> Self {
        Self {
            messages: Vec::new(),
            next_ordinal: 0,
            max_user_chars,
        }
    }

    /// Set up the starting history with an optional initial user message.
    pub fn seed(&mut self, initial: Option<&str>) -> Option<&Message> {
        match initial {
            Some(text) => Some(self.append_user(text)),
            None => None,
        }
    }

    /// Append operator text, truncated to the configured cap.
    pub fn append_user(&mut self, raw_text: &str) -> &Message {
        let text = truncate_chars(raw_text, self.max_user_chars).to_string();
        self.push(Role::User, MessageContent::Text { text })
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) -> &Message {
        self.push(Role::Assistant, MessageContent::Text { text: text.into() })
    }

    pub fn append_tool_result(
        &mut self,
        request: ToolCallRequest,
        result: ToolCallResult,
    ) -> &Message {
        self.push(Role::Tool, MessageContent::ToolResult { request, result })
    }

    /// Append the marker for a turn that ended without a response.
    pub fn append_turn_failure(&mut self, reason: impl Into<String>) -> &Message {
        self.push(
            Role::Assistant,
            MessageContent::TurnFailure {
                reason: reason.into(),
            },
        )
    }

    /// The full history, oldest first.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, role: Role, content: MessageContent) -> &Message {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        self.messages.push(Message::new(ordinal, role, content));
        &self.messages[self.messages.len() - 1]
    }
}
