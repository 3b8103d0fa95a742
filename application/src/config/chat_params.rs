//! Chat parameters: turn loop control.
//!
//! [`ChatParams`] groups the static parameters that control the turn loop in
//! [`TurnOrchestrator`](crate::use_cases::turn_orchestrator::TurnOrchestrator).

use serde::{Deserialize, Serialize};
use toolbridge_domain::DEFAULT_MAX_USER_CHARS;

/// Turn loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParams {
    /// Maximum tool-call rounds within a single turn before it is abandoned.
    pub max_tool_rounds: usize,
    /// User input is silently truncated to this many characters.
    pub max_input_chars: usize,
    /// Inputs that end the session, compared case-insensitively after trimming.
    pub exit_keywords: Vec<String>,
    /// Optional first user message, seeded before the first prompt.
    pub initial_message: Option<String>,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            max_tool_rounds: 10,
            max_input_chars: DEFAULT_MAX_USER_CHARS,
            exit_keywords: vec!["exit".to_string(), "quit".to_string()],
            initial_message: None,
        }
    }
}

impl ChatParams {
    // ==================== Builder Methods ====================

    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    pub fn with_initial_message(mut self, message: impl Into<String>) -> Self {
        self.initial_message = Some(message.into());
        self
    }

    /// Whether `input` is one of the exit keywords.
    pub fn is_exit_command(&self, input: &str) -> bool {
        let trimmed = input.trim();
        self.exit_keywords
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ChatParams::default();
        assert_eq!(params.max_tool_rounds, 10);
        assert_eq!(params.max_input_chars, 175_000);
        assert!(params.initial_message.is_none());
    }

    #[test]
    fn test_builder() {
        let params = ChatParams::default()
            .with_max_tool_rounds(3)
            .with_max_input_chars(100)
            .with_initial_message("hello");

        assert_eq!(params.max_tool_rounds, 3);
        assert_eq!(params.max_input_chars, 100);
        assert_eq!(params.initial_message.as_deref(), Some("hello"));
    }

    #[test]
    fn test_exit_command_matching() {
        let params = ChatParams::default();
        assert!(params.is_exit_command("exit"));
        assert!(params.is_exit_command("QUIT"));
        assert!(params.is_exit_command("  Exit \n"));
        assert!(!params.is_exit_command("exit now"));
        assert!(!params.is_exit_command(""));
    }
}
