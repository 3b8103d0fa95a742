//! Chat loop configuration from TOML (`[chat]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use toolbridge_application::config::ChatParams;
use toolbridge_domain::DEFAULT_MAX_USER_CHARS;

/// Raw chat configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Tool-call rounds allowed per turn
    pub max_tool_rounds: usize,
    /// Operator input cap, in characters
    pub max_input_chars: usize,
    /// First user message seeded into the conversation.
    ///
    /// Unset by default: a fixed opening question would be sent ahead of the
    /// operator's first line (and ahead of `--prompt`), so seeding is opt-in.
    pub initial_message: Option<String>,
    /// Show progress indicators
    pub show_progress: bool,
    /// Path to history file
    pub history_file: Option<PathBuf>,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 10,
            max_input_chars: DEFAULT_MAX_USER_CHARS,
            initial_message: None,
            show_progress: true,
            history_file: None,
        }
    }
}

impl FileChatConfig {
    pub fn to_chat_params(&self) -> ChatParams {
        let params = ChatParams::default()
            .with_max_tool_rounds(self.max_tool_rounds)
            .with_max_input_chars(self.max_input_chars);
        match self.initial_message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => params.with_initial_message(message),
            _ => params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_does_not_seed() {
        let params = FileChatConfig::default().to_chat_params();

        assert!(params.initial_message.is_none());
        assert_eq!(params.max_tool_rounds, 10);
        assert_eq!(params.max_input_chars, 175_000);
    }

    #[test]
    fn test_configured_seed_is_trimmed() {
        let config: FileChatConfig = toml::from_str(
            r#"initial_message = "  Can you help me find information about the latest advancements in AI?  ""#,
        )
        .unwrap();

        let params = config.to_chat_params();

        assert_eq!(
            params.initial_message.as_deref(),
            Some("Can you help me find information about the latest advancements in AI?")
        );
    }

    #[test]
    fn test_blank_seed_is_ignored() {
        let config = FileChatConfig {
            initial_message: Some("   ".to_string()),
            ..Default::default()
        };

        assert!(config.to_chat_params().initial_message.is_none());
    }
}
