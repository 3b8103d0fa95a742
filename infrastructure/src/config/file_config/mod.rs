//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout one-to-one and convert into
//! the application's launch and chat parameters.

mod chat;
mod engine;
mod logging;
mod tool_server;

pub use chat::FileChatConfig;
pub use engine::FileEngineConfig;
pub use logging::FileLoggingConfig;
pub use tool_server::FileToolServerConfig;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A problem found in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("engine.temperature must be between 0 and 2, got {value}")]
    TemperatureOutOfRange { value: String },

    #[error("API key not found: set {env_var} or engine.api_key")]
    MissingApiKey { env_var: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Reasoning engine settings
    pub engine: FileEngineConfig,
    /// Tool server launch settings
    pub tool_server: FileToolServerConfig,
    /// Chat loop settings
    pub chat: FileChatConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// The API key is not checked here; it is resolved when the engine
    /// settings are built.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.tool_server.command.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyField {
                field: "tool_server.command",
            });
        }
        if self.tool_server.handshake_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "tool_server.handshake_timeout_secs",
            });
        }
        if self.tool_server.call_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "tool_server.call_timeout_secs",
            });
        }

        if self.engine.model.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyField {
                field: "engine.model",
            });
        }
        if self.engine.base_url.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyField {
                field: "engine.base_url",
            });
        }
        if !(0.0..=2.0).contains(&self.engine.temperature) {
            issues.push(ConfigValidationError::TemperatureOutOfRange {
                value: self.engine.temperature.to_string(),
            });
        }
        if self.engine.request_timeout_secs == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "engine.request_timeout_secs",
            });
        }

        if self.chat.max_tool_rounds == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "chat.max_tool_rounds",
            });
        }
        if self.chat.max_input_chars == 0 {
            issues.push(ConfigValidationError::ZeroValue {
                field: "chat.max_input_chars",
            });
        }

        issues
    }
}
