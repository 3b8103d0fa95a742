//! Reasoning engine configuration from TOML (`[engine]` section)

use super::ConfigValidationError;
use crate::openai::OpenAiSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Model name (default: "gpt-4").
    pub model: String,
    /// Sampling temperature (default: 0.0).
    pub temperature: f64,
    /// Max tokens per response.
    pub max_tokens: u32,
    /// Base URL of the API (can point at any OpenAI-compatible server).
    pub base_url: String,
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Optional system prompt sent ahead of the conversation.
    pub system_prompt: Option<String>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.0,
            max_tokens: 4096,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            system_prompt: None,
            request_timeout_secs: 120,
        }
    }
}

impl FileEngineConfig {
    /// Build engine settings, taking the API key from the config or from
    /// the environment via `lookup`.
    pub fn to_settings_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<OpenAiSettings, ConfigValidationError> {
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| lookup(&self.api_key_env).filter(|k| !k.is_empty()))
            .ok_or_else(|| ConfigValidationError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })?;

        Ok(OpenAiSettings {
            base_url: self.base_url.clone(),
            api_key,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    /// Build engine settings from the process environment.
    pub fn to_settings(&self) -> Result<OpenAiSettings, ConfigValidationError> {
        self.to_settings_with(|name| std::env::var(name).ok())
    }
}
