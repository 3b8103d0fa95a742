//! Tool server configuration from TOML (`[tool_server]` section)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use toolbridge_application::config::LaunchSpec;
use tracing::warn;

/// How to launch the MCP tool server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolServerConfig {
    /// Executable to run (default: "npx").
    pub command: String,
    /// Arguments (default: ["firecrawl-mcp"]).
    pub args: Vec<String>,
    /// Extra environment variables for the server process.
    pub env: BTreeMap<String, String>,
    /// Variables copied from our environment into the server's, when set.
    pub env_passthrough: Vec<String>,
    /// Bound on launch + handshake + tool listing, in seconds.
    pub handshake_timeout_secs: u64,
    /// Bound on a single tool call, in seconds.
    pub call_timeout_secs: u64,
}

impl Default for FileToolServerConfig {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec!["firecrawl-mcp".to_string()],
            env: BTreeMap::new(),
            env_passthrough: vec!["FIRECRAWL_API_KEY".to_string()],
            handshake_timeout_secs: 30,
            call_timeout_secs: 120,
        }
    }
}

impl FileToolServerConfig {
    /// Build the launch spec, resolving passthrough variables with `lookup`.
    ///
    /// Explicit `env` entries win over passthrough values of the same name.
    pub fn to_launch_spec_with(&self, lookup: impl Fn(&str) -> Option<String>) -> LaunchSpec {
        let mut spec = LaunchSpec::new(&self.command)
            .with_args(self.args.iter().cloned())
            .with_handshake_timeout(Duration::from_secs(self.handshake_timeout_secs))
            .with_call_timeout(Duration::from_secs(self.call_timeout_secs));

        for name in &self.env_passthrough {
            match lookup(name) {
                Some(value) => spec = spec.with_env(name, value),
                None => warn!("{} is not set; the tool server may refuse to start", name),
            }
        }
        for (name, value) in &self.env {
            spec = spec.with_env(name, value);
        }
        spec
    }

    /// Build the launch spec from the process environment.
    pub fn to_launch_spec(&self) -> LaunchSpec {
        self.to_launch_spec_with(|name| std::env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_launches_firecrawl() {
        let spec = FileToolServerConfig::default().to_launch_spec_with(|name| {
            (name == "FIRECRAWL_API_KEY").then(|| "fc-123".to_string())
        });

        assert_eq!(spec.display_command(), "npx firecrawl-mcp");
        assert_eq!(spec.env.get("FIRECRAWL_API_KEY").map(String::as_str), Some("fc-123"));
        assert_eq!(spec.call_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_missing_passthrough_is_skipped() {
        let spec = FileToolServerConfig::default().to_launch_spec_with(|_| None);
        assert!(spec.env.is_empty());
    }

    #[test]
    fn test_explicit_env_overrides_passthrough() {
        let mut config = FileToolServerConfig::default();
        config
            .env
            .insert("FIRECRAWL_API_KEY".to_string(), "fc-file".to_string());

        let spec = config.to_launch_spec_with(|_| Some("fc-env".to_string()));

        assert_eq!(spec.env.get("FIRECRAWL_API_KEY").map(String::as_str), Some("fc-file"));
    }
}
