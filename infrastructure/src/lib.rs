//! Infrastructure layer for toolbridge
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the MCP stdio session, the OpenAI-compatible
//! reasoning engine, configuration file loading and transcript logging.

pub mod config;
pub mod logging;
pub mod mcp;
pub mod openai;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, ConfigValidationError, FileChatConfig, FileConfig,
    FileEngineConfig, FileLoggingConfig, FileToolServerConfig,
};
pub use logging::JsonlConversationLogger;
pub use mcp::{connector::McpConnector, error::McpError, session::McpSession};
pub use openai::{OpenAiReasoningEngine, OpenAiSettings};
