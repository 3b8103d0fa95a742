//! Error types for the MCP adapter

use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to a tool server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn tool server: {0}")]
    SpawnError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl McpError {
    /// Whether the error means the connection itself is gone.
    pub fn is_transport_closed(&self) -> bool {
        matches!(self, McpError::TransportClosed)
    }
}
