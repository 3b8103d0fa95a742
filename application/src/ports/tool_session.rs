//! Tool session port
//!
//! Defines the interface to a live, handshaken connection with an
//! out-of-process tool server, and the connector that establishes one.

use crate::config::LaunchSpec;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use toolbridge_domain::{ToolCallRequest, ToolCallResult, ToolRegistry};

/// Errors that can occur while establishing a session.
///
/// All of these are fatal at startup: no partial session is ever handed to
/// the orchestrator, and the connector releases whatever it acquired before
/// returning one of them.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to launch tool server: {0}")]
    LaunchFailure(String),

    #[error("Tool server handshake failed: {0}")]
    HandshakeFailure(String),

    #[error("Tool server protocol error: {0}")]
    ProtocolError(String),

    #[error("Invalid launch specification: {0}")]
    InvalidLaunchSpec(String),
}

/// A live session with a tool server
///
/// The registry is fixed for the lifetime of the session. `invoke` never
/// fails: timeouts, disconnects and unknown tools come back as failure
/// results so the turn can carry on.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Tools discovered during the handshake
    fn registry(&self) -> &ToolRegistry;

    /// Call a tool and wait for its correlated result
    ///
    /// Calls are processed one at a time in submission order.
    async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult;

    /// Whether the connection was lost; a degraded session fails every call
    /// without touching the wire.
    fn is_degraded(&self) -> bool;

    /// Release the session and the tool server process. Idempotent.
    async fn close(&self);
}

/// Establishes tool sessions
///
/// Implementations launch the server, perform the handshake and list the
/// tools. On any failure after the process was started they terminate it
/// before returning the error.
#[async_trait]
pub trait ToolServerConnector: Send + Sync {
    async fn connect(&self, spec: &LaunchSpec) -> Result<Arc<dyn ToolSession>, SessionError>;
}
