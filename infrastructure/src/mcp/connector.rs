//! [`ToolServerConnector`] backed by stdio MCP sessions.

use crate::mcp::session::McpSession;
use async_trait::async_trait;
use std::sync::Arc;
use toolbridge_application::config::LaunchSpec;
use toolbridge_application::ports::tool_session::{SessionError, ToolServerConnector, ToolSession};

#[derive(Debug, Default, Clone, Copy)]
pub struct McpConnector;

impl McpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolServerConnector for McpConnector {
    async fn connect(&self, spec: &LaunchSpec) -> Result<Arc<dyn ToolSession>, SessionError> {
        let session = McpSession::start(spec).await?;
        Ok(Arc::new(session))
    }
}
