//! MCP session over a stdio transport.
//!
//! [`McpSession`] implements the [`ToolSession`] port. A background reader
//! task owns the server's stdout and correlates responses to pending
//! requests through `oneshot` channels; writes go through the transport.
//!
//! Requests are strictly one at a time (`call_lock`), matching the
//! half-duplex discipline of the orchestrator. Ids come from a per-session
//! counter and a response that arrives after its request timed out is
//! discarded.

use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, JsonRpcResponseOut, ListToolsResult, MessageKind, McpTool,
    classify_message,
};
use crate::mcp::transport::StdioTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use toolbridge_application::config::LaunchSpec;
use toolbridge_application::ports::tool_session::{SessionError, ToolSession};
use toolbridge_domain::{
    ArgumentValidator, DefaultArgumentValidator, ToolCallRequest, ToolCallResult, ToolDescriptor,
    ToolFailure, ToolFailureKind, ToolRegistry,
};
use tracing::{debug, info, trace, warn};

const CLIENT_NAME: &str = "toolbridge";

/// Time the server gets to exit after its stdin is closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Upper bound on `tools/list` pages, against servers that loop cursors.
const MAX_LIST_PAGES: usize = 64;

/// A response routed to its waiter, or why it could not be read.
type Routed = Result<JsonRpcResponse>;

/// Requests waiting for a response, and whether any more can be accepted.
///
/// The reader task flips `closed` and drains `waiters` under the same lock,
/// so a request either registers before EOF (and is woken by the drain) or
/// sees `closed` and fails fast.
#[derive(Default)]
struct PendingRequests {
    closed: bool,
    waiters: HashMap<u64, oneshot::Sender<Routed>>,
}

struct SharedState {
    pending: StdMutex<PendingRequests>,
}

impl SharedState {
    fn lock(&self) -> std::sync::MutexGuard<'_, PendingRequests> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn register(&self, id: u64, tx: oneshot::Sender<Routed>) -> Result<()> {
        let mut pending = self.lock();
        if pending.closed {
            return Err(McpError::TransportClosed);
        }
        pending.waiters.insert(id, tx);
        Ok(())
    }

    fn forget(&self, id: u64) {
        self.lock().waiters.remove(&id);
    }

    fn take(&self, id: u64) -> Option<oneshot::Sender<Routed>> {
        self.lock().waiters.remove(&id)
    }

    fn mark_closed(&self) {
        let mut pending = self.lock();
        pending.closed = true;
        // Dropping the senders wakes every waiter with RecvError
        pending.waiters.clear();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// JSON-RPC plumbing: id allocation, correlation, timeouts.
struct RpcClient {
    transport: Arc<StdioTransport>,
    shared: Arc<SharedState>,
    next_id: AtomicU64,
    reader_handle: JoinHandle<()>,
}

impl RpcClient {
    fn start(transport: StdioTransport, stdout: ChildStdout) -> Self {
        let transport = Arc::new(transport);
        let shared = Arc::new(SharedState {
            pending: StdMutex::new(PendingRequests::default()),
        });

        let shared_bg = Arc::clone(&shared);
        let transport_bg = Arc::clone(&transport);
        let reader_handle = tokio::spawn(async move {
            reader_loop(stdout, shared_bg, transport_bg).await;
        });

        Self {
            transport,
            shared,
            next_id: AtomicU64::new(1),
            reader_handle,
        }
    }

    /// Send a request and wait up to `timeout` for its response.
    async fn request(&self, method: &str, params: Value, timeout: Duration) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.shared.register(id, tx)?;

        let request = JsonRpcRequest::new(id, method, Some(params));
        if let Err(e) = self.transport.send(&request).await {
            self.shared.forget(id);
            if e.is_transport_closed() {
                self.shared.mark_closed();
            }
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(routed)) => routed?.into_result(),
            Ok(Err(_)) => Err(McpError::TransportClosed),
            Err(_) => {
                self.shared.forget(id);
                Err(McpError::Timeout(format!(
                    "{} (id={}) got no response within {:.1}s",
                    method,
                    id,
                    timeout.as_secs_f64()
                )))
            }
        }
    }

    async fn notify(&self, method: &str) -> Result<()> {
        self.transport
            .send(&JsonRpcNotification::new(method, None))
            .await
    }

    fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    async fn shutdown(&self) {
        self.shared.mark_closed();
        self.transport.close(SHUTDOWN_GRACE).await;
        self.reader_handle.abort();
    }
}

/// Background reader loop: single owner of the server's stdout.
///
/// Runs until EOF or a read error, then marks the session closed so pending
/// and future requests fail with `TransportClosed`.
async fn reader_loop(
    stdout: ChildStdout,
    shared: Arc<SharedState>,
    transport: Arc<StdioTransport>,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Tool server closed its output");
                break;
            }
            Err(e) => {
                warn!("Reader loop: read error: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        trace!("Transport received: {}", trimmed);

        let json_value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                warn!("Reader loop: ignoring non-JSON line from server: {}", e);
                continue;
            }
        };

        match classify_message(&json_value) {
            MessageKind::Response => {
                let Some(id) = json_value.get("id").and_then(|v| v.as_u64()) else {
                    debug!("Reader loop: response with foreign id, dropping");
                    continue;
                };
                // A broken envelope still answers its request
                let response =
                    serde_json::from_value::<JsonRpcResponse>(json_value).map_err(|e| {
                        warn!("Reader loop: failed to parse response id={}: {}", id, e);
                        McpError::UnexpectedResponse(format!(
                            "malformed response (id={}): {}",
                            id, e
                        ))
                    });
                match shared.take(id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!("Reader loop: discarding late response id={}", id),
                }
            }

            MessageKind::IncomingRequest { id, method } => {
                let reply = if method == "ping" {
                    JsonRpcResponseOut::result(id, serde_json::json!({}))
                } else {
                    debug!("Reader loop: rejecting server request method={}", method);
                    JsonRpcResponseOut::method_not_found(id, &method)
                };
                if let Err(e) = transport.send(&reply).await {
                    debug!("Reader loop: failed to answer server request: {}", e);
                }
            }

            MessageKind::Notification => {
                let method = json_value
                    .get("method")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default();
                match method {
                    "notifications/message" => {
                        let params = json_value.get("params");
                        let level = params
                            .and_then(|p| p.get("level"))
                            .and_then(|l| l.as_str())
                            .unwrap_or("info");
                        let data = params.and_then(|p| p.get("data")).cloned().unwrap_or_default();
                        debug!(target: "tool_server", "[{}] {}", level, data);
                    }
                    "notifications/tools/list_changed" => {
                        info!("Tool server reported a changed tool list; keeping the startup registry");
                    }
                    other => trace!("Reader loop: ignoring notification method={}", other),
                }
            }

            MessageKind::Unknown => {
                debug!("Reader loop: ignoring message without id or method");
            }
        }
    }

    shared.mark_closed();
}

/// A handshaken session with a tool server.
pub struct McpSession {
    client: RpcClient,
    registry: ToolRegistry,
    server_name: String,
    protocol_version: String,
    call_timeout: Duration,
    call_lock: Mutex<()>,
    validator: DefaultArgumentValidator,
}

impl McpSession {
    /// Launch the server described by `spec`, perform the handshake and list
    /// its tools.
    ///
    /// Any failure after the process started terminates it before the error
    /// is returned.
    pub async fn start(spec: &LaunchSpec) -> std::result::Result<Self, SessionError> {
        if spec.command.trim().is_empty() {
            return Err(SessionError::InvalidLaunchSpec(
                "command must not be empty".to_string(),
            ));
        }

        let (transport, stdout) = StdioTransport::spawn(&spec.command, &spec.args, &spec.env)
            .map_err(|e| {
                SessionError::LaunchFailure(format!("{}: {}", spec.display_command(), e))
            })?;
        let client = RpcClient::start(transport, stdout);

        let handshake = tokio::time::timeout(spec.handshake_timeout, handshake(&client, spec));
        let outcome = match handshake.await {
            Ok(result) => result,
            Err(_) => Err(SessionError::HandshakeFailure(format!(
                "no handshake within {:.1}s",
                spec.handshake_timeout.as_secs_f64()
            ))),
        };

        match outcome {
            Ok((init, registry)) => {
                let server_name = init
                    .server_info
                    .map(|info| info.name)
                    .unwrap_or_else(|| "unknown".to_string());
                info!(
                    "Connected to tool server '{}' (protocol {}), {} tool(s)",
                    server_name,
                    init.protocol_version,
                    registry.len()
                );
                Ok(Self {
                    client,
                    registry,
                    server_name,
                    protocol_version: init.protocol_version,
                    call_timeout: spec.call_timeout,
                    call_lock: Mutex::new(()),
                    validator: DefaultArgumentValidator,
                })
            }
            Err(e) => {
                warn!("Tool server startup failed: {}", e);
                client.shutdown().await;
                Err(e)
            }
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    async fn call_tool(&self, request: &ToolCallRequest) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams {
            name: request.tool_name.clone(),
            arguments: request.arguments_json(),
        })?;

        let _guard = self.call_lock.lock().await;
        let value = self
            .client
            .request("tools/call", params, self.call_timeout)
            .await?;
        serde_json::from_value(value).map_err(|e| {
            McpError::UnexpectedResponse(format!("malformed tools/call result: {}", e))
        })
    }
}

/// `initialize`, `notifications/initialized`, then every `tools/list` page.
async fn handshake(
    client: &RpcClient,
    spec: &LaunchSpec,
) -> std::result::Result<(InitializeResult, ToolRegistry), SessionError> {
    // The handshake as a whole is bounded by the caller
    let budget = spec.handshake_timeout;
    let handshake_err = |e: McpError| SessionError::HandshakeFailure(e.to_string());

    let params = serde_json::to_value(InitializeParams::new(
        CLIENT_NAME,
        env!("CARGO_PKG_VERSION"),
    ))
    .map_err(|e| handshake_err(e.into()))?;
    let value = client
        .request("initialize", params, budget)
        .await
        .map_err(startup_error)?;
    let init: InitializeResult = serde_json::from_value(value).map_err(|e| {
        SessionError::ProtocolError(format!("malformed initialize result: {}", e))
    })?;

    if !init.is_supported_version() {
        return Err(handshake_err(McpError::UnsupportedProtocolVersion(
            init.protocol_version.clone(),
        )));
    }
    debug!(
        "Negotiated protocol {} with capabilities {}",
        init.protocol_version, init.capabilities
    );

    client
        .notify("notifications/initialized")
        .await
        .map_err(handshake_err)?;

    let tools = list_all_tools(client, budget).await?;
    let registry = ToolRegistry::from_descriptors(tools.into_iter().map(to_descriptor))
        .map_err(|e| SessionError::ProtocolError(e.to_string()))?;

    Ok((init, registry))
}

async fn list_all_tools(
    client: &RpcClient,
    timeout: Duration,
) -> std::result::Result<Vec<McpTool>, SessionError> {
    let mut tools = Vec::new();
    let mut cursor: Option<String> = None;
    let mut seen_cursors = HashSet::new();

    for _ in 0..MAX_LIST_PAGES {
        let params = match &cursor {
            Some(c) => serde_json::json!({ "cursor": c }),
            None => serde_json::json!({}),
        };
        let value = client
            .request("tools/list", params, timeout)
            .await
            .map_err(startup_error)?;
        let page: ListToolsResult = serde_json::from_value(value).map_err(|e| {
            SessionError::ProtocolError(format!("malformed tools/list result: {}", e))
        })?;

        debug!("tools/list page with {} tool(s)", page.tools.len());
        tools.extend(page.tools);

        match page.next_cursor {
            Some(next) if !next.is_empty() => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(SessionError::ProtocolError(format!(
                        "tools/list cursor '{}' repeated",
                        next
                    )));
                }
                cursor = Some(next);
            }
            _ => return Ok(tools),
        }
    }

    Err(SessionError::ProtocolError(format!(
        "tools/list did not finish within {} pages",
        MAX_LIST_PAGES
    )))
}

/// Startup request failures: a server that answered wrongly is a protocol
/// error, one that did not answer at all failed the handshake.
fn startup_error(error: McpError) -> SessionError {
    match error {
        McpError::RpcError { .. } | McpError::UnexpectedResponse(_) => {
            SessionError::ProtocolError(error.to_string())
        }
        other => SessionError::HandshakeFailure(other.to_string()),
    }
}

fn to_descriptor(tool: McpTool) -> ToolDescriptor {
    let descriptor = ToolDescriptor::new(tool.name, tool.description.unwrap_or_default());
    match tool.input_schema {
        Some(schema) if schema.is_object() => descriptor.with_schema(schema),
        _ => descriptor,
    }
}

fn failure_from_error(tool_name: &str, error: McpError, timeout: Duration) -> ToolFailure {
    match error {
        McpError::Timeout(_) => ToolFailure::timeout(tool_name, timeout),
        McpError::TransportClosed | McpError::SpawnError(_) => ToolFailure::transport_closed(),
        McpError::RpcError { code, message } => ToolFailure::server_error(code, &message),
        other => ToolFailure::new(ToolFailureKind::ServerError, other.to_string()),
    }
}

#[async_trait]
impl ToolSession for McpSession {
    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
        let name = request.tool_name.as_str();

        let Some(descriptor) = self.registry.describe(name) else {
            return ToolCallResult::failure(name, ToolFailure::unknown_tool(name));
        };
        if let Err(message) = self.validator.validate(request, descriptor) {
            return ToolCallResult::failure(name, ToolFailure::invalid_arguments(message));
        }
        if self.client.is_closed() {
            return ToolCallResult::failure(name, ToolFailure::transport_closed());
        }

        debug!("Calling tool '{}'", name);
        match self.call_tool(request).await {
            Ok(result) if result.is_error => {
                ToolCallResult::failure(name, ToolFailure::tool_error(result.render_text()))
            }
            Ok(result) => ToolCallResult::success(name, result.render_text()),
            Err(e) => {
                ToolCallResult::failure(name, failure_from_error(name, e, self.call_timeout))
            }
        }
    }

    fn is_degraded(&self) -> bool {
        self.client.is_closed()
    }

    async fn close(&self) {
        debug!("Closing session with tool server '{}'", self.server_name);
        self.client.shutdown().await;
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        self.client.reader_handle.abort();
    }
}
