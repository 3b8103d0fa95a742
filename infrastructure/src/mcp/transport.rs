//! Stdio transport to a tool server process.
//!
//! [`StdioTransport`] owns the child process and its stdin. The stdout half
//! is handed to the session's reader task at spawn time; stderr is forwarded
//! line by line to `tracing` under the `tool_server` target.

use crate::mcp::error::{McpError, Result};
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

pub struct StdioTransport {
    /// `None` once the transport is closed.
    writer: Mutex<Option<BufWriter<ChildStdin>>>,
    /// Tool server child process (killed on drop to prevent orphans).
    child: Mutex<Option<Child>>,
    command: String,
}

impl StdioTransport {
    /// Spawn `command args...` with piped stdio.
    ///
    /// `env` is added on top of the inherited environment. Returns the
    /// transport and the child's stdout for the reader task.
    pub fn spawn<'a>(
        command: &str,
        args: &[String],
        env: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Result<(Self, ChildStdout)> {
        debug!("Spawning tool server: {} {}", command, args.join(" "));

        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::SpawnError(std::io::Error::other("Failed to capture stdin")))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            McpError::SpawnError(std::io::Error::other("Failed to capture stdout"))
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "tool_server", "{}", line);
                }
            });
        }

        info!(
            "Tool server started (pid {})",
            child.id().map(|p| p.to_string()).unwrap_or_else(|| "?".into())
        );

        let transport = Self {
            writer: Mutex::new(Some(BufWriter::new(stdin))),
            child: Mutex::new(Some(child)),
            command: command.to_string(),
        };
        Ok((transport, stdout))
    }

    /// Write one message as a single JSON line.
    pub async fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        trace!("Transport sending: {}", line);
        line.push('\n');

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(McpError::TransportClosed)?;
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            debug!("Transport write failed: {}", e);
            *guard = None;
            return Err(McpError::TransportClosed);
        }
        Ok(())
    }

    /// Shut the server down: close its stdin, give it `grace` to exit, then
    /// kill it. Safe to call more than once.
    pub async fn close(&self, grace: Duration) {
        // Dropping stdin is the polite shutdown signal for stdio servers
        self.writer.lock().await.take();

        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => debug!("Tool server '{}' exited: {}", self.command, status),
            Ok(Err(e)) => warn!("Failed to wait for tool server: {}", e),
            Err(_) => {
                debug!("Tool server did not exit within {:?}, killing", grace);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill tool server: {}", e);
                }
            }
        }
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.child.try_lock()
            && let Some(child) = guard.as_mut()
        {
            debug!("StdioTransport dropping, killing tool server child process");
            let _ = child.start_kill();
        }
    }
}
