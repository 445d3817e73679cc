//! Host-process bridge to the UIA engine.
//!
//! With the `host` strategy the device's HTTP server is bypassed: a process
//! on the host machine drives the engine and is handed each command directly.
//! [`HostBridge`] is the seam; [`HostProcess`] runs an external tool once per
//! command.
//!
//! The tool is invoked as
//!
//! ```text
//! <program> <args...> <serialized command>
//! ```
//!
//! with `UIA_PID` / `UIA_UDID` set from the session when known. It must print
//! a single JSON object on stdout and exit with status 0. The reply is trusted
//! as-is; the router does not run it through response validation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, debug_span, Instrument};

use crate::command::serialize_command;
use crate::session::AutomationSession;

/// Default limit for a single host-tool invocation.
pub const DEFAULT_HOST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised by the host-process bridge.
#[derive(Error, Debug)]
pub enum HostError {
    /// No host tool is configured or it could not be found.
    #[error("host automation tool not found: {0}")]
    NotInstalled(String),

    /// The tool ran but exited unsuccessfully.
    #[error("host command failed: {0}")]
    CommandFailed(String),

    /// The tool did not finish in time.
    #[error("host command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The tool's stdout was not a JSON object.
    #[error("host reply is not a JSON object: {0}")]
    InvalidReply(String),

    /// Spawning or talking to the tool failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sends a command to the engine through a host-side process.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Delivers `name(args)` and returns the tool's reply map.
    async fn send_command(
        &self,
        session: &AutomationSession,
        name: &str,
        args: &[Value],
    ) -> Result<Map<String, Value>, HostError>;
}

/// [`HostBridge`] that spawns an external program per command.
#[derive(Debug, Clone)]
pub struct HostProcess {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl HostProcess {
    /// Creates a bridge that runs `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_HOST_TIMEOUT,
        }
    }

    /// Adds fixed arguments placed before the serialized command.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parses a tool's stdout into a reply map.
fn parse_reply(stdout: &[u8]) -> Result<Map<String, Value>, HostError> {
    let text = String::from_utf8_lossy(stdout);
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(HostError::InvalidReply(text.trim().to_string())),
    }
}

#[async_trait]
impl HostBridge for HostProcess {
    async fn send_command(
        &self,
        session: &AutomationSession,
        name: &str,
        args: &[Value],
    ) -> Result<Map<String, Value>, HostError> {
        let serialized = serialize_command(name, args);
        let span = debug_span!("host_command", command = name);
        async {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args)
                .arg(&serialized)
                .stdin(Stdio::null())
                .kill_on_drop(true);
            if let Some(pid) = session.pid {
                cmd.env("UIA_PID", pid.to_string());
            }
            if let Some(udid) = &session.udid {
                cmd.env("UIA_UDID", udid);
            }

            let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
                Err(_) => return Err(HostError::Timeout(self.timeout)),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(HostError::NotInstalled(self.program.display().to_string()));
                }
                Ok(result) => result?,
            };

            if !output.status.success() {
                return Err(HostError::CommandFailed(
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ));
            }

            let reply = parse_reply(&output.stdout)?;
            debug!(keys = reply.len(), "host reply received");
            Ok(reply)
        }
        .instrument(span)
        .await
    }
}
