//! External tool execution with timeout and cancellation.
//!
//! Every subprocess the service starts (yt-dlp, ffmpeg, ffprobe) goes through
//! [`ToolCommand`]. The child is spawned with `kill_on_drop`, so abandoning the
//! wait (timeout, cancellation, or the caller's future being dropped) also
//! terminates the process.

pub mod registry;

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::errors::DomainError;

pub use registry::{Tool, ToolInfo, ToolRegistry};

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Last few stderr lines, joined for error messages
    pub fn stderr_tail(&self) -> String {
        stderr_tail(&self.stderr)
    }
}

/// Builder for a single external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Short tool name used in logs and errors
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run to completion and return the captured output whatever the exit status.
    ///
    /// # Errors
    ///
    /// - `ToolNotFound` if the executable does not exist.
    /// - `Timeout` if the process outlives the configured timeout.
    /// - `Cancelled` if `cancel` fires first.
    /// - `ToolFailed` for any other spawn or wait failure.
    pub async fn output(&self, cancel: &CancellationToken) -> Result<ToolOutput, DomainError> {
        let tool = self.tool_name();
        debug!(tool = %tool, args = ?self.args, "spawning tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DomainError::ToolNotFound(tool.clone())
            } else {
                DomainError::ToolFailed {
                    tool: tool.clone(),
                    message: format!("failed to spawn: {}", e),
                }
            }
        })?;

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(tool = %tool, "tool cancelled");
                return Err(DomainError::Cancelled);
            }
            waited = tokio::time::timeout(self.timeout, child.wait_with_output()) => waited,
        };

        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DomainError::ToolFailed {
                    tool,
                    message: format!("failed to wait: {}", e),
                })
            }
            Err(_) => {
                return Err(DomainError::Timeout {
                    operation: tool,
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Like [`ToolCommand::output`] but a non-zero exit becomes `ToolFailed`.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput, DomainError> {
        let output = self.output(cancel).await?;
        if !output.success() {
            return Err(DomainError::ToolFailed {
                tool: self.tool_name(),
                message: format!("exited with {}: {}", output.status, output.stderr_tail()),
            });
        }
        Ok(output)
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
