//! Subprocess execution for external build tools.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::stage::{ToolInvocation, ToolKind};

/// Result of a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Tool that ran.
    pub kind: ToolKind,

    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Captured stdout (empty when inherited).
    pub stdout: String,

    /// Captured stderr (empty when inherited).
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl ToolOutcome {
    /// Whether this invocation passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }

    /// Convert a failed outcome into the matching external tool error.
    pub fn into_result(self) -> Result<ToolOutcome> {
        if self.passed() {
            Ok(self)
        } else {
            Err(BuildError::ExternalTool {
                tool: self.kind.name().to_string(),
                exit_code: self.exit_code,
            })
        }
    }
}

/// Backend that runs tool invocations.
///
/// Implementations must not return before the child has exited.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run `invocation` to completion.
    ///
    /// A non-zero exit is reported through [`ToolOutcome`], not as an error;
    /// errors are reserved for calls that could not run at all.
    async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome>;
}

/// How child stdout/stderr are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Stream straight to the terminal.
    #[default]
    Inherit,
    /// Collect into the outcome.
    Capture,
}

/// Executor that spawns real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    output: OutputMode,
}

impl ProcessExecutor {
    /// Executor whose children write to the terminal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that captures child output.
    pub fn captured() -> Self {
        Self {
            output: OutputMode::Capture,
        }
    }
}

#[async_trait]
impl ToolExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome> {
        let start = Instant::now();

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        match self.output {
            OutputMode::Inherit => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Capture => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }

        debug!(tool = %invocation.kind, command = %invocation.command_line(), "spawning");

        let child = command.spawn().map_err(|source| BuildError::Spawn {
            tool: invocation.kind.name().to_string(),
            program: invocation.program.clone(),
            source,
        })?;

        let waited = if invocation.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(invocation.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| BuildError::Timeout {
                tool: invocation.kind.name().to_string(),
                secs: invocation.timeout_secs,
            })?
        } else {
            child.wait_with_output().await
        };

        let output = waited.map_err(|source| BuildError::Spawn {
            tool: invocation.kind.name().to_string(),
            program: invocation.program.clone(),
            source,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(ToolOutcome {
            kind: invocation.kind,
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms,
            success: output.status.success(),
        })
    }
}
