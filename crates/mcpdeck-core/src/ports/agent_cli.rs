//! Agent CLI execution port.
//!
//! The reconciliation engine talks to the agent CLI exclusively through
//! this trait; the production implementation (subprocess spawning with
//! retry) lives in the runtime crate, and tests script responses.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Default per-execution time budget.
///
/// Health-check listings routinely take several seconds per server, so
/// the budget is generous; retries must fit inside it.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for one CLI execution.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Total time budget for the call, including retries and backoff.
    pub timeout: Duration,
    /// Working directory for the spawned process.
    pub cwd: Option<PathBuf>,
}

impl ExecOptions {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, cwd: None }
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self::new(DEFAULT_EXEC_TIMEOUT)
    }
}

/// Normalized failure of a CLI execution.
///
/// Every failure mode (spawn error, timeout kill, non-zero exit,
/// exhausted retries) collapses into this one shape; `exit_code` is
/// `None` whenever the tool never ran to completion.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CommandError {
    /// One-line description suitable for surfacing to the user.
    pub message: String,
    /// The command line that failed, for diagnostics.
    pub command: String,
    /// Exit code reported by the tool, if it ran to completion.
    pub exit_code: Option<i32>,
    /// Captured stderr, empty when none was produced.
    pub stderr: String,
}

impl CommandError {
    /// Error with no exit status (spawn failure, timeout, exhausted budget).
    #[must_use]
    pub fn without_status(message: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: command.into(),
            exit_code: None,
            stderr: String::new(),
        }
    }

    /// Error carrying the tool's own exit status and stderr.
    #[must_use]
    pub fn from_exit(
        message: impl Into<String>,
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
        }
    }
}

/// Port for executing the agent CLI.
#[async_trait]
pub trait AgentCli: Send + Sync {
    /// Run the CLI with an argument vector and return its stdout.
    ///
    /// Implementations never invoke a shell; `args` is passed through
    /// verbatim.
    async fn execute(&self, args: &[String], opts: &ExecOptions) -> Result<String, CommandError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display_is_the_message() {
        let err = CommandError::from_exit("mcp list failed", "claude mcp list", Some(1), "boom");
        assert_eq!(err.to_string(), "mcp list failed");
        assert_eq!(err.exit_code, Some(1));
    }

    #[test]
    fn test_exec_options_default_budget() {
        let opts = ExecOptions::default();
        assert_eq!(opts.timeout, DEFAULT_EXEC_TIMEOUT);
        assert!(opts.cwd.is_none());
    }
}
