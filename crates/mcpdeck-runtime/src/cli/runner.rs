//! Agent CLI subprocess execution with bounded, time-budgeted retries.
//!
//! The wrapped CLI is slow (multi-second health checks) and
//! occasionally flaky on transient network errors. Every retry here is
//! budget-aware: a backoff that no longer fits in the caller's time
//! budget aborts the call instead of wasting the last window on a
//! doomed wait.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mcpdeck_core::ports::{AgentCli, CommandError, ExecOptions};
use tokio::process::Command;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Maximum retries after the first attempt (total attempts = cap + 1).
pub const MAX_RETRIES: u32 = 3;

/// Base backoff before the first retry; doubles per retry (1s, 2s, 4s).
pub const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Cap on captured stdout; exceeding it is a terminal failure.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Set by the agent CLI in sessions it spawns itself. Stripped from the
/// child environment so the CLI never mistakes us for a nested session.
const NESTED_SESSION_ENV: &str = "CLAUDECODE";

/// One failed attempt, before normalization into [`CommandError`].
struct AttemptFailure {
    error: CommandError,
    retryable: bool,
}

/// Production [`AgentCli`] implementation: spawns the agent CLI binary
/// with an argument vector (never a shell string) and retries transient
/// failures with exponential backoff.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    binary: String,
}

impl CommandRunner {
    /// Runner for the given CLI binary name or path.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The binary this runner spawns.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut line = self.binary.clone();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Execute with retries inside `opts.timeout`.
    ///
    /// Retry policy: transient failures (timeout kill, connection-level
    /// OS errors) retry up to [`MAX_RETRIES`] times with doubling
    /// backoff; a missing executable or a non-zero exit is terminal and
    /// surfaces immediately. The most recent failure wins when the
    /// budget or the retry cap runs out.
    pub async fn execute(&self, args: &[String], opts: &ExecOptions) -> Result<String, CommandError> {
        let command_line = self.command_line(args);
        let started = Instant::now();
        let budget = opts.timeout;
        let mut last_failure: Option<CommandError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = backoff_for(attempt);
                let remaining = budget.saturating_sub(started.elapsed());
                // A backoff that eats the remaining budget is a doomed wait
                if backoff >= remaining {
                    break;
                }
                debug!(
                    attempt,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    command = %command_line,
                    "Retrying after backoff"
                );
                sleep(backoff).await;
            }

            // Recompute after waking: never spawn with a spent budget
            let remaining = budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }

            match self.run_once(args, opts, remaining, &command_line).await {
                Ok(stdout) => return Ok(stdout),
                Err(failure) => {
                    if failure.retryable {
                        warn!(attempt, error = %failure.error, "Transient CLI failure");
                    }
                    let retryable = failure.retryable;
                    last_failure = Some(failure.error);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| {
            // Degenerate budget: no attempt was ever made
            CommandError::without_status(
                format!(
                    "`{command_line}` was not attempted: time budget of {}ms already exhausted",
                    budget.as_millis()
                ),
                command_line.clone(),
            )
        }))
    }

    async fn run_once(
        &self,
        args: &[String],
        opts: &ExecOptions,
        attempt_timeout: Duration,
        command_line: &str,
    ) -> Result<String, AttemptFailure> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .env_remove(NESTED_SESSION_ENV)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &opts.cwd {
            cmd.current_dir(cwd);
        }

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(error) => return Err(classify_spawn_error(&error, command_line)),
        };

        let output = match timeout(attempt_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                return Err(AttemptFailure {
                    error: CommandError::without_status(
                        format!("`{command_line}` failed: {error}"),
                        command_line,
                    ),
                    retryable: is_retryable_io(error.kind()),
                });
            }
            Err(_elapsed) => {
                // The kill-on-timeout classification takes priority over
                // any exit status the dying process may race to report
                return Err(AttemptFailure {
                    error: CommandError::without_status(
                        format!(
                            "`{command_line}` timed out after {}ms",
                            attempt_timeout.as_millis()
                        ),
                        command_line,
                    ),
                    retryable: true,
                });
            }
        };

        if output.stdout.len() > MAX_OUTPUT_BYTES {
            return Err(AttemptFailure {
                error: CommandError::without_status(
                    format!("`{command_line}` produced more than {MAX_OUTPUT_BYTES} bytes of output"),
                    command_line,
                ),
                retryable: false,
            });
        }

        if !output.status.success() {
            // The tool ran and reported failure: terminal, never retried
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let described = exit_code.map_or_else(
                || "a signal".to_string(),
                |code| format!("exit code {code}"),
            );
            return Err(AttemptFailure {
                error: CommandError::from_exit(
                    format!("`{command_line}` failed with {described}"),
                    command_line,
                    exit_code,
                    stderr,
                ),
                retryable: false,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl AgentCli for CommandRunner {
    async fn execute(&self, args: &[String], opts: &ExecOptions) -> Result<String, CommandError> {
        Self::execute(self, args, opts).await
    }
}

/// Backoff before retry number `attempt` (1-based): `BASE * 2^(n-1)`.
#[must_use]
pub fn backoff_for(attempt: u32) -> Duration {
    BASE_BACKOFF * 2u32.saturating_pow(attempt.saturating_sub(1))
}

fn classify_spawn_error(error: &std::io::Error, command_line: &str) -> AttemptFailure {
    if error.kind() == std::io::ErrorKind::NotFound {
        return AttemptFailure {
            error: CommandError::without_status(
                format!("`{command_line}` failed: executable not found"),
                command_line,
            ),
            retryable: false,
        };
    }
    AttemptFailure {
        error: CommandError::without_status(
            format!("`{command_line}` failed to spawn: {error}"),
            command_line,
        ),
        retryable: is_retryable_io(error.kind()),
    }
}

/// Transient OS-level error kinds worth retrying; everything else is
/// terminal.
const fn is_retryable_io(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_backoff_sequence_doubles_from_base() {
        assert_eq!(backoff_for(1), Duration::from_secs(1));
        assert_eq!(backoff_for(2), Duration::from_secs(2));
        assert_eq!(backoff_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retryable_io_kinds() {
        assert!(is_retryable_io(std::io::ErrorKind::ConnectionReset));
        assert!(is_retryable_io(std::io::ErrorKind::TimedOut));
        assert!(!is_retryable_io(std::io::ErrorKind::NotFound));
        assert!(!is_retryable_io(std::io::ErrorKind::PermissionDenied));
    }

    #[tokio::test]
    async fn test_successful_execution_returns_stdout() {
        let runner = CommandRunner::new("echo");
        let result = runner
            .execute(&args(&["hello"]), &ExecOptions::default())
            .await;
        let stdout = assert_ok!(result);
        assert_eq!(stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_missing_executable_is_terminal() {
        let runner = CommandRunner::new("mcpdeck-test-no-such-binary");
        let started = Instant::now();
        let error = runner
            .execute(&args(&["mcp", "list"]), &ExecOptions::default())
            .await
            .unwrap_err();

        assert!(error.message.contains("executable not found"), "{error}");
        assert_eq!(error.exit_code, None);
        // Terminal failures make exactly one attempt: no backoff sleeps
        assert!(started.elapsed() < BASE_BACKOFF);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_terminal_with_stderr() {
        let runner = CommandRunner::new("sh");
        let started = Instant::now();
        let error = runner
            .execute(
                &args(&["-c", "echo broken >&2; exit 3"]),
                &ExecOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(error.exit_code, Some(3));
        assert!(error.stderr.contains("broken"));
        assert!(started.elapsed() < BASE_BACKOFF);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kill_is_reported_and_budget_bounded() {
        let runner = CommandRunner::new("sleep");
        let opts = ExecOptions::new(Duration::from_millis(300));
        let started = Instant::now();
        let error = runner.execute(&args(&["5"]), &opts).await.unwrap_err();

        assert!(error.message.contains("timed out"), "{error}");
        assert_eq!(error.exit_code, None);
        // One attempt at ~300ms, then the 1s backoff no longer fits
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_zero_budget_synthesizes_an_error() {
        let runner = CommandRunner::new("echo");
        let opts = ExecOptions::new(Duration::ZERO);
        let error = runner.execute(&args(&["hello"]), &opts).await.unwrap_err();
        assert!(error.message.contains("time budget"), "{error}");
    }
}
