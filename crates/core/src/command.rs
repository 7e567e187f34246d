//! External command runner.
//!
//! Every call to `ffmpeg`/`ffprobe` goes through [`run`]: one child process
//! per call, argv passed as discrete arguments (never through a shell),
//! stdout/stderr captured, and a hard timeout after which the child is killed.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::CoreError;

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Number of stderr characters carried by [`CoreError::CommandExecution`].
pub const STDERR_EXCERPT_CHARS: usize = 1000;

/// Captured output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Render a program and its arguments as a single display string.
///
/// Only used for logs and error messages; the command itself is never
/// executed from this string.
pub fn command_line<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> String {
    let mut line = program.as_ref().to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Run `program` with `args`, waiting at most `timeout` for it to exit.
///
/// A non-zero exit yields [`CoreError::CommandExecution`] with the first
/// [`STDERR_EXCERPT_CHARS`] characters of stderr. Expiry of `timeout` kills
/// the child and yields [`CoreError::Timeout`].
pub async fn run<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    timeout: Duration,
) -> Result<CommandOutput, CoreError> {
    let program = program.as_ref();
    let cmd_line = command_line(program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(command = %cmd_line, "Spawning external command");
    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| {
        CoreError::Unexpected(format!(
            "failed to start {}: {e}",
            program.to_string_lossy()
        ))
    })?;

    // Drain both pipes concurrently so a chatty child cannot block on a full
    // pipe while we wait for it.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();
    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => return Err(CoreError::from(e)),
        Err(_elapsed) => {
            // Dropping `child` kills the process (`kill_on_drop`).
            tracing::warn!(
                command = %cmd_line,
                timeout_secs = timeout.as_secs(),
                "External command timed out"
            );
            return Err(CoreError::Timeout {
                command: cmd_line,
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();
    let stdout = String::from_utf8_lossy(&stdout_bytes).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();

    if !status.success() {
        tracing::debug!(
            command = %cmd_line,
            exit_code = ?status.code(),
            duration_ms,
            "External command failed"
        );
        return Err(CoreError::CommandExecution {
            command: cmd_line,
            stderr: stderr_excerpt(&stderr),
        });
    }

    tracing::debug!(command = %cmd_line, duration_ms, "External command finished");

    Ok(CommandOutput {
        stdout,
        stderr,
        duration_ms,
    })
}

/// First [`STDERR_EXCERPT_CHARS`] characters of `stderr`.
fn stderr_excerpt(stderr: &str) -> String {
    stderr.chars().take(STDERR_EXCERPT_CHARS).collect()
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}
