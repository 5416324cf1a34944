use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::ProcessOutput;

/// Errors that can occur while running an external process
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    #[error("Process produced invalid output: {0}")]
    InvalidOutput(String),
}

/// Utility for spawning the session tool
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Run a process to completion, capturing stdout and stderr through pipes
    pub async fn capture(
        binary: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ProcessError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            args = ?args,
            "Spawning process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null()) // Non-interactive
            .kill_on_drop(true);

        let output = with_timeout(cmd.output(), timeout).await??;
        let duration = start.elapsed();

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ProcessError::InvalidOutput(format!("stdout is not UTF-8: {}", e)))?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(
            exit_code,
            duration_ms = duration.as_millis(),
            "Process completed"
        );

        Ok(ProcessOutput::new(stdout, stderr, exit_code, duration))
    }

    /// Run a process with stdout redirected into `stdout_path`.
    ///
    /// The session tool truncates large documents when stdout is a pipe, so
    /// exports are written to a file instead. Stderr is discarded.
    pub async fn capture_to_file(
        binary: &Path,
        args: &[&str],
        stdout_path: &Path,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ProcessError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            args = ?args,
            stdout_path = %stdout_path.display(),
            "Spawning process with file-backed stdout"
        );

        let stdout_file = std::fs::File::create(stdout_path)?;

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let status = with_timeout(child.wait(), timeout).await??;
        let duration = start.elapsed();

        debug!(
            exit_code = status.code().unwrap_or(-1),
            duration_ms = duration.as_millis(),
            "Process completed"
        );

        Ok(ProcessOutput::new(
            String::new(),
            String::new(),
            status.code().unwrap_or(-1),
            duration,
        ))
    }
}

async fn with_timeout<F, T>(future: F, timeout: Option<Duration>) -> Result<T, ProcessError>
where
    F: std::future::Future<Output = T>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| ProcessError::Timeout(limit)),
        None => Ok(future.await),
    }
}
