use std::time::Duration;

/// Output captured from a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Captured stdout (empty when stdout was redirected to a file)
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Exit code from the process
    pub exit_code: i32,
    /// Duration of execution
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn new(stdout: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            duration,
        }
    }

    /// Check if the process exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Describe a failed run for error messages
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exited with status {}", self.exit_code)
        } else {
            format!("exited with status {}: {}", self.exit_code, stderr)
        }
    }
}
