use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::{ProcessSpawner, SessionListing, SessionSource, SourceError};

const EXPORT_BANNER: &str = "Exporting session:";

/// Session source backed by the `opencode` CLI
pub struct OpenCodeSource {
    binary_path: PathBuf,
    timeout: Option<Duration>,
}

impl OpenCodeSource {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from("opencode"),
            timeout: None,
        }
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self {
            binary_path: path,
            timeout: None,
        }
    }

    /// Bound each invocation of the CLI
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for OpenCodeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionSource for OpenCodeSource {
    fn name(&self) -> &str {
        "OpenCode"
    }

    fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionListing>, SourceError> {
        let output = ProcessSpawner::capture(
            &self.binary_path,
            &["session", "list", "--format", "json"],
            self.timeout,
        )
        .await
        .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        if !output.success() {
            return Err(SourceError::Unavailable(format!(
                "opencode session list {}",
                output.failure_reason()
            )));
        }

        let body = output.stdout.trim();
        if body.is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<Value> = serde_json::from_str(body).map_err(|e| {
            SourceError::Unavailable(format!("Failed to parse session list JSON: {}", e))
        })?;
        let sessions: Vec<SessionListing> =
            entries.iter().map(SessionListing::from_value).collect();

        debug!(count = sessions.len(), "Listed sessions");
        Ok(sessions)
    }

    async fn fetch_session(&self, id: &str) -> Result<String, SourceError> {
        let fetch_failed = |reason: String| SourceError::FetchFailed {
            id: id.to_string(),
            reason,
        };

        let tmp = tempfile::Builder::new()
            .prefix("ocscan-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| fetch_failed(format!("Failed to create temp file: {}", e)))?;

        let output = ProcessSpawner::capture_to_file(
            &self.binary_path,
            &["export", id],
            tmp.path(),
            self.timeout,
        )
        .await
        .map_err(|e| fetch_failed(e.to_string()))?;

        if !output.success() {
            return Err(fetch_failed(format!(
                "opencode export {}",
                output.failure_reason()
            )));
        }

        let raw = std::fs::read_to_string(tmp.path())
            .map_err(|e| fetch_failed(format!("Failed to read export output: {}", e)))?;

        debug!(
            session_id = id,
            bytes = raw.len(),
            duration_ms = output.duration.as_millis(),
            "Exported session"
        );

        Ok(strip_export_banner(&raw).to_string())
    }
}

/// Drop the `Exporting session: ...` line the CLI may print ahead of the
/// JSON body. Text without the banner is returned unchanged.
pub fn strip_export_banner(raw: &str) -> &str {
    if raw.starts_with(EXPORT_BANNER) {
        if let Some(json_start) = raw.find('{') {
            return &raw[json_start..];
        }
    }
    raw
}
