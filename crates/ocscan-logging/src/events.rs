use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const RULE_WIDTH: usize = 80;

/// Structured events emitted while scanning and exporting sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    ListingStarted,
    ListingCompleted {
        sessions: usize,
    },
    SessionStarted {
        index: usize,
        total: usize,
        session_id: String,
    },
    SessionSkipped {
        reason: String,
    },
    FetchFailed {
        session_id: String,
        error: String,
    },
    ParseFailed {
        session_id: String,
        error: String,
    },
    MatchFound {
        session_id: String,
        match_count: usize,
    },
    /// One located value, printed verbatim
    MatchDetail {
        index: usize,
        file_path: String,
        message_id: String,
        jq_path: String,
        content: String,
    },
    BatchCompleted {
        matched: usize,
        processed: usize,
    },
    BatchInterrupted {
        processed: usize,
    },
    ExportStarted {
        sessions: usize,
        output_dir: PathBuf,
    },
    DirectoryCreated {
        path: PathBuf,
    },
    ExportProgress {
        index: usize,
        total: usize,
        created_at: String,
        session_id: String,
    },
    ExportSaved {
        path: PathBuf,
        bytes: usize,
    },
    ExportFailed {
        session_id: String,
        error: String,
    },
    ExportCompleted {
        saved: usize,
        failed: usize,
        output_dir: PathBuf,
    },
}

impl ScanEvent {
    /// Scan diagnostics only surface in verbose mode. Export progress is
    /// always reported.
    pub fn is_diagnostic(&self) -> bool {
        !matches!(
            self,
            ScanEvent::ExportStarted { .. }
                | ScanEvent::DirectoryCreated { .. }
                | ScanEvent::ExportProgress { .. }
                | ScanEvent::ExportSaved { .. }
                | ScanEvent::ExportFailed { .. }
                | ScanEvent::ExportCompleted { .. }
        )
    }

    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

/// Logger for scan events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    verbose: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            file_writer: None,
        }
    }

    /// A logger that drops diagnostics and still reports export progress
    pub fn quiet() -> Self {
        Self::new(LogFormat::Pretty, false)
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, verbose: bool, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            verbose,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &ScanEvent) {
        // The file log records every event regardless of verbosity
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if let Some(text) = self.render(event) {
            let _ = writeln!(std::io::stderr(), "{}", text);
        }
    }

    /// Render an event for the console, or `None` if it is filtered out
    pub fn render(&self, event: &ScanEvent) -> Option<String> {
        if event.is_diagnostic() && !self.verbose {
            return None;
        }

        match self.format {
            LogFormat::Json => serde_json::to_string(event).ok(),
            LogFormat::Pretty => Some(Self::render_pretty(event)),
            LogFormat::Compact => Some(Self::render_compact(event)),
        }
    }

    fn render_pretty(event: &ScanEvent) -> String {
        let heavy_rule = "=".repeat(RULE_WIDTH);
        let light_rule = "-".repeat(RULE_WIDTH);

        match event {
            ScanEvent::ListingStarted => "Fetching session list...".dimmed().to_string(),
            ScanEvent::ListingCompleted { sessions } => {
                format!("Found {} sessions", sessions)
            }
            ScanEvent::SessionStarted {
                index,
                total,
                session_id,
            } => format!(
                "{} {}",
                format!("Processing session {}/{}:", index, total).dimmed(),
                session_id
            ),
            ScanEvent::SessionSkipped { reason } => {
                format!("{} Skipping session: {}", "⚠".bright_yellow(), reason)
            }
            ScanEvent::FetchFailed { session_id, error } => format!(
                "{} Error exporting session {}: {}",
                "✗".bright_red(),
                session_id,
                error.bright_red()
            ),
            ScanEvent::ParseFailed { session_id, error } => format!(
                "{} Skipping session {} (JSON parse error: {})",
                "⚠".bright_yellow(),
                session_id,
                error
            ),
            ScanEvent::MatchFound {
                session_id,
                match_count,
            } => format!(
                "\n{}\n{} Match found in {}\n  Found {} write tool(s) with pattern\n{}",
                heavy_rule.bright_blue(),
                "✓".bright_green(),
                session_id.bold(),
                match_count,
                heavy_rule.bright_blue()
            ),
            ScanEvent::MatchDetail {
                index,
                file_path,
                message_id,
                jq_path,
                content,
            } => format!(
                "\n{}\nFile Path: {}\nMessage ID: {}\nJQ Path: {}\n\nContent:\n{}\n{}\n{}",
                format!("--- Write Tool #{} ---", index).bright_cyan().bold(),
                file_path,
                message_id,
                jq_path.bright_white(),
                light_rule.dimmed(),
                content,
                light_rule.dimmed()
            ),
            ScanEvent::BatchCompleted { matched, processed } => format!(
                "\nCompleted: {} matches found out of {} sessions processed",
                matched, processed
            ),
            ScanEvent::BatchInterrupted { processed } => format!(
                "{} Interrupted after {} session(s)",
                "⚠".bright_yellow(),
                processed
            ),
            ScanEvent::ExportStarted {
                sessions,
                output_dir,
            } => format!(
                "\nFound {} matching session(s)\nExporting to {}/\n{}",
                sessions,
                output_dir.display(),
                light_rule
            ),
            ScanEvent::DirectoryCreated { path } => {
                format!("Created directory: {}/", path.display())
            }
            ScanEvent::ExportProgress {
                index,
                total,
                created_at,
                session_id,
            } => format!("[{}/{}] {} - {}...", index, total, created_at, session_id),
            ScanEvent::ExportSaved { path, bytes } => format!(
                "         {} Saved to {} ({} bytes)",
                "✓".bright_green(),
                path.display(),
                group_thousands(*bytes)
            ),
            ScanEvent::ExportFailed { session_id, error } => format!(
                "         {} Error exporting {}: {}",
                "✗".bright_red(),
                session_id,
                error
            ),
            ScanEvent::ExportCompleted {
                saved,
                failed,
                output_dir,
            } => {
                let mut text = format!(
                    "{}\n\n{} Export complete! {} session(s) saved in {}/",
                    light_rule,
                    "✓".bright_green(),
                    saved,
                    output_dir.display()
                );
                if *failed > 0 {
                    text.push_str(&format!(
                        "\n{} {} session(s) failed to export",
                        "✗".bright_red(),
                        failed
                    ));
                }
                text.push_str(&format!(
                    "\n\nYou can now use jq to query them:\n  jq '.info.title' {}/*.json",
                    output_dir.display()
                ));
                text
            }
        }
    }

    fn render_compact(event: &ScanEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            ScanEvent::ListingStarted => format!("[{}] list:start", timestamp),
            ScanEvent::ListingCompleted { sessions } => {
                format!("[{}] list:done {}", timestamp, sessions)
            }
            ScanEvent::SessionStarted {
                index,
                total,
                session_id,
            } => format!("[{}] session:{}/{} {}", timestamp, index, total, session_id),
            ScanEvent::SessionSkipped { reason } => format!("[{}] skip:{}", timestamp, reason),
            ScanEvent::FetchFailed { session_id, error } => {
                format!("[{}] fetch:fail:{} {}", timestamp, session_id, error)
            }
            ScanEvent::ParseFailed { session_id, error } => {
                format!("[{}] parse:fail:{} {}", timestamp, session_id, error)
            }
            ScanEvent::MatchFound {
                session_id,
                match_count,
            } => format!("[{}] match:{} x{}", timestamp, session_id, match_count),
            ScanEvent::MatchDetail {
                index, jq_path, ..
            } => format!("[{}] match:#{} {}", timestamp, index, jq_path),
            ScanEvent::BatchCompleted { matched, processed } => {
                format!("[{}] batch:done {}/{}", timestamp, matched, processed)
            }
            ScanEvent::BatchInterrupted { processed } => {
                format!("[{}] batch:interrupted {}", timestamp, processed)
            }
            ScanEvent::ExportStarted {
                sessions,
                output_dir,
            } => format!(
                "[{}] export:start {} -> {}",
                timestamp,
                sessions,
                output_dir.display()
            ),
            ScanEvent::DirectoryCreated { path } => {
                format!("[{}] export:mkdir {}", timestamp, path.display())
            }
            ScanEvent::ExportProgress {
                index,
                total,
                session_id,
                ..
            } => format!("[{}] export:{}/{} {}", timestamp, index, total, session_id),
            ScanEvent::ExportSaved { path, bytes } => {
                format!("[{}] export:saved {} {}b", timestamp, path.display(), bytes)
            }
            ScanEvent::ExportFailed { session_id, error } => {
                format!("[{}] export:fail:{} {}", timestamp, session_id, error)
            }
            ScanEvent::ExportCompleted { saved, failed, .. } => format!(
                "[{}] export:done saved={} failed={}",
                timestamp, saved, failed
            ),
        }
    }
}

/// Format a byte count with comma thousands separators
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
