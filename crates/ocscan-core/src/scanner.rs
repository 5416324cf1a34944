use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use ocscan_source::SessionListing;

use crate::matcher::find_matches;
use crate::report::{ReportedMatch, SessionReport, UNKNOWN};
use crate::selector::{WriteToolRule, DEFAULT_TOOL, DEFAULT_TOOL_TYPES};

/// Steps from the root to a message: `.messages[i]`
const MESSAGE_DEPTH: usize = 2;

/// What to look for in each session
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Literal, case-sensitive marker searched for in written content
    pub pattern: String,
    /// Tool name that identifies a write call
    pub tool: String,
    /// Accepted values of a part's `type` discriminant
    pub tool_types: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: "</content>".to_string(),
            tool: DEFAULT_TOOL.to_string(),
            tool_types: DEFAULT_TOOL_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Scans decoded session documents for write tool calls containing the marker
#[derive(Debug, Clone)]
pub struct SessionScanner {
    rule: WriteToolRule,
    pattern: String,
}

impl SessionScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            rule: WriteToolRule::new(config.tool, config.tool_types),
            pattern: config.pattern,
        }
    }

    /// Locate every matching write call in `document`, in document order
    pub fn find(&self, document: &Value) -> Vec<ReportedMatch> {
        find_matches(document, &self.rule, |content| {
            content.contains(self.pattern.as_str())
        })
        .into_iter()
        .map(|found| {
            let message_id = found
                .path
                .prefix(MESSAGE_DEPTH)
                .resolve(document)
                .and_then(|message| message.pointer("/info/id"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string();
            let file_path = found
                .path
                .parent()
                .and_then(|input| input.resolve(document))
                .and_then(|input| input.get("filePath"))
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_string();

            ReportedMatch {
                content: found.value,
                path: found.path,
                file_path,
                message_id,
            }
        })
        .collect()
    }

    /// Build the report for one session. Metadata comes from the document's
    /// `info` object, falling back to the listing entry.
    pub fn scan(&self, session_id: &str, listing: &SessionListing, document: &Value) -> SessionReport {
        let info = document.get("info");
        let info_str = |key: &str| {
            info.and_then(|i| i.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let created_ms = info
            .and_then(|i| i.pointer("/time/created"))
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .or_else(|| listing.created_ms());

        SessionReport {
            session_id: session_id.to_string(),
            created_at: created_ms
                .and_then(format_created)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            title: info_str("title")
                .or_else(|| listing.title.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            directory: info_str("directory")
                .or_else(|| listing.directory.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            matches: self.find(document),
        }
    }
}

impl Default for SessionScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Render an epoch-millisecond timestamp as ISO 8601 UTC. Zero counts as
/// missing.
pub fn format_created(epoch_ms: i64) -> Option<String> {
    if epoch_ms == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
