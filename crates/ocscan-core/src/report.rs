use serde::Serialize;

use crate::path::QueryPath;

/// Placeholder for metadata the session does not carry
pub(crate) const UNKNOWN: &str = "unknown";

/// One matching write tool call inside a session
#[derive(Debug, Clone, Serialize)]
pub struct ReportedMatch {
    /// The full written content
    pub content: String,
    /// jq path to the content field
    pub path: QueryPath,
    /// `state.input.filePath` of the tool call
    pub file_path: String,
    /// `info.id` of the enclosing message
    pub message_id: String,
}

/// Scan result for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub created_at: String,
    pub title: String,
    pub directory: String,
    pub matches: Vec<ReportedMatch>,
}

impl SessionReport {
    pub fn is_match(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Rendered paths joined with `;`
    pub fn jq_paths(&self) -> String {
        self.matches
            .iter()
            .map(|m| m.path.render())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `session_id \t created_at \t title \t directory \t jq_paths`
    pub fn to_tsv_line(&self) -> String {
        [
            tsv_field(&self.session_id),
            tsv_field(&self.created_at),
            tsv_field(&self.title),
            tsv_field(&self.directory),
            self.jq_paths(),
        ]
        .join("\t")
    }
}

/// Tabs and line breaks inside a field would break the column layout
fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Everything a batch run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    /// Sessions with at least one match, in listing order
    pub reports: Vec<SessionReport>,
    /// Entries in the session listing
    pub listed: usize,
    /// Sessions that were fetched (successfully or not)
    pub processed: usize,
    /// Listing entries without an id
    pub skipped: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    /// The run was stopped before the listing was exhausted
    pub interrupted: bool,
}

impl BatchResult {
    pub fn match_count(&self) -> usize {
        self.reports.len()
    }

    pub fn failures(&self) -> usize {
        self.fetch_failures + self.parse_failures
    }
}
