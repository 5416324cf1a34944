use std::path::PathBuf;
use thiserror::Error;

use ocscan_source::{SinkError, SourceError};

#[derive(Error, Debug)]
pub enum ScanError {
    /// The session listing could not be obtained
    #[error("Session source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Failed to fetch session {id}: {reason}")]
    FetchFailed { id: String, reason: String },

    #[error("Failed to parse session {id}: {reason}")]
    ParseFailed { id: String, reason: String },

    #[error("Failed to write {}: {reason}", destination.display())]
    WriteFailed { destination: PathBuf, reason: String },
}

impl ScanError {
    /// Only a missing session listing stops a run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::SourceUnavailable(_))
    }

    /// A source error raised while fetching one session. Never fatal, even
    /// when the source reports itself unavailable.
    pub fn fetch_failed(session_id: &str, err: SourceError) -> Self {
        match err {
            SourceError::FetchFailed { id, reason } => ScanError::FetchFailed { id, reason },
            SourceError::Unavailable(reason) => ScanError::FetchFailed {
                id: session_id.to_string(),
                reason,
            },
        }
    }
}

impl From<SourceError> for ScanError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(reason) => ScanError::SourceUnavailable(reason),
            SourceError::FetchFailed { id, reason } => ScanError::FetchFailed { id, reason },
        }
    }
}


impl From<SinkError> for ScanError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::WriteFailed {
                destination,
                reason,
            } => ScanError::WriteFailed {
                destination,
                reason,
            },
            SinkError::DirectoryFailed { path, reason } => ScanError::WriteFailed {
                destination: path,
                reason,
            },
        }
    }
}
