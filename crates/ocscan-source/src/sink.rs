use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while persisting documents
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write {}: {reason}", destination.display())]
    WriteFailed { destination: PathBuf, reason: String },

    #[error("Failed to create directory {}: {reason}", path.display())]
    DirectoryFailed { path: PathBuf, reason: String },
}

/// Destination for exported session documents
pub trait Sink {
    /// Create `path` if needed. Returns `true` when the directory was created
    /// by this call.
    fn ensure_directory(&self, path: &Path) -> Result<bool, SinkError>;

    /// Persist `content` at `destination`, replacing anything already there
    fn write(&self, destination: &Path, content: &[u8]) -> Result<(), SinkError>;
}

/// Writes documents as plain files
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl FsSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for FsSink {
    fn ensure_directory(&self, path: &Path) -> Result<bool, SinkError> {
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(path).map_err(|e| SinkError::DirectoryFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(true)
    }

    fn write(&self, destination: &Path, content: &[u8]) -> Result<(), SinkError> {
        fs::write(destination, content).map_err(|e| SinkError::WriteFailed {
            destination: destination.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
