use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors raised by a session source
#[derive(Error, Debug)]
pub enum SourceError {
    /// The session listing could not be obtained. Fatal for a run.
    #[error("Session source unavailable: {0}")]
    Unavailable(String),

    /// A single session could not be exported
    #[error("Failed to fetch session {id}: {reason}")]
    FetchFailed { id: String, reason: String },
}

/// Creation/update times as reported by the session tool (epoch milliseconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionTime {
    pub created: Option<i64>,
    pub updated: Option<i64>,
}

impl SessionTime {
    fn from_value(value: &Value) -> Option<Self> {
        let time = value.as_object()?;
        Some(Self {
            created: time.get("created").and_then(epoch_millis),
            updated: time.get("updated").and_then(epoch_millis),
        })
    }
}

/// One entry of the session listing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionListing {
    pub id: Option<String>,
    pub title: Option<String>,
    pub directory: Option<String>,
    pub time: Option<SessionTime>,
}

impl SessionListing {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Read one listing entry field by field. Fields with an unexpected type
    /// are treated as missing; an entry that is not an object yields no id.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: text("id").filter(|id| !id.is_empty()),
            title: text("title"),
            directory: text("directory"),
            time: value.get("time").and_then(SessionTime::from_value),
        }
    }

    pub fn created_ms(&self) -> Option<i64> {
        self.time.as_ref().and_then(|t| t.created)
    }
}

fn epoch_millis(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|ms| ms as i64))
}

/// Where sessions come from
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Human-readable name of the source (e.g., "OpenCode")
    fn name(&self) -> &str;

    /// List every session, in the order the tool reports them
    async fn list_sessions(&self) -> Result<Vec<SessionListing>, SourceError>;

    /// Fetch the raw JSON text of one session
    async fn fetch_session(&self, id: &str) -> Result<String, SourceError>;

    /// Check if the backing tool is available on the system
    async fn is_available(&self) -> bool;

    /// Get the path to the backing binary
    fn binary_path(&self) -> &Path;
}
