//! # ocscan-core
//!
//! Finds write tool calls whose content contains a marker string and
//! addresses each hit with a `jq` path.
//!
//! ## Key Types
//!
//! - [`QueryPath`] / [`PathBuilder`] - Locations inside a JSON document
//! - [`find_matches`] / [`SelectionRule`] - Selective tree search
//! - [`WriteToolRule`] - Selects `messages[].parts[]` write tool content
//! - [`SessionScanner`] - Scans one decoded session document
//! - [`BatchDriver`] - Scans every session a source lists
//! - [`Exporter`] - Saves matching sessions through a sink

mod batch;
mod error;
mod export;
mod matcher;
mod path;
mod report;
mod scanner;
mod selector;

pub use batch::BatchDriver;
pub use error::ScanError;
pub use export::{ExportSummary, Exporter};
pub use matcher::{find_matches, EveryString, Match, SelectionRule};
pub use path::{PathBuilder, QueryPath, Step};
pub use report::{BatchResult, ReportedMatch, SessionReport};
pub use scanner::{format_created, ScanConfig, SessionScanner};
pub use selector::WriteToolRule;
