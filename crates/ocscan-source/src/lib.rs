//! # ocscan-source
//!
//! The collaborators ocscan talks to outside of its own process.
//!
//! ## Key Types
//!
//! - [`SessionSource`] - Lists sessions and fetches raw session documents
//! - [`OpenCodeSource`] - [`SessionSource`] backed by the `opencode` CLI
//! - [`Sink`] - Persists exported documents
//! - [`FsSink`] - [`Sink`] writing plain files

mod opencode;
mod output;
mod sink;
mod spawner;
mod traits;

pub use opencode::{strip_export_banner, OpenCodeSource};
pub use output::ProcessOutput;
pub use sink::{FsSink, Sink, SinkError};
pub use spawner::{ProcessError, ProcessSpawner};
pub use traits::{SessionListing, SessionSource, SessionTime, SourceError};
