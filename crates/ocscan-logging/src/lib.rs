//! # ocscan-logging
//!
//! Logging for the ocscan session scanner.
//!
//! Two channels are provided:
//!
//! - `tracing` diagnostics, initialised once by [`init_tracing`] and filtered
//!   through `RUST_LOG`
//! - the verbose scan channel, driven by [`Logger`] and [`ScanEvent`]
//!
//! ## Log Formats
//!
//! - `Pretty` - Human-readable colored output
//! - `JSON` - Structured JSON lines
//! - `Compact` - Minimal text output
//!
//! Everything is written to stderr. Stdout is reserved for scan results.

mod events;

pub use events::{LogFormat, Logger, ScanEvent};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
