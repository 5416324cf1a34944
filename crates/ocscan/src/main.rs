mod config;
mod output;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;

use ocscan_core::{BatchDriver, Exporter, SessionScanner};
use ocscan_logging::{init_tracing, LogFormat, Logger};
use ocscan_source::{FsSink, OpenCodeSource, SessionSource};

use crate::config::{FileConfig, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "ocscan",
    about = "Find opencode sessions with write tools containing </content>",
    version,
    author
)]
struct Cli {
    /// Enable verbose output to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Export matching sessions to the output directory
    #[arg(short, long)]
    export: bool,

    /// Directory for exported sessions (default: ./found)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Marker to search for in written content (default: </content>)
    #[arg(short, long)]
    pattern: Option<String>,

    /// Tool name that identifies write calls (default: write)
    #[arg(long)]
    tool: Option<String>,

    /// Path to the opencode binary
    #[arg(long)]
    opencode_bin: Option<PathBuf>,

    /// Timeout in seconds for each opencode invocation (0 = no limit)
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: ./ocscan.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON instead of tab-separated lines
    #[arg(long, conflicts_with = "export")]
    json: bool,

    /// Verbose output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Diagnostic log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Also append every scan event as JSON lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    init_tracing(&cli.log_level, log_format);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let file_config = FileConfig::discover(cli.config.as_deref(), &working_dir)?.unwrap_or_default();
    let settings = Settings::resolve(
        Overrides {
            pattern: cli.pattern.clone(),
            tool: cli.tool.clone(),
            output_dir: cli.output_dir.clone(),
            opencode_bin: cli.opencode_bin.clone(),
            fetch_timeout_secs: cli.timeout,
        },
        file_config,
    );

    let logger = match cli.log_file {
        Some(ref path) => Logger::with_file(log_format, cli.verbose, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format, cli.verbose),
    };
    let logger = Arc::new(logger);

    let mut source = OpenCodeSource::with_binary_path(settings.opencode_bin.clone());
    if let Some(timeout) = settings.fetch_timeout {
        source = source.with_timeout(timeout);
    }

    let driver = BatchDriver::new(&source, SessionScanner::new(settings.scan.clone()), logger.clone());

    // Handle Ctrl+C gracefully
    let interrupt_handle = driver.interrupt_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted. Finishing current session...");
        interrupt_handle.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let result = match driver.run().await {
        Ok(result) => result,
        Err(e) => {
            if !source.is_available().await {
                anyhow::bail!(
                    "{} is not available at '{}'. Make sure it's installed and in PATH.",
                    source.name(),
                    source.binary_path().display()
                );
            }
            return Err(e).context("Failed to list sessions");
        }
    };

    if cli.json {
        return output::print_json(&result);
    }

    if result.reports.is_empty() {
        if !cli.verbose {
            eprintln!("{}", "No matching sessions found.".dimmed());
        }
        return Ok(());
    }

    if cli.export {
        let sink = FsSink::new();
        let exporter = Exporter::new(&source, &sink, logger.clone());
        exporter
            .export(&result.reports, &settings.output_dir)
            .await
            .context("Export failed")?;
    } else {
        output::print_tsv(&result.reports).context("Failed to write results")?;
    }

    Ok(())
}
