//! Configuration file support for ocscan.
//!
//! Looks for `ocscan.toml` in the working directory, then
//! `<config dir>/ocscan/config.toml`. Command-line flags override file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ocscan_core::ScanConfig;

/// The project config file name
pub const CONFIG_FILE_NAME: &str = "ocscan.toml";

/// Default export directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "found";

/// Settings loaded from a config file
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Marker searched for in written content
    pub pattern: Option<String>,
    /// Tool name identifying write calls
    pub tool: Option<String>,
    /// Accepted values of a part's `type` field
    pub tool_types: Option<Vec<String>>,
    /// Where `--export` saves sessions
    pub output_dir: Option<PathBuf>,
    /// Path to the opencode binary
    pub opencode_bin: Option<PathBuf>,
    /// Per-invocation limit for opencode calls
    pub fetch_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Load a config file. Parse errors are hard errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Find and load the config file.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if a file was found and parses successfully
    /// - `Ok(None)` if no file exists
    /// - `Err(...)` if an explicit path is missing or any file fails to parse
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Result<Option<Self>> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }

        let local = working_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load(&local).map(Some);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let global = config_dir.join("ocscan").join("config.toml");
            if global.exists() {
                return Self::load(&global).map(Some);
            }
        }

        Ok(None)
    }
}

/// Values given on the command line
#[derive(Debug, Default)]
pub struct Overrides {
    pub pattern: Option<String>,
    pub tool: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub opencode_bin: Option<PathBuf>,
    pub fetch_timeout_secs: Option<u64>,
}

/// Effective settings for a run
#[derive(Debug, PartialEq)]
pub struct Settings {
    pub scan: ScanConfig,
    pub output_dir: PathBuf,
    pub opencode_bin: PathBuf,
    pub fetch_timeout: Option<Duration>,
}

impl Settings {
    /// Priority: command line > config file > defaults
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
        let defaults = ScanConfig::default();

        let scan = ScanConfig {
            pattern: overrides
                .pattern
                .or(file.pattern)
                .unwrap_or(defaults.pattern),
            tool: overrides.tool.or(file.tool).unwrap_or(defaults.tool),
            tool_types: file.tool_types.unwrap_or(defaults.tool_types),
        };

        let fetch_timeout = overrides
            .fetch_timeout_secs
            .or(file.fetch_timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            scan,
            output_dir: overrides
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            opencode_bin: overrides
                .opencode_bin
                .or(file.opencode_bin)
                .unwrap_or_else(|| PathBuf::from("opencode")),
            fetch_timeout,
        }
    }
}
