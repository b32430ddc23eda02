//! Configuration loading and merging

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from config.toml)
///
/// Every key is optional; command line flags override the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// ASC trace to convert
    pub input: Option<PathBuf>,
    /// Output log file
    pub output: Option<PathBuf>,
    /// DBC files providing message names
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,
    /// Write trace timestamps unmodified
    #[serde(default)]
    pub raw_time: bool,
    /// Verbosity level (0-3)
    #[serde(default)]
    pub verbose: u8,
}

/// Values the converter run needs, after merging flags and config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSettings {
    /// `None` reads stdin
    pub input: Option<PathBuf>,
    /// `None` writes stdout
    pub output: Option<PathBuf>,
    pub dbc_files: Vec<PathBuf>,
    pub raw_time: bool,
    pub verbose: u8,
    pub quiet: bool,
}

impl RunSettings {
    /// Fill everything the command line left open from the config file
    pub fn merge(flags: RunSettings, file: AppConfig) -> RunSettings {
        RunSettings {
            input: flags.input.or(file.input),
            output: flags.output.or(file.output),
            dbc_files: if flags.dbc_files.is_empty() {
                file.dbc_files
            } else {
                flags.dbc_files
            },
            raw_time: flags.raw_time || file.raw_time,
            verbose: flags.verbose.max(file.verbose),
            quiet: flags.quiet,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
