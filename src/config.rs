//! Configuration management for sqlfan.
//!
//! Handles loading run defaults from a TOML file. Command-line flags always
//! take precedence over the file, and the file over built-in defaults.

use crate::error::{Result, SqlfanError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest verbosity level with its own behavior.
pub const MAX_VERBOSITY: u8 = 3;

/// Main configuration structure for sqlfan.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Run defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Credential sources.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Defaults for flags that were not given on the command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Defaults {
    /// Run endpoints in parallel.
    #[serde(default = "default_true")]
    pub concurrent: bool,

    /// Draw bordered tables.
    #[serde(default)]
    pub table: bool,

    /// Verbosity level, 0 to 3.
    #[serde(default)]
    pub verbose: u8,

    /// Color endpoint output.
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            concurrent: true,
            table: false,
            verbose: 0,
            color: true,
        }
    }
}

/// Where credentials for incomplete DSNs come from.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Path of the MySQL option file. `~/` is expanded.
    #[serde(default)]
    pub my_cnf: Option<PathBuf>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlfan")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| SqlfanError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            SqlfanError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;

        if config.defaults.verbose > MAX_VERBOSITY {
            return Err(SqlfanError::config(format!(
                "Configuration error in {}:\n  verbose must be between 0 and {MAX_VERBOSITY}",
                path.display()
            )));
        }

        Ok(config)
    }
}

/// How much detail is captured and shown.
///
/// - 1: separators between results
/// - 2: row counts and `Query OK`
/// - 3: execution times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Verbosity(u8);

impl Verbosity {
    /// Creates a verbosity level, capped at the highest meaningful level.
    pub fn new(level: u8) -> Self {
        Self(level.min(MAX_VERBOSITY))
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn shows_separators(self) -> bool {
        self.0 >= 1
    }

    pub fn captures_row_count(self) -> bool {
        self.0 >= 2
    }

    pub fn captures_timing(self) -> bool {
        self.0 >= 3
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub concurrent: bool,
    pub table: bool,
    pub verbosity: Verbosity,
    pub color: bool,
    pub my_cnf: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Settings {
    /// Settings taken from the config file alone.
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrent: config.defaults.concurrent,
            table: config.defaults.table,
            verbosity: Verbosity::new(config.defaults.verbose),
            color: config.defaults.color,
            my_cnf: config.credentials.my_cnf.clone(),
        }
    }
}
