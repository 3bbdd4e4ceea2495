//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/reelpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/reelpulse/` (~/.config/reelpulse/)
//! - Data: `$XDG_DATA_HOME/reelpulse/` (~/.local/share/reelpulse/)
//! - State/Logs: `$XDG_STATE_HOME/reelpulse/` (~/.local/state/reelpulse/)
//!
//! Only the binaries read the environment. The library receives a [`Config`]
//! (or one of its sections) explicitly.

use crate::analytics::CounterSemantics;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// XDG base directories used by reelpulse, with their fallbacks under `$HOME`.
const XDG_DIRS: [(&str, &str); 3] = [
    ("XDG_CONFIG_HOME", ".config"),
    ("XDG_DATA_HOME", ".local/share"),
    ("XDG_STATE_HOME", ".local/state"),
];

/// `$var`, or its fallback under the home directory
fn xdg_dir(var: &str) -> PathBuf {
    if let Ok(dir) = std::env::var(var) {
        return PathBuf::from(dir);
    }
    let fallback = XDG_DIRS
        .iter()
        .find(|(name, _)| *name == var)
        .map(|(_, fallback)| *fallback)
        .unwrap_or(".");
    home_dir().join(fallback)
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Dump import configuration
    #[serde(default)]
    pub import: ImportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Window used when a command does not pass `--days`
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    /// Whether stored counters are cumulative-to-date or per-day deltas
    #[serde(default)]
    pub counter_semantics: CounterSemantics,

    /// Keep only the N most viewed videos (all when unset)
    #[serde(default)]
    pub top_videos: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_window_days: default_window_days(),
            counter_semantics: CounterSemantics::default(),
            top_videos: None,
        }
    }
}

fn default_window_days() -> u32 {
    30
}

/// Dump import configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Records written per transaction (and per checkpoint)
    #[serde(default = "default_import_batch_size")]
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_import_batch_size(),
        }
    }
}

fn default_import_batch_size() -> usize {
    500
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.analytics.default_window_days == 0 {
            return Err(Error::Config(
                "analytics.default_window_days must be at least 1".to_string(),
            ));
        }
        if self.analytics.top_videos == Some(0) {
            return Err(Error::Config(
                "analytics.top_videos must be at least 1 when set".to_string(),
            ));
        }
        if self.import.batch_size == 0 || self.import.batch_size > 10_000 {
            return Err(Error::Config(
                "import.batch_size must be between 1 and 10000".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/reelpulse/config.toml` (~/.config/reelpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_dir("XDG_CONFIG_HOME").join("reelpulse").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/reelpulse/` (~/.local/share/reelpulse/)
    pub fn data_dir() -> PathBuf {
        xdg_dir("XDG_DATA_HOME").join("reelpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/reelpulse/` (~/.local/state/reelpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_dir("XDG_STATE_HOME").join("reelpulse")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/reelpulse/data.db` (~/.local/share/reelpulse/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/reelpulse/reelpulse.log` (~/.local/state/reelpulse/reelpulse.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("reelpulse.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// Called by the CLI before anything else resolves paths.
    pub fn ensure_xdg_env() {
        let home = home_dir();
        for (var, fallback) in XDG_DIRS {
            if std::env::var_os(var).is_none() {
                std::env::set_var(var, home.join(fallback));
            }
        }
    }
}
