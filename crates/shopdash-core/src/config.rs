//! Configuration management for shopdash.
//!
//! Loads configuration from ${SHOPDASH_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured API base URL.
pub const API_URL_ENV: &str = "SHOPDASH_API_URL";

/// Table style used when rendering pages.
///
/// Both styles go through the same renderer; only the border preset differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// ASCII borders, safe for any terminal or pipe
    Plain,
    /// Rounded unicode borders
    #[default]
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "dark" | "glass" => Ok(Self::Dark),
            other => Err(format!("Unknown theme: {other} (expected plain or dark)")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `SHOPDASH_LOG` is not set
    pub level: String,
    /// Also write logs to a daily-rotated file under the home directory
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: false,
        }
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for shopdash configuration and data files.
    //!
    //! SHOPDASH_HOME resolution order:
    //! 1. SHOPDASH_HOME environment variable (if set)
    //! 2. ~/.config/shopdash (default)
    //! 3. ./.shopdash when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the shopdash home directory.
    pub fn shopdash_home() -> PathBuf {
        if let Ok(home) = std::env::var("SHOPDASH_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".shopdash"),
            |h| h.join(".config").join("shopdash"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        shopdash_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        shopdash_home().join("session.json")
    }

    /// Returns the directory for rotated log files.
    pub fn logs_dir() -> PathBuf {
        shopdash_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the analytics API (e.g. `http://localhost:8080/api`)
    pub api_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub theme: Theme,
    /// Rows requested for the dashboard's top customers list
    pub top_customers_limit: u32,
    /// Rows requested for the products page's top products list
    pub top_products_limit: u32,
    pub logging: LoggingConfig,
}

impl Config {
    pub const DEFAULT_API_URL: &'static str = "http://localhost:8080/api";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_TOP_CUSTOMERS: u32 = 5;
    pub const DEFAULT_TOP_PRODUCTS: u32 = 10;

    /// Loads configuration from the default path.
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    pub fn effective_api_url(&self) -> Result<String> {
        resolve_api_url(std::env::var(API_URL_ENV).ok().as_deref(), &self.api_url)
    }

    /// Returns the request timeout, or None when disabled (0).
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Serializes the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config to TOML")
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            theme: Theme::default(),
            top_customers_limit: Self::DEFAULT_TOP_CUSTOMERS,
            top_products_limit: Self::DEFAULT_TOP_PRODUCTS,
            logging: LoggingConfig::default(),
        }
    }
}

/// Picks the first non-empty URL among the env value and the config value,
/// falling back to the default. The chosen URL must parse.
fn resolve_api_url(env_value: Option<&str>, config_value: &str) -> Result<String> {
    let candidate = [env_value, Some(config_value)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(Config::DEFAULT_API_URL);

    url::Url::parse(candidate).with_context(|| format!("Invalid API base URL: {candidate}"))?;
    Ok(candidate.trim_end_matches('/').to_string())
}
