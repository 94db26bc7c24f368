//! Application configuration
//!
//! Configuration is loaded once at startup from:
//! 1. Default values
//! 2. Config file (~/.config/tagup/config.toml)
//! 3. Environment variables (TAGUP_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "TAGUP";

/// Default table holding the updates
pub const DEFAULT_TABLE: &str = "daily_updates";

/// Default database schema
pub const DEFAULT_SCHEMA: &str = "public";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Supabase project URL (e.g. https://abcd.supabase.co)
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase anon key
    #[serde(default)]
    pub supabase_anon: Option<String>,

    /// Table holding the updates
    #[serde(default = "default_table")]
    pub table: String,

    /// Schema the table lives in
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Whether to subscribe to change notifications
    #[serde(default = "default_true")]
    pub realtime_enabled: bool,

    /// Name used to prefill the author field in the TUI
    #[serde(default)]
    pub author: Option<String>,

    /// Log file for the TUI (defaults to {data_local_dir}/tagup/debug.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon: None,
            table: default_table(),
            schema: default_schema(),
            realtime_enabled: true,
            author: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TAGUP_SUPABASE_URL, TAGUP_SUPABASE_ANON, ...)
    /// 2. Config file (~/.config/tagup/config.toml or TAGUP_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_SUPABASE_URL", ENV_PREFIX)) {
            self.supabase_url = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_SUPABASE_ANON", ENV_PREFIX)) {
            self.supabase_anon = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_TABLE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.table = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_REALTIME_ENABLED", ENV_PREFIX)) {
            self.realtime_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_AUTHOR", ENV_PREFIX)) {
            self.author = non_empty(val);
        }
    }

    /// Whether both connection values are present and non-empty
    pub fn has_credentials(&self) -> bool {
        is_set(&self.supabase_url) && is_set(&self.supabase_anon)
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TAGUP_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tagup")
            .join("config.toml")
    }

    /// Get the TUI log file path
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tagup")
                .join("debug.log")
        })
    }
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_true() -> bool {
    true
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
