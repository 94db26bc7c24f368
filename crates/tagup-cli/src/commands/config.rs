//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use tagup_core::Config;

use crate::output::{Output, OutputFormat};

/// Valid keys for `config set`
const KEYS: &str = "supabase_url, supabase_anon, table, schema, realtime_enabled, author, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "supabase_url": config.supabase_url,
                    "supabase_anon": config.supabase_anon.as_deref().map(mask_key),
                    "table": config.table,
                    "schema": config.schema,
                    "realtime_enabled": config.realtime_enabled,
                    "author": config.author,
                    "log_file": config.log_file,
                    "configured": config.has_credentials()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.has_credentials());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!(
                "  supabase_url:     {}",
                config.supabase_url.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  supabase_anon:    {}",
                config
                    .supabase_anon
                    .as_deref()
                    .map(mask_key)
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  table:            {}", config.table);
            println!("  schema:           {}", config.schema);
            println!("  realtime_enabled: {}", config.realtime_enabled);
            println!(
                "  author:           {}",
                config.author.as_deref().unwrap_or("(not set)")
            );
            println!("  log_file:         {}", config.log_path().display());
            println!();
            if !config.has_credentials() {
                println!("Live data features will not work until supabase_url and supabase_anon are set.");
                println!();
            }
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "supabase_anon" {
        mask_key(&value)
    } else {
        value
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

/// Apply one `key = value` change
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "supabase_url" => config.supabase_url = optional(value),
        "supabase_anon" => config.supabase_anon = optional(value),
        "table" => {
            if value.is_empty() {
                bail!("table cannot be empty");
            }
            config.table = value.to_string();
        }
        "schema" => {
            if value.is_empty() {
                bail!("schema cannot be empty");
            }
            config.schema = value.to_string();
        }
        "realtime_enabled" => {
            config.realtime_enabled = value
                .parse()
                .context("Invalid value for realtime_enabled. Use 'true' or 'false'.")?;
        }
        "author" => config.author = optional(value),
        "log_file" => config.log_file = optional(value).map(PathBuf::from),
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Show only the first few characters of a key
fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    if key.chars().count() <= 6 {
        "******".to_string()
    } else {
        format!("{}…", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "supabase_url", "https://abcd.supabase.co").unwrap();
        apply(&mut config, "supabase_anon", "eyJhbGciOi").unwrap();
        apply(&mut config, "realtime_enabled", "false").unwrap();
        apply(&mut config, "author", "Ann").unwrap();

        assert!(config.has_credentials());
        assert!(!config.realtime_enabled);
        assert_eq!(config.author.as_deref(), Some("Ann"));

        apply(&mut config, "author", "none").unwrap();
        assert!(config.author.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "realtime_enabled", "maybe").is_err());
        assert!(apply(&mut config, "table", "").is_err());
        assert!(apply(&mut config, "color", "blue").is_err());
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set("schema".to_string(), "team".to_string(), Some(&path), &output).unwrap();
        set("log_file".to_string(), "/tmp/tagup.log".to_string(), Some(&path), &output).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("schema = \"team\""));
        assert!(content.contains("/tmp/tagup.log"));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("eyJhbGciOiJIUzI1NiJ9"), "eyJhbG…");
        assert_eq!(mask_key("short"), "******");
    }
}
