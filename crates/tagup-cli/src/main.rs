//! tagup CLI
//!
//! Command-line and terminal interface for tagup - live daily tag-up updates.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tagup_core::Config;

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "tagup")]
#[command(about = "tagup - Live daily tag-up updates for your team")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the live TUI (default)
    Tui,
    /// Print the current list of updates
    #[command(alias = "ls")]
    List,
    /// Post a new update
    #[command(alias = "add")]
    Post {
        /// Your name (defaults to the configured author)
        #[arg(short, long)]
        name: Option<String>,
        /// Optional site or project label
        #[arg(short, long)]
        site: Option<String>,
        /// Update text
        text: Vec<String>,
    },
    /// Print the list again whenever the table changes
    Watch,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (supabase_url, supabase_anon, table, schema, realtime_enabled, author, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need a connection
    if let Some(Commands::Config { command }) = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match cli.command {
        None | Some(Commands::Tui) => tui::run(config).await,
        Some(Commands::List) => {
            init_cli_logging();
            commands::list::list(&config, &output).await
        }
        Some(Commands::Post { name, site, text }) => {
            init_cli_logging();
            commands::post::post(&config, name, site, text, &output).await
        }
        Some(Commands::Watch) => {
            init_cli_logging();
            commands::watch::watch(&config, &output).await
        }
        Some(Commands::Config { .. }) => unreachable!(), // Handled above
    }
}

/// Initialize stderr logging for one-shot commands
///
/// Level comes from TAGUP_LOG (default: warn).
fn init_cli_logging() {
    let env_filter = EnvFilter::try_from_env("TAGUP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
