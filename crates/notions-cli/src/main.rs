//! Notions CLI
//!
//! Command-line interface for Notions - outline documents with concurrent,
//! versioned editing.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use notions_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "nb")]
#[command(about = "Notions - outline documents with versioned, concurrent editing")]
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
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a plain-text outline and print it
    Import {
        /// Outline file to read
        file: PathBuf,
        /// Document name (defaults to config document_name)
        #[arg(short, long)]
        name: Option<String>,
        /// Append every command to the command log
        #[arg(short, long)]
        record: bool,
    },
    /// Build a small sample outline and print it
    Demo {
        /// Append every command to the command log
        #[arg(short, long)]
        record: bool,
    },
    /// List recorded commands
    Log {
        /// Command log file (defaults to the configured one)
        file: Option<PathBuf>,
    },
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
        /// Configuration key (data_dir, command_log, log_file, indent, document_name)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let config_path = cli.config.as_ref();
    let config = match config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_logging(&config);

    match cli.command {
        Commands::Import { file, name, record } => {
            commands::import::run(&config, &file, name, record, &output)
        }
        Commands::Demo { record } => commands::demo::run(&config, record, &output),
        Commands::Log { file } => commands::log::show(&config, file, &output),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(&config, config_path, &output)
            }
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(config, key, value, config_path, &output)
            }
        },
    }
}

/// Initialize logging
///
/// Only initializes if NOTIONS_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("NOTIONS_LOG") else {
        return;
    };

    if let Err(e) = config.ensure_data_dir() {
        eprintln!("Warning: {}", e);
        return;
    }

    let log_path = config.log_file_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "notions_core={},notions_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
