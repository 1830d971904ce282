//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use notions_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "command_log": config.command_log_path(),
                    "log_file": config.log_file_path(),
                    "indent": config.indent,
                    "document_name": config.document_name
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:      {}", config.data_dir.display());
            println!(
                "  command_log:   {}",
                config
                    .command_log
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| format!("(default) {}", config.command_log_path().display()))
            );
            println!(
                "  log_file:      {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  indent:        {}", config.indent);
            println!("  document_name: {}", config.document_name);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    mut config: Config,
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one `key = value` setting
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "command_log" => {
            config.command_log = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        "indent" => {
            config.indent = value
                .parse()
                .context("Invalid value for indent. Use a whole number of spaces.")?;
        }
        "document_name" => {
            if value.is_empty() {
                bail!("document_name cannot be empty");
            }
            config.document_name = value.to_string();
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, command_log, log_file, indent, document_name",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "indent", "2").unwrap();
        assert_eq!(config.indent, 2);

        apply(&mut config, "command_log", "/tmp/audit.jsonl").unwrap();
        assert_eq!(config.command_log, Some(PathBuf::from("/tmp/audit.jsonl")));
        apply(&mut config, "command_log", "none").unwrap();
        assert!(config.command_log.is_none());

        apply(&mut config, "document_name", "plans").unwrap();
        assert_eq!(config.document_name, "plans");
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "indent", "wide").is_err());
        assert!(apply(&mut config, "document_name", "").is_err());

        let err = apply(&mut config, "sync_url", "ws://x").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }
}
