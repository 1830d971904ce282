//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/notions/config.toml)
//! 3. Environment variables (NOTIONS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "NOTIONS";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (command log, debug log)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// JSON-lines command log (defaults to {data_dir}/commands.jsonl)
    #[serde(default)]
    pub command_log: Option<PathBuf>,

    /// Debug log file used when NOTIONS_LOG is set
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Spaces per outline level when printing
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Name given to new documents
    #[serde(default = "default_document_name")]
    pub document_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            command_log: None,
            log_file: None,
            indent: default_indent(),
            document_name: default_document_name(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (NOTIONS_DATA_DIR, NOTIONS_COMMAND_LOG, NOTIONS_INDENT)
    /// 2. Config file (~/.config/notions/config.toml or NOTIONS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
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

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string clears it
        if let Ok(val) = std::env::var(format!("{}_COMMAND_LOG", ENV_PREFIX)) {
            self.command_log = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // Unparseable values are ignored
        if let Ok(val) = std::env::var(format!("{}_INDENT", ENV_PREFIX)) {
            if let Ok(indent) = val.trim().parse() {
                self.indent = indent;
            }
        }
    }

    /// Ensure data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
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
    /// Can be overridden with NOTIONS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notions")
            .join("config.toml")
    }

    /// Get the path to the JSON-lines command log
    pub fn command_log_path(&self) -> PathBuf {
        self.command_log
            .clone()
            .unwrap_or_else(|| self.data_dir.join("commands.jsonl"))
    }

    /// Get the path to the debug log
    pub fn log_file_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notions")
}

fn default_indent() -> usize {
    4
}

fn default_document_name() -> String {
    "notions".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &["NOTIONS_DATA_DIR", "NOTIONS_COMMAND_LOG", "NOTIONS_INDENT"];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.command_log.is_none());
        assert_eq!(config.indent, 4);
        assert_eq!(config.document_name, "notions");
        assert!(config.data_dir.ends_with("notions"));
    }

    #[test]
    fn test_file_paths() {
        let mut config = Config::default();
        assert!(config.command_log_path().ends_with("commands.jsonl"));
        assert!(config.log_file_path().ends_with("debug.log"));

        config.command_log = Some(PathBuf::from("/var/log/audit.jsonl"));
        assert_eq!(
            config.command_log_path(),
            PathBuf::from("/var/log/audit.jsonl")
        );
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("NOTIONS_DATA_DIR", "/tmp/notions-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/notions-test"));
    }

    #[test]
    fn test_env_override_command_log() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("NOTIONS_COMMAND_LOG", "/tmp/commands.jsonl");
        config.apply_env_overrides();
        assert_eq!(
            config.command_log,
            Some(PathBuf::from("/tmp/commands.jsonl"))
        );

        env::set_var("NOTIONS_COMMAND_LOG", "");
        config.apply_env_overrides();
        assert!(config.command_log.is_none());
    }

    #[test]
    fn test_env_override_indent() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("NOTIONS_INDENT", "2");
        config.apply_env_overrides();
        assert_eq!(config.indent, 2);

        env::set_var("NOTIONS_INDENT", "wide");
        config.apply_env_overrides();
        assert_eq!(config.indent, 2);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            command_log = "/custom/audit.jsonl"
            indent = 3
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(
            config.command_log,
            Some(PathBuf::from("/custom/audit.jsonl"))
        );
        assert_eq!(config.indent, 3);
        assert_eq!(config.document_name, "notions");
    }

    #[test]
    fn test_save_and_load_path() {
        let _guard = EnvGuard::new(ENV_VARS);
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: dir.path().to_path_buf(),
            command_log: None,
            log_file: Some(dir.path().join("trace.log")),
            indent: 2,
            document_name: "plans".to_string(),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.log_file, config.log_file);
        assert_eq!(loaded.indent, 2);
        assert_eq!(loaded.document_name, "plans");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.command_log.is_none());
        assert_eq!(config.indent, 4);
    }
}
