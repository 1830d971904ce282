//! Command handlers

pub mod config;
pub mod demo;
pub mod import;
pub mod log;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use notions_core::{Actor, AllowAll, CommandLog, Config, JsonLinesLog, Registry, Session};

/// Account used for every CLI session
const CLI_ACCOUNT: &str = "owner";

/// Create a fresh document and log into it
///
/// With `record` set, every mutation is appended to the configured
/// JSON-lines command log.
pub fn open_session(config: &Config, name: &str, record: bool) -> Result<Session> {
    let log: Option<Arc<dyn CommandLog>> = if record {
        config.ensure_data_dir()?;
        let path = config.command_log_path();
        let log = JsonLinesLog::open(&path)
            .with_context(|| format!("Failed to open command log: {:?}", path))?;
        info!("Recording commands to {:?}", path);
        Some(Arc::new(log))
    } else {
        None
    };

    let registry = Registry::new();
    let document = registry
        .create_document(name, Some(Arc::new(AllowAll)), log)
        .context("Failed to create document")?;
    let session = document
        .login(Actor::new(CLI_ACCOUNT))
        .context("Failed to log in")?;
    Ok(session)
}
