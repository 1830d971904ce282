//! Log command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use notions_core::command::read_records;
use notions_core::Config;

use crate::output::Output;

/// List the records of a JSON-lines command log
///
/// Uses the configured command log when no file is given.
pub fn show(config: &Config, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let path = file.unwrap_or_else(|| config.command_log_path());
    if !path.exists() {
        output.message(&format!("No command log at {}", path.display()));
        return output.print_records(&[]);
    }

    let records =
        read_records(&path).with_context(|| format!("Failed to read command log: {:?}", path))?;
    output.print_records(&records)
}
