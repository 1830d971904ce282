//! Import command handler

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use notions_core::{import, Config};

use crate::output::Output;

/// Import an outline file and print the resulting document
pub fn run(
    config: &Config,
    file: &Path,
    name: Option<String>,
    record: bool,
    output: &Output,
) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open outline: {:?}", file))?,
    );

    let name = name.unwrap_or_else(|| config.document_name.clone());
    let session = super::open_session(config, &name, record)?;
    let summary = import::import(&session, reader)
        .with_context(|| format!("Failed to import {:?}", file))?;

    output.message(&format!(
        "Imported {} item(s) from {}",
        summary.nodes,
        file.display()
    ));
    output.print_document(&session, config.indent)
}
