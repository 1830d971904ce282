//! Demo command handler

use anyhow::Result;

use notions_core::Config;

use crate::output::Output;

/// Build a small outline through the session API and print it
pub fn run(config: &Config, record: bool, output: &Output) -> Result<()> {
    let session = super::open_session(config, "demo", record)?;

    let root = session.root()?;
    let first = session.item_append(&root, "line one")?;
    for text in ["number 2", "third time"] {
        let root = session.root()?;
        session.item_append(&root, text)?;
    }
    session.item_append(&first, "first child")?;

    output.print_document(&session, config.indent)
}
