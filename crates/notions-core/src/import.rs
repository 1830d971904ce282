//! Plain-text outline import
//!
//! Reads a line-oriented outline:
//!
//! ```text
//! Title
//! 1. alpha
//!     1. beta
//! 2. gamma
//! ```
//!
//! The first non-empty line becomes the document title. Each later line has
//! its leading whitespace measured and an optional `N. ` or `a. ` marker
//! stripped. A line indented deeper than the one before it nests under the
//! previous item; anything else is appended to the root. All nodes are
//! created through [`Session::item_append`].

use std::io::BufRead;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::node::NodeId;
use crate::session::Session;

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+|[a-zA-Z])\.\s").expect("numbered pattern is valid"));

/// What an import produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub title: Option<String>,
    pub nodes: usize,
}

/// Strip a leading `N. ` or `a. ` list marker
pub fn strip_number(line: &str) -> &str {
    match NUMBERED.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Split a line into its indentation width and the rest
fn split_indent(line: &str) -> (usize, &str) {
    let rest = line.trim_start();
    let indent = line[..line.len() - rest.len()].chars().count();
    (indent, rest)
}

/// Import an outline into the session's document
pub fn import(session: &Session, reader: impl BufRead) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    let mut last: Option<(usize, NodeId)> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", i + 1))?;

        if summary.title.is_none() {
            let title = line.trim();
            if !title.is_empty() {
                session
                    .set_title(title)
                    .context("Failed to set document title")?;
                summary.title = Some(title.to_string());
            }
            continue;
        }

        let (indent, rest) = split_indent(&line);
        let text = strip_number(rest);
        if text.is_empty() {
            continue;
        }

        let parent = match last {
            Some((last_indent, last_id)) if indent > last_indent => last_id,
            _ => NodeId::ROOT,
        };
        let parent = session
            .get_node(parent)
            .with_context(|| format!("Failed to fetch parent for line {}", i + 1))?;
        let node = session
            .item_append(&parent, text)
            .with_context(|| format!("Failed to append line {}", i + 1))?;

        debug!(node = %node.id, parent = %parent.id, indent, "Imported line");
        summary.nodes += 1;
        last = Some((indent, node.id));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Action, ActionGrants, Actor};
    use crate::document::{Document, DocumentId};
    use std::io::Cursor;
    use std::sync::Arc;

    fn texts(session: &Session, id: NodeId) -> Vec<String> {
        session
            .get_node(id)
            .unwrap()
            .children
            .iter()
            .map(|c| session.get_node(*c).unwrap().text)
            .collect()
    }

    #[test]
    fn test_numbered_pattern() {
        assert_eq!(strip_number("1. hey"), "hey");
        assert_eq!(strip_number("b. you"), "you");
        assert_eq!(strip_number("12. twelve"), "twelve");
        assert_eq!(strip_number("not you"), "not you");
        assert_eq!(strip_number("ab. two letters"), "ab. two letters");
    }

    #[test]
    fn test_import_nesting() {
        let doc = Document::new("todo");
        let s = doc.login(Actor::new("owner")).unwrap();
        let input = "Title\n1. alpha\n    1. beta\n2. gamma\n";

        let summary = import(&s, Cursor::new(input)).unwrap();
        assert_eq!(summary.title.as_deref(), Some("Title"));
        assert_eq!(summary.nodes, 3);

        assert_eq!(doc.title(), "Title");
        assert_eq!(texts(&s, NodeId::ROOT), vec!["alpha", "gamma"]);
        assert_eq!(texts(&s, NodeId::new(2)), vec!["beta"]);
    }

    #[test]
    fn test_import_skips_blank_lines() {
        let doc = Document::new("todo");
        let s = doc.login(Actor::new("owner")).unwrap();
        let input = "\n\n  Groceries  \n\n- milk\n\n3. \n- eggs\n";

        let summary = import(&s, Cursor::new(input)).unwrap();
        assert_eq!(summary.title.as_deref(), Some("Groceries"));
        assert_eq!(texts(&s, NodeId::ROOT), vec!["- milk", "- eggs"]);
    }

    #[test]
    fn test_shallower_line_returns_to_root() {
        let doc = Document::new("todo");
        let s = doc.login(Actor::new("owner")).unwrap();
        let input = "T\na\n  b\n    c\n  d\n";

        import(&s, Cursor::new(input)).unwrap();
        assert_eq!(texts(&s, NodeId::ROOT), vec!["a", "d"]);
        assert_eq!(texts(&s, NodeId::new(2)), vec!["b"]);
        assert_eq!(texts(&s, NodeId::new(3)), vec!["c"]);
    }

    #[test]
    fn test_import_round_trips_outline() {
        let doc = Document::new("todo");
        let s = doc.login(Actor::new("owner")).unwrap();
        let input = "Chores\n1. sweep\n    1. kitchen\n2. mop\n";
        import(&s, Cursor::new(input)).unwrap();

        let mut out = Vec::new();
        s.print(&mut out, 4).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), input);
    }

    #[test]
    fn test_import_without_create_fails() {
        let grants = ActionGrants::new().grant("viewer", [Action::Read, Action::Modify]);
        let doc =
            Document::with_collaborators(DocumentId::new(1), "todo", Some(Arc::new(grants)), None)
                .unwrap();
        let s = doc.login(Actor::new("viewer")).unwrap();

        let err = import(&s, Cursor::new("Title\n1. alpha\n")).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert_eq!(doc.title(), "Title");
        assert_eq!(doc.node_count(), 1);
    }
}
