//! Document export
//!
//! Walks the tree and renders it either as field-named JSON or as a
//! numbered plain-text outline. Callers go through
//! [`Session::dump`](crate::session::Session::dump) and
//! [`Session::print`](crate::session::Session::print), which check the
//! `Dump` capability first.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::Document;
use crate::node::{Marker, Node, NodeId, Version};

/// Serializable view of a whole document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentExport {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub created: DateTime<Utc>,
    pub root: NodeTree,
}

/// Serializable view of a node and its subtree
#[derive(Debug, Clone, Serialize)]
pub struct NodeTree {
    pub id: NodeId,
    pub version: Version,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeTree>,
}

impl NodeTree {
    /// Copy a subtree, locking one node at a time
    pub fn from_node(node: &Node) -> Self {
        let (version, text, markers, children) = {
            let state = node.lock();
            let children: Vec<Arc<Node>> = state.children().to_vec();
            (
                state.version(),
                state.text().to_string(),
                state.markers().to_vec(),
                children,
            )
        };

        Self {
            id: node.id(),
            version,
            text,
            markers,
            nodes: children.iter().map(|c| Self::from_node(c)).collect(),
        }
    }
}

impl DocumentExport {
    pub fn from_document(document: &Document) -> Self {
        Self {
            name: document.name().to_string(),
            title: document.title(),
            created: document.created(),
            root: NodeTree::from_node(document.root()),
        }
    }
}

/// Write the document as pretty-printed JSON
pub fn write_json(document: &Document, mut writer: impl Write) -> io::Result<()> {
    let export = DocumentExport::from_document(document);
    serde_json::to_writer_pretty(&mut writer, &export)?;
    writeln!(writer)
}

/// Write the document as a numbered outline
///
/// The first line is the title (or the name when untitled). Children are
/// numbered from 1 within their parent and indented `indent` spaces per
/// level, the same layout the importer reads.
///
/// Nodes with empty text print no line, but their children keep their own
/// depth. Such an outline does not re-import to the same tree.
pub fn write_outline(document: &Document, mut writer: impl Write, indent: usize) -> io::Result<()> {
    let title = document.title();
    if title.is_empty() {
        writeln!(writer, "{}", document.name())?;
    } else {
        writeln!(writer, "{}", title)?;
    }

    let root = NodeTree::from_node(document.root());
    for (i, node) in root.nodes.iter().enumerate() {
        write_item(&mut writer, node, i + 1, 0, indent)?;
    }
    Ok(())
}

fn write_item(
    writer: &mut impl Write,
    node: &NodeTree,
    number: usize,
    depth: usize,
    indent: usize,
) -> io::Result<()> {
    if !node.text.is_empty() {
        writeln!(
            writer,
            "{:width$}{}. {}",
            "",
            number,
            node.text,
            width = depth * indent
        )?;
    }
    for (i, child) in node.nodes.iter().enumerate() {
        write_item(writer, child, i + 1, depth + 1, indent)?;
    }
    Ok(())
}
