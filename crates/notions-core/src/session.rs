//! Sessions
//!
//! A [`Session`] is the only way an actor reads or changes a document.
//! Every mutation takes the target node's lock, then checks the caller's
//! version snapshot and the actor's capabilities, applies the change, bumps
//! the node's version and finally appends a command record. Holding the
//! lock across the whole step means two sessions racing on the same
//! version cannot both succeed.
//!
//! If the command log fails, the error is returned but the in-memory change
//! stays applied.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::{Action, Actor};
use crate::command::Command;
use crate::document::Document;
use crate::error::{NotionError, Result};
use crate::export;
use crate::node::{Marker, NodeId, NodeRef, NodeSnapshot, NodeState, Version};

/// An actor's interaction with one document
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    document: Arc<Document>,
    actor: Actor,
    created: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(document: Arc<Document>, actor: Actor) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, document = %document.id(), %actor, "Opened session");
        Self {
            id,
            document,
            actor,
            created: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    // ==================== Reads ====================

    /// Fetch a copy of a node the actor may read
    pub fn get_node(&self, id: NodeId) -> Result<NodeSnapshot> {
        let node = self.document.lookup(id)?;
        self.document.allow(&self.actor, id, Action::Read)?;
        Ok(node.snapshot())
    }

    /// Fetch the root node
    pub fn root(&self) -> Result<NodeSnapshot> {
        self.get_node(NodeId::ROOT)
    }

    /// Check that `node` is current and `action` is allowed on it
    pub fn validate(&self, node: impl Into<NodeRef>, action: Action) -> Result<()> {
        let node = node.into();
        let handle = self.document.lookup(node.id)?;
        let state = handle.lock();
        self.check(&state, node, &[action])
    }

    fn check(&self, state: &NodeState, node: NodeRef, actions: &[Action]) -> Result<()> {
        let current = state.version();
        if node.version != current {
            warn!(
                session = %self.id,
                node = %node.id,
                yours = %node.version,
                %current,
                "Version conflict"
            );
            return Err(NotionError::VersionConflict {
                id: node.id,
                yours: node.version,
                current,
            });
        }
        for &action in actions {
            self.document.allow(&self.actor, node.id, action)?;
        }
        Ok(())
    }

    /// Check, mutate and record one node as a single step under its lock
    ///
    /// `apply` returns its output plus the command arguments; the node's new
    /// version is added to those arguments before recording. The record is
    /// written before the lock is released, so the log lists changes to a
    /// node in the order they were applied.
    fn mutate<T>(
        &self,
        node: NodeRef,
        actions: &[Action],
        command: Command,
        apply: impl FnOnce(&mut NodeState) -> Result<(T, Value)>,
    ) -> Result<(T, Version)> {
        let handle = self.document.lookup(node.id)?;
        let mut state = handle.lock();
        self.check(&state, node, actions)?;
        let (out, mut args) = apply(&mut state)?;
        let version = state.bump();
        debug!(session = %self.id, node = %node.id, %version, "Applied mutation");

        with_version(&mut args, version);
        self.document.record(command, args)?;
        Ok((out, version))
    }

    // ==================== Tree ====================

    /// Append a new child node under `parent`
    ///
    /// This is the only way the tree grows. The parent's version goes up by
    /// one; the new node starts at version 0.
    pub fn item_append(&self, parent: impl Into<NodeRef>, text: &str) -> Result<NodeSnapshot> {
        let parent = parent.into();
        let handle = self.document.lookup(parent.id)?;
        let mut state = handle.lock();
        self.check(&state, parent, &[Action::Create])?;

        let child = self.document.allocate(parent.id, text);
        // Held until NodeCreate is recorded, so no edit of the child is logged first
        let child_state = child.lock();
        state.push_child(Arc::clone(&child));
        let version = state.bump();
        debug!(
            session = %self.id,
            node = %child.id(),
            parent = %parent.id,
            %version,
            "Appended node"
        );

        let recorded = self.document.record(
            Command::NodeCreate,
            json!({ "id": child.id(), "parent": parent.id, "text": text, "version": version }),
        );
        drop(child_state);
        drop(state);
        recorded?;
        Ok(child.snapshot())
    }

    // ==================== Text ====================

    /// Splice text into a node at a character offset
    pub fn text_insert(&self, node: impl Into<NodeRef>, offset: usize, text: &str) -> Result<Version> {
        let node = node.into();
        self.edit(node, Command::TextInsert, |state| {
            state.insert(offset, text)?;
            Ok(json!({ "id": node.id, "offset": offset, "text": text }))
        })
    }

    /// Append text to a node
    pub fn text_append(&self, node: impl Into<NodeRef>, text: &str) -> Result<Version> {
        let node = node.into();
        self.edit(node, Command::TextAppend, |state| {
            state.append(text);
            Ok(json!({ "id": node.id, "text": text }))
        })
    }

    /// Delete `expected` from a node at a character offset
    pub fn text_delete(&self, node: impl Into<NodeRef>, offset: usize, expected: &str) -> Result<Version> {
        let node = node.into();
        self.edit(node, Command::TextDelete, |state| {
            state.delete(offset, expected)?;
            Ok(json!({ "id": node.id, "offset": offset, "text": expected }))
        })
    }

    /// Remove `suffix` from the end of a node's text
    pub fn text_truncate(&self, node: impl Into<NodeRef>, suffix: &str) -> Result<Version> {
        let node = node.into();
        self.edit(node, Command::TextTruncate, |state| {
            state.truncate(suffix)?;
            Ok(json!({ "id": node.id, "text": suffix }))
        })
    }

    fn edit(
        &self,
        node: NodeRef,
        command: Command,
        apply: impl FnOnce(&mut NodeState) -> Result<Value>,
    ) -> Result<Version> {
        self.mutate(node, &[Action::Read, Action::Modify], command, |state| {
            apply(state).map(|args| ((), args))
        })
        .map(|(_, version)| version)
    }

    // ==================== Markers ====================

    /// Mark the range `[start, end)` of a node's text
    pub fn style_tag(&self, node: impl Into<NodeRef>, start: usize, end: usize) -> Result<Version> {
        let node = node.into();
        self.edit(node, Command::StyleTag, |state| {
            state.add_marker(Marker::new(start, end))?;
            Ok(json!({ "id": node.id, "start": start, "end": end }))
        })
    }

    /// Remove the marker `[start, end)` from a node
    ///
    /// Removing a marker that is not there still counts as a mutation.
    pub fn style_del(&self, node: impl Into<NodeRef>, start: usize, end: usize) -> Result<Version> {
        let node = node.into();
        self.edit(node, Command::StyleDel, |state| {
            state.remove_marker(&Marker::new(start, end));
            Ok(json!({ "id": node.id, "start": start, "end": end }))
        })
    }

    // ==================== Document ====================

    /// Set the document title
    ///
    /// Requires `Modify` on the root. The title is not part of any node, so
    /// no version changes.
    pub fn set_title(&self, title: &str) -> Result<()> {
        self.document
            .allow(&self.actor, NodeId::ROOT, Action::Modify)?;
        self.document.retitle(title)
    }

    /// Check the `Dump` capability
    pub fn can_dump(&self) -> Result<()> {
        self.document
            .allow(&self.actor, NodeId::ROOT, Action::Dump)
    }

    /// Write the whole document as pretty JSON
    pub fn dump(&self, writer: impl Write) -> Result<()> {
        self.can_dump()?;
        export::write_json(&self.document, writer)?;
        Ok(())
    }

    /// Write the document as a numbered plain-text outline
    pub fn print(&self, writer: impl Write, indent: usize) -> Result<()> {
        self.can_dump()?;
        export::write_outline(&self.document, writer, indent)?;
        Ok(())
    }
}

/// Add the node's resulting version to a record's arguments
fn with_version(args: &mut Value, version: Version) {
    if let Value::Object(map) = args {
        map.insert("version".to_string(), json!(version));
    }
}
