//! Nodes and markers
//!
//! A [`Node`] is a text-bearing element of the outline tree. Its mutable
//! fields live in a [`NodeState`] behind a per-node lock, so a session can
//! hold the lock across its version check and the mutation that follows.
//!
//! Text offsets are counted in characters (Unicode scalar values), the same
//! unit marker positions use.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::error::{NotionError, Result};

/// Opaque 64-bit node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The root node of every document
    pub const ROOT: NodeId = NodeId(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optimistic-concurrency version of a node
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The version following this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `{start, end}` range over a node's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Marker {
    pub start: usize,
    pub end: usize,
}

impl Marker {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered set of markers, sorted by start then end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a marker, returning false if it was already present
    pub fn add(&mut self, marker: Marker) -> bool {
        match self.markers.binary_search(&marker) {
            Ok(_) => false,
            Err(pos) => {
                self.markers.insert(pos, marker);
                true
            }
        }
    }

    /// Remove a marker, returning false if it was not present
    pub fn remove(&mut self, marker: &Marker) -> bool {
        match self.markers.binary_search(marker) {
            Ok(pos) => {
                self.markers.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, marker: &Marker) -> bool {
        self.markers.binary_search(marker).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Marker> {
        self.markers.clone()
    }

    /// Shift markers to account for `len` characters inserted at `offset`
    ///
    /// Markers starting at or after the offset move right. A marker that
    /// straddles the offset grows to cover the inserted text. Both moves are
    /// monotone, so sort order is preserved.
    fn rebase_insert(&mut self, offset: usize, len: usize) {
        for marker in &mut self.markers {
            if marker.start >= offset {
                marker.start += len;
                marker.end += len;
            } else if marker.end > offset {
                marker.end += len;
            }
        }
    }
}

/// Mutable fields of a node, guarded by the node's lock
#[derive(Debug)]
pub struct NodeState {
    version: Version,
    text: String,
    markers: MarkerSet,
    children: Vec<Arc<Node>>,
    modified: DateTime<Utc>,
}

impl NodeState {
    fn new(text: String) -> Self {
        Self {
            version: Version::default(),
            text,
            markers: MarkerSet::new(),
            children: Vec::new(),
            modified: Utc::now(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Length of the text in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Record one successful mutation
    pub(crate) fn bump(&mut self) -> Version {
        self.version = self.version.next();
        self.modified = Utc::now();
        self.version
    }

    pub(crate) fn push_child(&mut self, child: Arc<Node>) {
        self.children.push(child);
    }

    /// Concatenate text onto the end
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Splice text in at a character offset
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        let len = self.len();
        if offset > len {
            return Err(NotionError::OutOfRange { offset, len });
        }

        if offset == 0 {
            self.text.insert_str(0, text);
        } else if offset == len {
            self.text.push_str(text);
        } else {
            let at = byte_index(&self.text, offset).unwrap_or(self.text.len());
            self.text.insert_str(at, text);
            self.markers.rebase_insert(offset, text.chars().count());
        }
        Ok(())
    }

    /// Remove `expected` from the text at a character offset
    ///
    /// Fails with `Mismatch` unless the text at `offset` is exactly
    /// `expected`. Markers are not rebased.
    pub fn delete(&mut self, offset: usize, expected: &str) -> Result<()> {
        let len = self.len();
        let start = byte_index(&self.text, offset).ok_or(NotionError::OutOfRange { offset, len })?;
        let count = expected.chars().count();
        let end = byte_index(&self.text, offset + count).unwrap_or(self.text.len());

        let found = &self.text[start..end];
        if found != expected {
            return Err(NotionError::Mismatch {
                offset,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }

        self.text.replace_range(start..end, "");
        Ok(())
    }

    /// Remove `suffix` from the end of the text
    ///
    /// Markers are not rebased.
    pub fn truncate(&mut self, suffix: &str) -> Result<()> {
        let len = self.len();
        let requested = suffix.chars().count();
        if requested > len {
            return Err(NotionError::TooLong { requested, len });
        }

        if !self.text.ends_with(suffix) {
            let offset = len - requested;
            let at = byte_index(&self.text, offset).unwrap_or(self.text.len());
            return Err(NotionError::Mismatch {
                offset,
                expected: suffix.to_string(),
                found: self.text[at..].to_string(),
            });
        }

        let keep = self.text.len() - suffix.len();
        self.text.truncate(keep);
        Ok(())
    }

    /// Add a marker over `[start, end)` of the current text
    pub fn add_marker(&mut self, marker: Marker) -> Result<bool> {
        let len = self.len();
        if marker.start > marker.end {
            return Err(NotionError::InvalidRange {
                start: marker.start,
                end: marker.end,
            });
        }
        if marker.end > len {
            return Err(NotionError::OutOfRange {
                offset: marker.end,
                len,
            });
        }
        Ok(self.markers.add(marker))
    }

    pub fn remove_marker(&mut self, marker: &Marker) -> bool {
        self.markers.remove(marker)
    }
}

/// Byte index of a character offset, `None` past the end
fn byte_index(text: &str, offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(offset)
}

/// A node of the outline tree
///
/// Ownership runs root to leaf through each node's children. The parent is
/// kept only as an ID, for navigation.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    created: DateTime<Utc>,
    state: Mutex<NodeState>,
}

impl Node {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id,
            parent,
            created: Utc::now(),
            state: Mutex::new(NodeState::new(text.into())),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Lock the node's mutable state
    pub fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock()
    }

    pub fn version(&self) -> Version {
        self.lock().version
    }

    /// Copy the node's current state
    pub fn snapshot(&self) -> NodeSnapshot {
        let state = self.lock();
        NodeSnapshot {
            id: self.id,
            parent: self.parent,
            version: state.version,
            text: state.text.clone(),
            markers: state.markers.to_vec(),
            children: state.children.iter().map(|c| c.id).collect(),
        }
    }
}

/// A caller's copy of a node at some version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub version: Version,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

impl NodeSnapshot {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(self.id, self.version)
    }
}

/// A node ID together with the version the caller last saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: NodeId,
    pub version: Version,
}

impl NodeRef {
    pub fn new(id: NodeId, version: Version) -> Self {
        Self { id, version }
    }
}

impl From<&NodeSnapshot> for NodeRef {
    fn from(snapshot: &NodeSnapshot) -> Self {
        snapshot.node_ref()
    }
}

impl From<NodeSnapshot> for NodeRef {
    fn from(snapshot: NodeSnapshot) -> Self {
        snapshot.node_ref()
    }
}
