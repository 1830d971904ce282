//! Document aggregate
//!
//! A [`Document`] owns the node tree, the node ID allocator and the
//! ID→node lookup index. The index holds weak references only; the tree
//! itself is owned root to leaf through each node's children.
//!
//! Allocation and lookup share one lock. Node contents are guarded by each
//! node's own lock, taken by [`Session`](crate::session::Session) for the
//! duration of a check-and-mutate step.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::capability::{Action, Actor, CapabilityService};
use crate::command::{Command, CommandLog};
use crate::error::{NotionError, Result};
use crate::node::{Node, NodeId, Version};
use crate::session::Session;

/// Identifier of a document within a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocator counter and lookup index, guarded together
struct Index {
    last_id: u64,
    nodes: HashMap<NodeId, Weak<Node>>,
}

/// An outline document: a collection of intentions
pub struct Document {
    id: DocumentId,
    name: String,
    title: RwLock<String>,
    created: DateTime<Utc>,
    root: Arc<Node>,
    index: Mutex<Index>,
    capabilities: Option<Arc<dyn CapabilityService>>,
    log: Option<Arc<dyn CommandLog>>,
}

impl Document {
    /// Create a standalone document with no capability checks or logging
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::build(DocumentId::new(1), name.into(), None, None)
    }

    /// Create a document wired to its collaborators
    ///
    /// Records `DocumentCreate` when a command log is configured.
    pub fn with_collaborators(
        id: DocumentId,
        name: impl Into<String>,
        capabilities: Option<Arc<dyn CapabilityService>>,
        log: Option<Arc<dyn CommandLog>>,
    ) -> Result<Arc<Self>> {
        let doc = Self::build(id, name.into(), capabilities, log);
        doc.record(
            Command::DocumentCreate,
            json!({ "document": doc.id, "name": doc.name }),
        )?;
        Ok(doc)
    }

    fn build(
        id: DocumentId,
        name: String,
        capabilities: Option<Arc<dyn CapabilityService>>,
        log: Option<Arc<dyn CommandLog>>,
    ) -> Arc<Self> {
        let root = Arc::new(Node::new(NodeId::ROOT, None, ""));
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::ROOT, Arc::downgrade(&root));

        info!(document = %id, name = %name, "Created document");

        Arc::new(Self {
            id,
            name,
            title: RwLock::new(String::new()),
            created: Utc::now(),
            root,
            index: Mutex::new(Index {
                last_id: NodeId::ROOT.get(),
                nodes,
            }),
            capabilities,
            log,
        })
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> String {
        self.title.read().clone()
    }

    /// Replace the title and record `DocumentRetitle`
    ///
    /// The title lock is held while recording, so retitles are logged in
    /// the order they were applied.
    pub(crate) fn retitle(&self, title: &str) -> Result<()> {
        let mut current = self.title.write();
        *current = title.to_string();
        self.record(
            Command::DocumentRetitle,
            json!({ "document": self.id, "title": title }),
        )
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// The root node (ID 1)
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Number of nodes in the lookup index, root included
    pub fn node_count(&self) -> usize {
        self.index.lock().nodes.len()
    }

    /// Open a session for an actor
    ///
    /// The capability service, if any, must authenticate the actor first.
    pub fn login(self: &Arc<Self>, actor: Actor) -> Result<Session> {
        if let Some(caps) = &self.capabilities {
            caps.authenticate(&actor)?;
        }
        Ok(Session::new(Arc::clone(self), actor))
    }

    /// Allocate a new node under `parent`
    ///
    /// Assigns the next ID and registers the node in the lookup index. The
    /// caller is responsible for attaching it to the parent's children.
    pub(crate) fn allocate(&self, parent: NodeId, text: &str) -> Arc<Node> {
        let mut index = self.index.lock();
        index.last_id += 1;
        let id = NodeId::new(index.last_id);
        let node = Arc::new(Node::new(id, Some(parent), text));
        index.nodes.insert(id, Arc::downgrade(&node));
        drop(index);

        debug!(document = %self.id, node = %id, parent = %parent, "Allocated node");
        node
    }

    /// Find a live node by ID
    pub fn lookup(&self, id: NodeId) -> Result<Arc<Node>> {
        self.index
            .lock()
            .nodes
            .get(&id)
            .and_then(Weak::upgrade)
            .ok_or(NotionError::NotFound(id))
    }

    /// Current stored version of a node
    pub fn current_version(&self, id: NodeId) -> Result<Version> {
        Ok(self.lookup(id)?.version())
    }

    /// Ask the capability service; no service means no restriction
    pub(crate) fn allow(&self, actor: &Actor, node: NodeId, action: Action) -> Result<()> {
        match &self.capabilities {
            Some(caps) if !caps.allow(actor, node, action) => {
                warn!(document = %self.id, node = %node, %actor, %action, "Capability denied");
                Err(NotionError::Forbidden { action, id: node })
            }
            _ => Ok(()),
        }
    }

    /// Forward a command to the log; no log means nothing to do
    pub(crate) fn record(&self, command: Command, args: Value) -> Result<()> {
        if let Some(log) = &self.log {
            log.record(command, args).inspect_err(|e| {
                warn!(document = %self.id, %command, error = %e, "Failed to record command");
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("title", &*self.title.read())
            .field("created", &self.created)
            .field("nodes", &self.node_count())
            .field("capabilities", &self.capabilities.is_some())
            .field("log", &self.log.is_some())
            .finish()
    }
}
