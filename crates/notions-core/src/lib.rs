//! Notions Core Library
//!
//! This crate provides the mutation engine for Notions: hierarchical
//! outline documents ("collections of intentions") that many sessions can
//! edit at once.
//!
//! # Architecture
//!
//! - **Document**: owns the node tree, the node ID allocator and the lookup index
//! - **Node**: text plus markers, children and an optimistic-concurrency version
//! - **Session**: the only way in; checks versions and capabilities, then logs
//!
//! # Quick Start
//!
//! ```text
//! let doc = Document::new("todo");
//! let session = doc.login(Actor::new("me"))?;
//!
//! let root = session.root()?;
//! let item = session.item_append(&root, "line one")?;
//! session.text_append(&item, " and more")?;
//! ```
//!
//! # Modules
//!
//! - `document`: Document aggregate
//! - `node`: Nodes, markers and versions
//! - `session`: Per-actor gate for reads and mutations
//! - `command`: Command log contract and implementations
//! - `capability`: Capability service contract and implementations
//! - `registry`: Document ID allocation and lookup
//! - `import`: Plain-text outline importer
//! - `export`: JSON and outline rendering
//! - `config`: Application configuration

pub mod capability;
pub mod command;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod import;
pub mod node;
pub mod registry;
pub mod session;

pub use capability::{Action, ActionGrants, Actor, AllowAll, CapabilityService};
pub use command::{
    Command, CommandLog, CommandLogError, CommandRecord, JsonLinesLog, MemoryLog, WriterLog,
};
pub use config::Config;
pub use document::{Document, DocumentId};
pub use error::{ErrorKind, NotionError, Result};
pub use import::ImportSummary;
pub use node::{Marker, MarkerSet, Node, NodeId, NodeRef, NodeSnapshot, Version};
pub use registry::Registry;
pub use session::Session;
