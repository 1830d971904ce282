//! Document registry
//!
//! Owns the document ID counter and the set of live documents. Each
//! registry counts independently, so tests can build as many as they like
//! without sharing IDs.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::capability::CapabilityService;
use crate::command::CommandLog;
use crate::document::{Document, DocumentId};
use crate::error::Result;

/// Top-level owner of documents
#[derive(Default)]
pub struct Registry {
    last_id: Mutex<u64>,
    documents: RwLock<BTreeMap<DocumentId, Arc<Document>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new document
    pub fn create_document(
        &self,
        name: impl Into<String>,
        capabilities: Option<Arc<dyn CapabilityService>>,
        log: Option<Arc<dyn CommandLog>>,
    ) -> Result<Arc<Document>> {
        let id = {
            let mut last = self.last_id.lock();
            *last += 1;
            DocumentId::new(*last)
        };

        let doc = Document::with_collaborators(id, name, capabilities, log)?;
        self.documents.write().insert(id, Arc::clone(&doc));
        Ok(doc)
    }

    /// Look up a document by ID
    pub fn document(&self, id: DocumentId) -> Option<Arc<Document>> {
        self.documents.read().get(&id).cloned()
    }

    /// All documents, in ID order
    pub fn documents(&self) -> Vec<Arc<Document>> {
        self.documents.read().values().cloned().collect()
    }

    /// Find a document by name
    pub fn find(&self, name: &str) -> Option<Arc<Document>> {
        self.documents
            .read()
            .values()
            .find(|d| d.name() == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
