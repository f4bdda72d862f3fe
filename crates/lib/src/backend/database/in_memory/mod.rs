//! In-memory database backend implementation
//!
//! This module provides an in-memory implementation of the `BackendImpl`
//! trait, suitable for testing, development, or single-process deployments
//! that persist by saving the whole state to a JSON file.

mod persistence;

use std::{any::Any, collections::HashMap, path::Path};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    Result,
    backend::{BackendImpl, errors::BackendError},
    document::{Document, DocumentId},
};

/// A simple in-memory backend using a `HashMap` for storage.
///
/// Documents live behind one `tokio::sync::RwLock`: reads share it, while
/// inserts, swaps and removals take it exclusively, so every
/// compare-and-swap observes and replaces one consistent snapshot.
///
/// It provides basic persistence via `save_to_file` and `load_from_file`,
/// serializing every envelope to JSON.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemory {
    /// Creates a new, empty `InMemory` backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves every stored document to `path` as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a backend from a JSON file written by [`InMemory::save_to_file`].
    ///
    /// If the file does not exist, a new, empty backend is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl BackendImpl for InMemory {
    async fn get(&self, id: &DocumentId) -> Result<Document> {
        let documents = self.documents.read().await;
        documents
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::DocumentNotFound { id: *id }.into())
    }

    async fn insert(&self, document: Document) -> Result<()> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(BackendError::DocumentAlreadyExists { id: document.id }.into());
        }
        debug!(document_id = %document.id, "Inserting document");
        documents.insert(document.id, document);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        id: &DocumentId,
        expected_version: u64,
        mut replacement: Document,
    ) -> Result<Document> {
        let mut documents = self.documents.write().await;
        let current = documents
            .get_mut(id)
            .ok_or(BackendError::DocumentNotFound { id: *id })?;
        if current.version != expected_version {
            return Err(BackendError::VersionConflict {
                id: *id,
                expected: expected_version,
                actual: current.version,
            }
            .into());
        }
        replacement.id = *id;
        replacement.version = expected_version + 1;
        *current = replacement.clone();
        Ok(replacement)
    }

    async fn remove(&self, id: &DocumentId) -> Result<Document> {
        let mut documents = self.documents.write().await;
        documents
            .remove(id)
            .ok_or_else(|| BackendError::DocumentNotFound { id: *id }.into())
    }

    async fn list_ids(&self) -> Result<Vec<DocumentId>> {
        let documents = self.documents.read().await;
        let mut stored: Vec<&Document> = documents.values().collect();
        stored.sort_by_key(|doc| (doc.created_at, doc.id));
        Ok(stored.into_iter().map(|doc| doc.id).collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.documents.read().await.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
