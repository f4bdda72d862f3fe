//! Storage backends for jsondepot documents
//!
//! This module provides the core `BackendImpl` trait and its implementations,
//! organized by category under [`database`].
//!
//! A backend stores whole [`Document`] envelopes keyed by [`DocumentId`]. It
//! knows nothing about paths or element ids: writers compute a new envelope
//! and commit it with [`BackendImpl::compare_and_swap`], which only succeeds
//! if nobody else committed since the envelope was loaded.

use std::any::Any;

use async_trait::async_trait;

use crate::{
    Result,
    document::{Document, DocumentId},
};

// Category modules
pub mod database;
pub mod errors;

pub use errors::BackendError;

/// Storage abstraction for document envelopes.
///
/// All implementations must be `Send` and `Sync` to allow sharing across
/// tasks, and implement `Any` to allow for downcasting if needed (the server
/// uses this to persist an [`database::InMemory`] backend on shutdown).
///
/// ## Versioning
///
/// Every stored envelope has a `version`. [`BackendImpl::insert`] stores the
/// version it is given; [`BackendImpl::compare_and_swap`] checks the stored
/// version against the caller's expectation and commits the replacement with
/// the version incremented by one.
#[async_trait]
pub trait BackendImpl: Send + Sync + Any {
    /// Retrieves a document by id.
    ///
    /// # Errors
    /// [`BackendError::DocumentNotFound`] if no such document is stored.
    async fn get(&self, id: &DocumentId) -> Result<Document>;

    /// Stores a new document.
    ///
    /// # Errors
    /// [`BackendError::DocumentAlreadyExists`] if the id is taken.
    async fn insert(&self, document: Document) -> Result<()>;

    /// Replaces the stored document `id` with `replacement` if its version
    /// still equals `expected_version`.
    ///
    /// Returns the document as committed, with its version bumped.
    ///
    /// # Errors
    /// - [`BackendError::DocumentNotFound`] if the document is gone
    /// - [`BackendError::VersionConflict`] if another writer committed first
    async fn compare_and_swap(
        &self,
        id: &DocumentId,
        expected_version: u64,
        replacement: Document,
    ) -> Result<Document>;

    /// Removes a document and returns it.
    ///
    /// # Errors
    /// [`BackendError::DocumentNotFound`] if no such document is stored.
    async fn remove(&self, id: &DocumentId) -> Result<Document>;

    /// Lists all stored document ids, oldest first.
    async fn list_ids(&self) -> Result<Vec<DocumentId>>;

    /// Number of stored documents.
    async fn count(&self) -> Result<usize>;

    /// Returns a reference to the backend as a `dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
