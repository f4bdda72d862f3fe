//! The document write path.
//!
//! [`Store`] sits between a transport (the HTTP server, the CLI) and a
//! [`BackendImpl`]. It owns the envelope rules: credential checks, request
//! body validation, and the load-compute-commit cycle that runs a
//! [`crate::tree`] operation against the stored data and commits the result
//! with an optimistic compare-and-swap, retrying when another writer got
//! there first.
//!
//! # Example
//!
//! ```
//! # async fn demo() -> jsondepot::Result<()> {
//! use std::sync::Arc;
//! use jsondepot::{backend::database::InMemory, path::PathBuf, store::Store, value::Value};
//! use serde_json::json;
//!
//! let store = Store::new(Arc::new(InMemory::new()));
//! let doc = store.create(Value::from(json!({"posts": []}))).await?;
//!
//! let apikey = Some(doc.credential.as_str());
//! let post = store
//!     .append(&doc.id, &PathBuf::normalize("posts"), apikey, Value::from(json!({"title": "hi"})))
//!     .await?;
//! assert_eq!(post.get("id"), Some(&Value::from(1)));
//! # Ok(())
//! # }
//! ```

mod errors;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use errors::StoreError;

use crate::{
    Error, Result,
    backend::BackendImpl,
    constants::DEFAULT_MAX_WRITE_RETRIES,
    document::{Document, DocumentId},
    path::Segment,
    tree::{self, TreeError},
    value::Value,
};

/// Tunables for [`Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How many times one write runs its read-compute-commit cycle before
    /// giving up with [`StoreError::WriteConflict`]. Zero is treated as one.
    pub max_write_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
        }
    }
}

/// A computed replacement for a document: new data, new watermark, and the
/// value to hand back to the caller.
type Computed = (Value, u64, Value);

/// Document operations over a shared backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn BackendImpl>,
    config: StoreConfig,
}

impl Store {
    /// Creates a store with the default configuration.
    pub fn new(backend: Arc<dyn BackendImpl>) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    pub fn with_config(backend: Arc<dyn BackendImpl>, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn BackendImpl> {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Parses a document id as it appears in a URL.
    ///
    /// Malformed ids cannot name a stored document and are reported as
    /// [`StoreError::DocumentNotFound`].
    pub fn parse_id(raw: &str) -> Result<DocumentId> {
        raw.parse().map_err(|_| {
            StoreError::DocumentNotFound {
                id: raw.to_string(),
            }
            .into()
        })
    }

    /// Creates a new document from `body`, assigning initial element ids and
    /// a fresh credential.
    pub async fn create(&self, body: Value) -> Result<Document> {
        let body = require_body(body)?;
        let document = Document::create(body)?;
        self.backend.insert(document.clone()).await?;
        info!(
            document_id = %document.id,
            watermark = document.watermark,
            "Created document"
        );
        Ok(document)
    }

    /// Loads a whole envelope.
    pub async fn get(&self, id: &DocumentId) -> Result<Document> {
        self.backend.get(id).await.map_err(|e| not_found(e, id))
    }

    /// Returns the value at `path` inside a document.
    pub async fn resolve(&self, id: &DocumentId, path: &[Segment]) -> Result<Value> {
        let document = self.get(id).await?;
        Ok(tree::resolve(&document.data, path)?.clone())
    }

    /// Replaces a document's whole tree. Returns the new tree.
    pub async fn replace(&self, id: &DocumentId, apikey: Option<&str>, body: Value) -> Result<Value> {
        let body = require_body(body)?;
        self.write(id, apikey, "replace", |current| {
            let outcome = tree::replace_whole(current.watermark, body.clone())?;
            Ok((outcome.data, outcome.watermark, outcome.stored))
        })
        .await
    }

    /// Deletes a whole document. Returns its last tree.
    pub async fn destroy(&self, id: &DocumentId, apikey: Option<&str>) -> Result<Value> {
        let presented = require_apikey(apikey)?;
        let current = self.get(id).await?;
        check_credential(&current, presented)?;
        let removed = self.backend.remove(id).await.map_err(|e| not_found(e, id))?;
        info!(document_id = %id, "Destroyed document");
        Ok(removed.data)
    }

    /// Appends `body` to the list at `path`. Returns the stored element.
    pub async fn append(
        &self,
        id: &DocumentId,
        path: &[Segment],
        apikey: Option<&str>,
        body: Value,
    ) -> Result<Value> {
        let body = require_body(body)?;
        self.write(id, apikey, "append", |current| {
            let outcome =
                tree::append_child(&current.data, path, current.watermark, body.clone())?;
            Ok((outcome.data, outcome.watermark, outcome.stored))
        })
        .await
    }

    /// Overwrites the existing value at `path`. Returns the stored value.
    pub async fn set_at(
        &self,
        id: &DocumentId,
        path: &[Segment],
        apikey: Option<&str>,
        body: Value,
    ) -> Result<Value> {
        let body = require_present(body)?;
        self.write(id, apikey, "set_at", |current| {
            let outcome = tree::set_at(&current.data, path, current.watermark, body.clone())?;
            Ok((outcome.data, outcome.watermark, outcome.stored))
        })
        .await
    }

    /// Shallow-merges `body` into the map at `path`. Returns the merged map.
    pub async fn merge_at(
        &self,
        id: &DocumentId,
        path: &[Segment],
        apikey: Option<&str>,
        body: Value,
    ) -> Result<Value> {
        let body = require_present(body)?;
        self.write(id, apikey, "merge_at", |current| {
            let outcome = tree::merge_at(&current.data, path, current.watermark, body.clone())?;
            Ok((outcome.data, outcome.watermark, outcome.stored))
        })
        .await
    }

    /// Removes the value at `path`. Returns the removed value.
    pub async fn delete_at(
        &self,
        id: &DocumentId,
        path: &[Segment],
        apikey: Option<&str>,
    ) -> Result<Value> {
        self.write(id, apikey, "delete_at", |current| {
            let (data, removed) = tree::delete_at(&current.data, path)?;
            Ok((data, current.watermark, removed))
        })
        .await
    }

    /// Runs `compute` against the current envelope and commits its result,
    /// retrying from a fresh load whenever the commit loses a version race.
    async fn write<F>(
        &self,
        id: &DocumentId,
        apikey: Option<&str>,
        operation: &'static str,
        compute: F,
    ) -> Result<Value>
    where
        F: Fn(&Document) -> std::result::Result<Computed, TreeError>,
    {
        let presented = require_apikey(apikey)?;
        let attempts = self.config.max_write_retries.max(1);

        for attempt in 1..=attempts {
            let current = self.get(id).await?;
            check_credential(&current, presented)?;

            let (data, watermark, echo) = compute(&current)?;
            let replacement = current.with_data(data, watermark);

            match self
                .backend
                .compare_and_swap(id, current.version, replacement)
                .await
            {
                Ok(committed) => {
                    debug!(
                        document_id = %id,
                        operation,
                        version = committed.version,
                        watermark = committed.watermark,
                        attempt,
                        "Committed write"
                    );
                    return Ok(echo);
                }
                Err(Error::Backend(e)) if e.is_version_conflict() => {
                    debug!(document_id = %id, operation, attempt, "Write lost version race, retrying");
                }
                Err(e) => return Err(not_found(e, id)),
            }
        }

        warn!(document_id = %id, operation, attempts, "Giving up on conflicting write");
        Err(StoreError::WriteConflict {
            id: id.to_string(),
            attempts,
        }
        .into())
    }
}

/// Rejects missing bodies and empty maps or lists.
fn require_body(body: Value) -> Result<Value> {
    let empty = match &body {
        Value::Null => true,
        Value::List(items) => items.is_empty(),
        Value::Map(entries) => entries.is_empty(),
        _ => false,
    };
    if empty {
        return Err(StoreError::EmptyBody.into());
    }
    Ok(body)
}

/// Sub-resource writes accept any value except a missing body.
fn require_present(body: Value) -> Result<Value> {
    if body.is_null() {
        return Err(StoreError::EmptyBody.into());
    }
    Ok(body)
}

fn require_apikey(apikey: Option<&str>) -> Result<&str> {
    match apikey {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(StoreError::MissingCredential.into()),
    }
}

fn check_credential(document: &Document, presented: &str) -> Result<()> {
    if document.credential.matches(presented) {
        Ok(())
    } else {
        Err(StoreError::CredentialMismatch {
            id: document.id.to_string(),
        }
        .into())
    }
}

/// Reports a backend miss for `id` as a store-level not-found.
fn not_found(err: Error, id: &DocumentId) -> Error {
    match err {
        Error::Backend(e) if e.is_not_found() => StoreError::DocumentNotFound { id: id.to_string() }.into(),
        other => other,
    }
}
