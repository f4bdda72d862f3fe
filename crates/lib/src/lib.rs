//!
//! jsondepot: a schema-less JSON document store.
//! This library provides the storage engine behind the `jsondepot` server and CLI.
//!
//! ## Core Concepts
//!
//! * **Values (`value::Value`)**: An immutable, reference-counted JSON tree. Cloning shares subtrees.
//! * **Paths (`path::PathBuf`)**: `/`-separated addresses into a tree. Map children are addressed by key,
//!   list elements by their `id` field rather than by position.
//! * **Tree operations (`tree`)**: Pure resolve, set, append, merge and delete functions that rebuild only the
//!   containers on the path they touch, plus the element id allocator that keeps ids unique within each list.
//! * **Documents (`document::Document`)**: The stored envelope: a random id, a write credential, the data tree,
//!   the next id to allocate (the watermark), and a version used for optimistic concurrency.
//! * **Backends (`backend::BackendImpl`)**: Pluggable envelope storage with compare-and-swap. An in-memory backend
//!   is always available; SQLite and PostgreSQL backends are behind the `sqlite` and `postgres` features.
//! * **Store (`store::Store`)**: The write path: credential checks, and the load-compute-commit cycle that retries
//!   when a concurrent writer wins the version race.

pub mod backend;
pub mod constants;
pub mod document;
pub mod path;
pub mod store;
pub mod tree;
pub mod value;

pub use document::{Document, DocumentId};
pub use store::Store;
pub use value::Value;

/// Result type used throughout the jsondepot library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the jsondepot library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured tree resolution and mutation errors
    #[error(transparent)]
    Tree(tree::TreeError),

    /// Malformed path segments
    #[error(transparent)]
    Path(path::PathError),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Credential, request and concurrency errors from the store
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Tree(_) => "tree",
            Error::Path(_) => "path",
            Error::Backend(_) => "backend",
            Error::Store(_) => "store",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a document or path target was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_not_found(),
            Error::Backend(backend_err) => backend_err.is_not_found(),
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a presented credential was rejected.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_permission_denied(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists or lost write race).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_conflict(),
            Error::Store(store_err) => store_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is caused by a node of the wrong kind.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error rejects the request itself.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_validation_error(),
            Error::Path(path_err) => path_err.is_invalid_segment(),
            Error::Store(store_err) => store_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error is a client mistake rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        self.is_not_found()
            || self.is_authentication_error()
            || self.is_conflict()
            || self.is_type_error()
            || self.is_validation_error()
    }
}
