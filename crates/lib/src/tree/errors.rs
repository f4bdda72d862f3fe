//! Error types for path resolution and tree mutation.
//!
//! Every failure here is local and recoverable. A failed operation never
//! leaves a partially rebuilt tree behind: mutations only hand out a new root
//! once they have fully succeeded.

use thiserror::Error;

use crate::value::Kind;

/// Structured error types for operations in [`crate::tree`].
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A map has no entry under the requested key.
    #[error("Unfound object property by key: \"{key}\"")]
    KeyNotFound { key: String },

    /// No direct member of a list carries the requested id.
    #[error("Unfound array element by id: \"{id}\"")]
    ElementNotFound { id: String },

    /// The path continues past a scalar.
    #[error("Cannot descend into {kind} at path segment \"{segment}\"")]
    PathTypeMismatch { segment: String, kind: Kind },

    /// Append targeted something other than a list.
    #[error("Cannot POST to a non-array (found {kind})")]
    NotAList { kind: Kind },

    /// Merge operands must both be maps.
    #[error("Both things to merge must be objects (got {current} and {patch})")]
    MergeTypeError { current: Kind, patch: Kind },

    /// The parent of a delete target is neither a list nor a map.
    #[error("Cannot delete requested path: parent is {kind}")]
    UnsupportedDelete { kind: Kind },

    /// The operation needs at least one path segment.
    #[error("Empty path not allowed for {operation}")]
    EmptyPath { operation: String },

    /// Two members of one list would share an id.
    #[error("Duplicate array element id: \"{id}\"")]
    DuplicateElementId { id: String },
}

impl TreeError {
    /// Check if this error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreeError::KeyNotFound { .. } | TreeError::ElementNotFound { .. }
        )
    }

    /// Check if this error is caused by a node of the wrong kind.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            TreeError::PathTypeMismatch { .. }
                | TreeError::NotAList { .. }
                | TreeError::MergeTypeError { .. }
                | TreeError::UnsupportedDelete { .. }
        )
    }

    /// Check if this error rejects the shape of the request itself.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            TreeError::EmptyPath { .. } | TreeError::DuplicateElementId { .. }
        )
    }

    /// Check if this error reports an id collision inside a list.
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, TreeError::DuplicateElementId { .. })
    }

    /// The path segment this error is about, when there is one.
    pub fn segment(&self) -> Option<&str> {
        match self {
            TreeError::KeyNotFound { key } => Some(key),
            TreeError::ElementNotFound { id } => Some(id),
            TreeError::PathTypeMismatch { segment, .. } => Some(segment),
            _ => None,
        }
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}
