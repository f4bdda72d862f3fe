//! Error types for the storage backends.
//!
//! This module defines structured error types for backend operations,
//! providing better error context and type safety compared to string-based errors.

use thiserror::Error;

use crate::document::DocumentId;

/// Errors that can occur during backend operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Field additions/changes require a major version bump
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Document not found by ID.
    #[error("Could not find Data with ID of {id}")]
    DocumentNotFound {
        /// The ID of the document that was not found
        id: DocumentId,
    },

    /// A document with this ID is already stored.
    #[error("Document already exists: {id}")]
    DocumentAlreadyExists {
        /// The ID that is already taken
        id: DocumentId,
    },

    /// The stored version moved on since the document was loaded.
    #[error("Version conflict on document {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The ID of the document
        id: DocumentId,
        /// The version the writer loaded
        expected: u64,
        /// The version currently stored
        actual: u64,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be turned back into a document.
    #[error("Invalid stored record: {reason}")]
    InvalidRecord {
        /// Description of what is wrong with the record
        reason: String,
    },

    /// SQL database operation failed.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description including context
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl BackendError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::DocumentNotFound { .. })
    }

    /// Check if this error indicates a concurrent or duplicate write.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BackendError::DocumentAlreadyExists { .. } | BackendError::VersionConflict { .. }
        )
    }

    /// Check if this error is a lost compare-and-swap race.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, BackendError::VersionConflict { .. })
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. }
                | BackendError::SerializationFailed { .. }
                | BackendError::DeserializationFailed { .. }
        )
    }

    /// Check if this error indicates corrupted stored data.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::InvalidRecord { .. } | BackendError::DeserializationFailed { .. }
        )
    }

    /// Check if this error came from the SQL layer.
    pub fn is_sql_error(&self) -> bool {
        match self {
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            BackendError::SqlxError { .. } => true,
            _ => false,
        }
    }

    /// Get the document ID if this error is about a specific document.
    pub fn document_id(&self) -> Option<&DocumentId> {
        match self {
            BackendError::DocumentNotFound { id }
            | BackendError::DocumentAlreadyExists { id }
            | BackendError::VersionConflict { id, .. } => Some(id),
            _ => None,
        }
    }
}

// Conversion from BackendError to the main Error type
impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_helpers() {
        let id = DocumentId::generate();

        let err = BackendError::DocumentNotFound { id };
        assert!(err.is_not_found());
        assert_eq!(err.document_id(), Some(&id));
        assert_eq!(err.to_string(), format!("Could not find Data with ID of {id}"));

        let err = BackendError::VersionConflict {
            id,
            expected: 1,
            actual: 2,
        };
        assert!(err.is_conflict());
        assert!(err.is_version_conflict());
        assert!(!err.is_not_found());

        let err = BackendError::DocumentAlreadyExists { id };
        assert!(err.is_conflict());
        assert!(!err.is_version_conflict());

        let err = BackendError::FileIo {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "test"),
        };
        assert!(err.is_io_error());
        assert_eq!(err.document_id(), None);

        let err = BackendError::InvalidRecord {
            reason: "bad timestamp".to_string(),
        };
        assert!(err.is_integrity_error());
        assert!(!err.is_sql_error());
    }

    #[test]
    fn test_error_conversion() {
        let id = DocumentId::generate();
        let err: crate::Error = BackendError::DocumentNotFound { id }.into();
        match err {
            crate::Error::Backend(BackendError::DocumentNotFound { id: found }) => {
                assert_eq!(found, id)
            }
            _ => panic!("Unexpected error variant"),
        }
    }
}
