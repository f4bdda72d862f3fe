//! Error types for the document write path.
//!
//! These cover the envelope-level failures of [`crate::store::Store`]:
//! unknown documents, credential checks, request bodies and lost write races.
//! Failures inside the data tree are reported as [`crate::tree::TreeError`].

use thiserror::Error;

/// Errors produced by [`crate::store::Store`] operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document is stored under this id (or the id is malformed).
    #[error("Could not find Data with ID of {id}")]
    DocumentNotFound { id: String },

    /// A write was attempted without a credential.
    #[error("Need to pass an apikey in header as \"x-apikey\"")]
    MissingCredential,

    /// The presented credential does not belong to the document.
    #[error("Mismatching apikey for given JSON ID, make sure this is your resource")]
    CredentialMismatch { id: String },

    /// A write carried no usable body.
    #[error("Need to pass a JSON body")]
    EmptyBody,

    /// Every attempt lost the compare-and-swap race.
    #[error("Write to document {id} kept conflicting after {attempts} attempts")]
    WriteConflict { id: String, attempts: u32 },
}

impl StoreError {
    /// Check if this error indicates a resource was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::DocumentNotFound { .. })
    }

    /// Check if the caller presented a credential that does not match
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::CredentialMismatch { .. })
    }

    /// Check if this error is about credentials at all
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            StoreError::MissingCredential | StoreError::CredentialMismatch { .. }
        )
    }

    /// Check if the request itself was unusable
    pub fn is_validation_error(&self) -> bool {
        matches!(self, StoreError::EmptyBody)
    }

    /// Check if this error is a lost write race
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::WriteConflict { .. })
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
