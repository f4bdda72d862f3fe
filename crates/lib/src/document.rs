//! The stored document envelope.
//!
//! A [`Document`] wraps one data tree with everything needed to address,
//! authorize and version it. The tree itself is only ever replaced as a
//! whole: writers compute a new tree with [`crate::tree`] and hand the
//! backend a new envelope.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    constants::{CREDENTIAL_BYTES, INITIAL_WATERMARK},
    tree::{self, TreeError},
    value::Value,
};

/// Identifier of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Per-document secret required for every write.
///
/// Sent by clients in the `x-apikey` header. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Generates a new credential from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; CREDENTIAL_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks a caller-supplied key against this credential.
    pub fn matches(&self, presented: &str) -> bool {
        self.0 == presented
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A stored document: its data tree plus identity, credential, id watermark
/// and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub credential: Credential,
    pub data: Value,
    /// Next integer available for element id allocation.
    pub watermark: u64,
    /// Bumped by the backend on every committed replacement.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Builds a new envelope around `data`, assigning element ids from the
    /// initial watermark.
    pub fn create(data: Value) -> Result<Self, TreeError> {
        let outcome = tree::replace_whole(INITIAL_WATERMARK, data)?;
        let now = Utc::now();
        Ok(Self {
            id: DocumentId::generate(),
            credential: Credential::generate(),
            data: outcome.data,
            watermark: outcome.watermark,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns a copy carrying a new tree and watermark, stamped now.
    ///
    /// The version is left alone; backends bump it when they commit.
    pub fn with_data(&self, data: Value, watermark: u64) -> Self {
        Self {
            data,
            watermark,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_assigns_initial_ids() {
        let doc = Document::create(Value::from(json!({"news": [{"t": 1}, {"t": 2}]}))).unwrap();
        assert_eq!(
            serde_json::Value::from(&doc.data),
            json!({"news": [{"t": 1, "id": 1}, {"t": 2, "id": 2}]})
        );
        assert_eq!(doc.watermark, 3);
        assert_eq!(doc.version, 0);
        assert_eq!(doc.created_at, doc.updated_at);
    }

    #[test]
    fn test_credential_format() {
        let credential = Credential::generate();
        assert_eq!(credential.as_str().len(), CREDENTIAL_BYTES * 2);
        assert!(credential.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(credential, Credential::generate());
        assert!(credential.matches(credential.as_str()));
        assert!(!credential.matches(""));
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
    }

    #[test]
    fn test_document_id_round_trips_through_text() {
        let id = DocumentId::generate();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_with_data_keeps_identity() {
        let doc = Document::create(Value::empty_map()).unwrap();
        let next = doc.with_data(Value::from(json!({"a": 1})), 9);
        assert_eq!(next.id, doc.id);
        assert_eq!(next.credential, doc.credential);
        assert_eq!(next.version, doc.version);
        assert_eq!(next.watermark, 9);
        assert!(next.updated_at >= doc.updated_at);
    }

    #[test]
    fn test_serde_shape() {
        let doc = Document::create(Value::from(json!([1]))).unwrap();
        let encoded = serde_json::to_value(&doc).unwrap();
        assert_eq!(encoded["id"], json!(doc.id.to_string()));
        assert_eq!(encoded["credential"], json!(doc.credential.as_str()));
        assert_eq!(encoded["data"], json!([1]));
        let decoded: Document = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, doc);
    }
}
