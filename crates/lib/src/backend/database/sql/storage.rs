//! Document storage operations for SQL backends.
//!
//! This module implements the envelope CRUD and compare-and-swap operations
//! using sqlx.

use chrono::{DateTime, Utc};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::document::{Credential, Document, DocumentId};
use crate::value::Value;

use super::{SqlxBackend, SqlxResultExt};

/// Columns in the order selected by [`SELECT_DOCUMENT`].
type DocumentRow = (String, String, String, i64, i64, String, String);

const SELECT_DOCUMENT: &str = "SELECT id, credential, data, watermark, version, created_at, updated_at
     FROM documents WHERE id = $1";

fn invalid(reason: String) -> crate::Error {
    BackendError::InvalidRecord { reason }.into()
}

fn to_i64(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| invalid(format!("{field} {value} exceeds BIGINT range")))
}

fn to_u64(field: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| invalid(format!("negative {field}: {value}")))
}

fn parse_timestamp(field: &str, text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| invalid(format!("{field} '{text}': {e}")))
}

fn row_to_document(row: DocumentRow) -> Result<Document> {
    let (id, credential, data, watermark, version, created_at, updated_at) = row;
    let id: DocumentId = id
        .parse()
        .map_err(|e| invalid(format!("document id '{id}': {e}")))?;
    let data: Value =
        serde_json::from_str(&data).map_err(|e| BackendError::DeserializationFailed { source: e })?;
    Ok(Document {
        id,
        credential: Credential::from(credential),
        data,
        watermark: to_u64("watermark", watermark)?,
        version: to_u64("version", version)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

fn encode_data(document: &Document) -> Result<String> {
    serde_json::to_string(&document.data)
        .map_err(|e| BackendError::SerializationFailed { source: e }.into())
}

/// Get a document by ID.
pub async fn get(backend: &SqlxBackend, id: &DocumentId) -> Result<Document> {
    let row: Option<DocumentRow> = sqlx::query_as(SELECT_DOCUMENT)
        .bind(id.to_string())
        .fetch_optional(backend.pool())
        .await
        .sql_context("Failed to get document")?;

    match row {
        Some(row) => row_to_document(row),
        None => Err(BackendError::DocumentNotFound { id: *id }.into()),
    }
}

/// Store a new document.
pub async fn insert(backend: &SqlxBackend, document: Document) -> Result<()> {
    let data = encode_data(&document)?;
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM documents WHERE id = $1")
        .bind(document.id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .sql_context("Failed to check for existing document")?;
    if existing.is_some() {
        return Err(BackendError::DocumentAlreadyExists { id: document.id }.into());
    }

    sqlx::query(
        "INSERT INTO documents (id, credential, data, watermark, version, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(document.id.to_string())
    .bind(document.credential.as_str().to_string())
    .bind(data)
    .bind(to_i64("watermark", document.watermark)?)
    .bind(to_i64("version", document.version)?)
    .bind(document.created_at.to_rfc3339())
    .bind(document.updated_at.to_rfc3339())
    .execute(&mut *tx)
    .await
    .sql_context("Failed to insert document")?;

    tx.commit().await.sql_context("Failed to commit insert")?;
    tracing::debug!(document_id = %document.id, "Inserted document");
    Ok(())
}

/// Replace a document if its stored version still matches.
pub async fn compare_and_swap(
    backend: &SqlxBackend,
    id: &DocumentId,
    expected_version: u64,
    mut replacement: Document,
) -> Result<Document> {
    replacement.id = *id;
    replacement.version = expected_version + 1;
    let data = encode_data(&replacement)?;

    let result = sqlx::query(
        "UPDATE documents SET data = $1, watermark = $2, version = $3, updated_at = $4
         WHERE id = $5 AND version = $6",
    )
    .bind(data)
    .bind(to_i64("watermark", replacement.watermark)?)
    .bind(to_i64("version", replacement.version)?)
    .bind(replacement.updated_at.to_rfc3339())
    .bind(id.to_string())
    .bind(to_i64("version", expected_version)?)
    .execute(backend.pool())
    .await
    .sql_context("Failed to update document")?;

    if result.rows_affected() == 1 {
        return Ok(replacement);
    }

    // Nothing matched: either the row is gone or another writer won.
    let current: Option<(i64,)> = sqlx::query_as("SELECT version FROM documents WHERE id = $1")
        .bind(id.to_string())
        .fetch_optional(backend.pool())
        .await
        .sql_context("Failed to read document version")?;
    match current {
        None => Err(BackendError::DocumentNotFound { id: *id }.into()),
        Some((actual,)) => Err(BackendError::VersionConflict {
            id: *id,
            expected: expected_version,
            actual: to_u64("version", actual)?,
        }
        .into()),
    }
}

/// Remove a document, returning it.
pub async fn remove(backend: &SqlxBackend, id: &DocumentId) -> Result<Document> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    let row: Option<DocumentRow> = sqlx::query_as(SELECT_DOCUMENT)
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .sql_context("Failed to load document for removal")?;
    let Some(row) = row else {
        return Err(BackendError::DocumentNotFound { id: *id }.into());
    };

    sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete document")?;

    tx.commit().await.sql_context("Failed to commit removal")?;
    row_to_document(row)
}

/// List all document IDs, oldest first.
pub async fn list_ids(backend: &SqlxBackend) -> Result<Vec<DocumentId>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM documents ORDER BY created_at, id")
        .fetch_all(backend.pool())
        .await
        .sql_context("Failed to list documents")?;

    rows.into_iter()
        .map(|(id,)| {
            id.parse()
                .map_err(|e| invalid(format!("document id '{id}': {e}")))
        })
        .collect()
}

/// Count stored documents.
pub async fn count(backend: &SqlxBackend) -> Result<usize> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
        .fetch_one(backend.pool())
        .await
        .sql_context("Failed to count documents")?;
    usize::try_from(count).map_err(|_| invalid(format!("negative document count: {count}")))
}
