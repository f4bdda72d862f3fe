//! Behaviour every `BackendImpl` must share, run against the backend chosen
//! by `TEST_BACKEND`.

use jsondepot::{
    Document, DocumentId, Error,
    backend::{BackendError, BackendImpl, database::InMemory},
};
use serde_json::json;

use crate::helpers::{test_backend, v};

fn new_doc(json: serde_json::Value) -> Document {
    Document::create(v(json)).expect("document should build")
}

#[tokio::test]
async fn test_insert_get_remove() {
    let backend = test_backend().await;
    let doc = new_doc(json!({"a": [{"b": 1}]}));

    backend.insert(doc.clone()).await.unwrap();
    assert_eq!(backend.get(&doc.id).await.unwrap(), doc);
    assert_eq!(backend.count().await.unwrap(), 1);

    let err = backend.insert(doc.clone()).await.unwrap_err();
    assert!(err.is_conflict());

    let removed = backend.remove(&doc.id).await.unwrap();
    assert_eq!(removed, doc);
    assert!(backend.get(&doc.id).await.unwrap_err().is_not_found());
    assert!(backend.remove(&doc.id).await.unwrap_err().is_not_found());
    assert_eq!(backend.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_compare_and_swap() {
    let backend = test_backend().await;
    let doc = new_doc(json!({"n": 1}));
    backend.insert(doc.clone()).await.unwrap();

    let first = doc.with_data(v(json!({"n": 2})), doc.watermark);
    let committed = backend.compare_and_swap(&doc.id, 0, first).await.unwrap();
    assert_eq!(committed.version, 1);

    // A writer still holding version 0 loses.
    let stale = doc.with_data(v(json!({"n": 3})), doc.watermark);
    let err = backend.compare_and_swap(&doc.id, 0, stale).await.unwrap_err();
    match err {
        Error::Backend(BackendError::VersionConflict {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        other => panic!("expected version conflict, got {other:?}"),
    }

    let stored = backend.get(&doc.id).await.unwrap();
    assert_eq!(stored.data, v(json!({"n": 2})));
    assert_eq!(stored.version, 1);
    assert_eq!(stored.credential, doc.credential);
    assert_eq!(stored.created_at, doc.created_at);
}

#[tokio::test]
async fn test_compare_and_swap_missing_document() {
    let backend = test_backend().await;
    let doc = new_doc(json!([1]));
    let err = backend.compare_and_swap(&doc.id, 0, doc.clone()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_ids_oldest_first() {
    let backend = test_backend().await;
    let mut ids = Vec::new();
    for n in 0..3 {
        let doc = new_doc(json!({"n": n}));
        ids.push(doc.id);
        backend.insert(doc).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    assert_eq!(backend.list_ids().await.unwrap(), ids);

    let unknown = DocumentId::generate();
    assert!(!backend.list_ids().await.unwrap().contains(&unknown));
}

#[tokio::test]
async fn test_in_memory_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("depot.json");

    let backend = InMemory::new();
    let doc = new_doc(json!({"list": [{"x": null}, {"id": "k"}]}));
    backend.insert(doc.clone()).await.unwrap();
    backend.save_to_file(&path).await.unwrap();

    let loaded = InMemory::load_from_file(&path).await.unwrap();
    let restored = loaded.get(&doc.id).await.unwrap();
    assert_eq!(restored, doc);
    assert!(restored.credential.matches(doc.credential.as_str()));
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use jsondepot::backend::database::Sqlite;

    use super::*;

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depot.db");
        let doc = new_doc(json!({"a": [{"b": "c"}]}));

        {
            let backend = Sqlite::open_sqlite(&path).await.unwrap();
            backend.insert(doc.clone()).await.unwrap();
            backend.close().await;
        }

        let backend = Sqlite::open_sqlite(&path).await.unwrap();
        let stored = backend.get(&doc.id).await.unwrap();
        assert_eq!(stored.data, doc.data);
        assert_eq!(stored.watermark, doc.watermark);
        assert_eq!(stored.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn test_schema_version_is_recorded() {
        let backend = Sqlite::sqlite_in_memory().await.unwrap();
        let version = jsondepot::backend::database::sql::schema::stored_version(&backend)
            .await
            .unwrap();
        assert_eq!(
            version,
            Some(jsondepot::backend::database::sql::schema::SCHEMA_VERSION)
        );
    }
}
