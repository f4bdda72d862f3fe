//! The store write path over the backend chosen by `TEST_BACKEND`.

use std::{collections::HashSet, sync::Arc};

use jsondepot::{
    Error, Store,
    store::{StoreConfig, StoreError},
    value::Value,
};
use serde_json::json;

use crate::helpers::{create_doc, j, p, test_backend, test_store, v};

#[tokio::test]
async fn test_document_lifecycle() {
    let store = test_store().await;
    let (doc, key) = create_doc(&store, json!({"todos": [{"task": "write"}]})).await;
    let key = Some(key.as_str());
    assert_eq!(doc.watermark, 2);
    assert_eq!(doc.credential.as_str().len(), 64);

    let added = store
        .append(&doc.id, &p("todos"), key, v(json!({"task": "test"})))
        .await
        .unwrap();
    assert_eq!(j(&added), json!({"id": 2, "task": "test"}));

    let done = store
        .merge_at(&doc.id, &p("todos/1"), key, v(json!({"done": true})))
        .await
        .unwrap();
    assert_eq!(j(&done), json!({"id": 1, "task": "write", "done": true}));

    let title = store
        .set_at(&doc.id, &p("todos/2/task"), key, Value::from("test more"))
        .await
        .unwrap();
    assert_eq!(title, Value::from("test more"));

    let deleted = store.delete_at(&doc.id, &p("todos/1"), key).await.unwrap();
    assert_eq!(deleted.get("done"), Some(&Value::from(true)));

    let todos = store.resolve(&doc.id, &p("todos")).await.unwrap();
    assert_eq!(j(&todos), json!([{"id": 2, "task": "test more"}]));

    let stored = store.get(&doc.id).await.unwrap();
    assert_eq!(stored.version, 4);
    assert_eq!(stored.watermark, 3);
    assert!(stored.updated_at >= stored.created_at);

    let last = store.destroy(&doc.id, key).await.unwrap();
    assert_eq!(j(&last), json!({"todos": [{"id": 2, "task": "test more"}]}));
    assert!(store.get(&doc.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_replace_keeps_watermark_rising() {
    let store = test_store().await;
    let (doc, key) = create_doc(&store, json!([{"a": 1}, {"a": 2}])).await;
    assert_eq!(doc.watermark, 3);

    let data = store
        .replace(&doc.id, Some(&key), v(json!([{"b": 1}])))
        .await
        .unwrap();
    assert_eq!(j(&data), json!([{"id": 3, "b": 1}]));
    assert_eq!(store.get(&doc.id).await.unwrap().watermark, 4);
}

#[tokio::test]
async fn test_request_checks_happen_before_lookup() {
    let store = test_store().await;
    let (doc, key) = create_doc(&store, json!({"a": {}})).await;

    // A missing body is rejected before the credential is looked at.
    let err = store.merge_at(&doc.id, &p("a"), None, Value::Null).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::EmptyBody)));

    let err = store.merge_at(&doc.id, &p("a"), None, v(json!({"b": 1}))).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::MissingCredential)));
    assert_eq!(
        err.to_string(),
        "Need to pass an apikey in header as \"x-apikey\""
    );

    let missing = Store::parse_id("0b0b0b0b-0000-4000-8000-000000000000").unwrap();
    let err = store
        .merge_at(&missing, &p("a"), Some(&key), v(json!({"b": 1})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = store
        .merge_at(&doc.id, &p("a"), Some("other"), v(json!({"b": 1})))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Mismatching apikey for given JSON ID, make sure this is your resource"
    );
}

#[tokio::test]
async fn test_path_errors_surface_from_store() {
    let store = test_store().await;
    let (doc, key) = create_doc(&store, json!({"list": [], "name": "x"})).await;
    let key = Some(key.as_str());

    let err = store.resolve(&doc.id, &p("nope")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.module(), "tree");

    let err = store
        .append(&doc.id, &p("name"), key, v(json!({"a": 1})))
        .await
        .unwrap_err();
    assert!(err.is_type_error());

    let err = store.delete_at(&doc.id, &p(""), key).await.unwrap_err();
    assert!(err.is_validation_error());

    // Nothing above was committed.
    assert_eq!(store.get(&doc.id).await.unwrap().version, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_are_not_lost() {
    let backend = test_backend().await;
    let store = Store::with_config(
        backend,
        StoreConfig {
            max_write_retries: 64,
        },
    );
    let (doc, key) = create_doc(&store, json!({"log": []})).await;
    let key = Arc::new(key);

    let mut handles = Vec::new();
    for n in 0..16 {
        let store = store.clone();
        let key = Arc::clone(&key);
        let id = doc.id;
        handles.push(tokio::spawn(async move {
            store
                .append(&id, &p("log"), Some(key.as_str()), v(json!({"n": n})))
                .await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let stored = handle.await.unwrap().unwrap();
        ids.insert(stored.get("id").and_then(Value::as_u64).unwrap());
    }
    assert_eq!(ids, (1..=16).collect::<HashSet<u64>>());

    let log = store.resolve(&doc.id, &p("log")).await.unwrap();
    assert_eq!(log.as_list().map(|items| items.len()), Some(16));

    let stored = store.get(&doc.id).await.unwrap();
    assert_eq!(stored.watermark, 17);
    assert_eq!(stored.version, 16);
}
