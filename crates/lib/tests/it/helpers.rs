use std::sync::Arc;

use jsondepot::{
    Document, Store,
    backend::{BackendImpl, database::InMemory},
    path::PathBuf,
    value::Value,
};

/// Creates a test backend based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory backend (default)
/// - "sqlite": SQLite in-memory backend (requires `sqlite` feature)
///
/// # Example
/// ```bash
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
/// ```
pub async fn test_backend() -> Arc<dyn BackendImpl> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use jsondepot::backend::database::Sqlite;
                Arc::new(
                    Sqlite::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite backend"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("inmemory") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => panic!("Unknown TEST_BACKEND: {other}"),
    }
}

pub async fn test_store() -> Store {
    Store::new(test_backend().await)
}

/// Builds a value from a `serde_json::json!` literal.
pub fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Renders a value back to JSON for comparison against literals.
pub fn j(value: &Value) -> serde_json::Value {
    serde_json::Value::from(value)
}

pub fn p(raw: &str) -> PathBuf {
    PathBuf::normalize(raw)
}

/// Creates a document and returns it along with its credential.
pub async fn create_doc(store: &Store, json: serde_json::Value) -> (Document, String) {
    let doc = store.create(v(json)).await.expect("Failed to create document");
    let key = doc.credential.as_str().to_string();
    (doc, key)
}
