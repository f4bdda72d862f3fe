//! Backend creation and utility functions.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use jsondepot::backend::{
    BackendImpl,
    database::{InMemory, Postgres, Sqlite},
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "jsondepot.db";
const JSON_FILE: &str = "jsondepot.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

fn data_dir(config: &BackendConfig) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Where the in-memory backend keeps its JSON snapshot.
pub fn json_path(config: &BackendConfig) -> PathBuf {
    data_dir(config).join(JSON_FILE)
}

/// Human-readable description of the configured backend, safe to print.
pub fn backend_label(config: &BackendConfig) -> String {
    let dir = data_dir(config);
    match config.backend {
        Backend::Sqlite => format!("sqlite ({})", dir.join(SQLITE_FILE).display()),
        Backend::Postgres => match &config.postgres_url {
            Some(url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres (no url)".to_string(),
        },
        Backend::Inmemory => format!("inmemory ({})", dir.join(JSON_FILE).display()),
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(config);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match config.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!(path = %db_path.display(), "Using SQLite backend");
            Ok(Arc::new(Sqlite::open_sqlite(&db_path).await?))
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or JSONDEPOT_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!(url = %display_url, "Connecting to PostgreSQL backend");

            match Postgres::connect_postgres(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            Ok(Arc::new(load_in_memory(&json_path).await?))
        }
    }
}

async fn load_in_memory(path: &Path) -> Result<InMemory, Box<dyn std::error::Error>> {
    tracing::info!(path = %path.display(), "Using in-memory backend with persistence");
    let backend = InMemory::load_from_file(path).await?;
    Ok(backend)
}
