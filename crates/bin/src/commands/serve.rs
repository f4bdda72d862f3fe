//! Serve command - runs the jsondepot HTTP server.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{MethodRouter, get},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::signal::unix::{SignalKind, signal};

use jsondepot::{
    Document, Store,
    backend::{
        BackendImpl,
        database::{DbKind, InMemory, SqlxBackend},
    },
    path::PathBuf,
    store::StoreConfig,
    value::Value,
};

use crate::backend::{backend_label, create_backend, json_path};
use crate::cli::ServeArgs;

const APIKEY_HEADER: &str = "x-apikey";
const ALLOW_HEADERS: &str = "Content-Type, x-apikey";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS, DELETE, PUT, PATCH";

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Store,
}

/// Errors a handler can answer with, rendered as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Depot(#[from] jsondepot::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        let err = match self {
            ApiError::InvalidBody(_) => return StatusCode::BAD_REQUEST,
            ApiError::Depot(err) => err,
        };
        if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else if err.is_permission_denied() {
            StatusCode::FORBIDDEN
        } else if err.is_authentication_error() {
            StatusCode::UNAUTHORIZED
        } else if err.is_conflict() {
            StatusCode::CONFLICT
        } else if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status();
        if code.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = code.as_u16(), error = %self, "Request rejected");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Body of a successful document creation
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    id: String,
    apikey: String,
    data: Value,
    highest_created_id: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Document> for CreatedResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id.to_string(),
            apikey: doc.credential.as_str().to_string(),
            data: doc.data,
            highest_created_id: doc.watermark,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// Run the jsondepot server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let store = Store::with_config(
        backend.clone(),
        StoreConfig {
            max_write_retries: args.max_write_retries,
        },
    );
    let app = router(store);

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        backend = %backend_label(&args.backend_config),
        max_write_retries = args.max_write_retries,
        "jsondepot server started"
    );
    println!("jsondepot server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  POST   /api/json              - Create a document");
    println!("  GET    /api/json/{{id}}         - Read a document");
    println!("  PUT    /api/json/{{id}}         - Replace a document");
    println!("  DELETE /api/json/{{id}}         - Delete a document");
    println!("  GET    /api/json/{{id}}/{{path}}  - Read a sub-resource");
    println!("  POST   /api/json/{{id}}/{{path}}  - Append to a list");
    println!("  PUT    /api/json/{{id}}/{{path}}  - Overwrite a sub-resource");
    println!("  PATCH  /api/json/{{id}}/{{path}}  - Merge into a sub-resource");
    println!("  DELETE /api/json/{{id}}/{{path}}  - Delete a sub-resource");
    println!("  GET    /health                - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let snapshot_path = json_path(&args.backend_config);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
                _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
            }
        })
        .await?;

    // Save documents on shutdown (only needed for InMemory backend)
    if let Some(in_memory_backend) = backend.as_any().downcast_ref::<InMemory>() {
        match in_memory_backend.save_to_file(&snapshot_path).await {
            Ok(_) => {
                tracing::info!(path = %snapshot_path.display(), "Documents saved");
                println!("\nDocuments saved successfully");
            }
            Err(e) => {
                tracing::error!("Failed to save documents: {e:?}");
                eprintln!("Failed to save documents: {e:?}");
            }
        }
    } else if let Some(sqlx) = backend.as_any().downcast_ref::<SqlxBackend>() {
        sqlx.close().await;
    }

    println!("Server shut down");
    Ok(())
}

/// Builds the HTTP surface over `store`.
fn router(store: Store) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/json", axum::routing::post(handle_create))
        .route("/api/json/{id}", document_routes())
        .route("/api/json/{id}/", document_routes())
        .route(
            "/api/json/{id}/{*path}",
            get(handle_resolve)
                .post(handle_append)
                .put(handle_set)
                .patch(handle_merge)
                .delete(handle_delete),
        )
        .fallback(handle_not_found)
        .layer(middleware::from_fn(cors))
        .with_state(AppState { store })
}

/// Whole-document methods. POST and PATCH address the root value, the same
/// as a sub-resource write with an empty path.
fn document_routes() -> MethodRouter<AppState> {
    get(handle_get)
        .post(handle_append_root)
        .put(handle_replace)
        .patch(handle_merge_root)
        .delete(handle_destroy)
}

/// Adds CORS headers to every response and answers preflight requests.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    response
}

fn apikey(headers: &HeaderMap) -> Option<&str> {
    headers.get(APIKEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Parses a request body. An empty body becomes `null`, which the store
/// rejects as missing.
fn parse_body(body: &Bytes) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

fn deleted(value: Value) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "deleted": value }))
}

// ============================================================================
// Whole-document Handlers
// ============================================================================

/// Handler for POST /api/json - Create a document
async fn handle_create(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let document = state.store.create(parse_body(&body)?).await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

/// Handler for GET /api/json/{id}
async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = Store::parse_id(&id)?;
    Ok(Json(state.store.get(&id).await?.data))
}

/// Handler for PUT /api/json/{id}
async fn handle_replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = parse_body(&body)?;
    let id = Store::parse_id(&id)?;
    Ok(Json(state.store.replace(&id, apikey(&headers), body).await?))
}

/// Handler for DELETE /api/json/{id}
async fn handle_destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let id = Store::parse_id(&id)?;
    Ok(deleted(state.store.destroy(&id, apikey(&headers)).await?))
}

// ============================================================================
// Sub-resource Handlers
// ============================================================================

/// Handler for GET /api/json/{id}/{*path}
async fn handle_resolve(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let id = Store::parse_id(&id)?;
    let path = PathBuf::normalize(&path);
    Ok(Json(state.store.resolve(&id, &path).await?))
}

/// Handler for POST /api/json/{id}/{*path}
async fn handle_append(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    append(&state, &id, &path, &headers, &body).await
}

/// Handler for POST /api/json/{id} - Append to a root-level list
async fn handle_append_root(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    append(&state, &id, "", &headers, &body).await
}

async fn append(
    state: &AppState,
    id: &str,
    path: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let body = parse_body(body)?;
    let id = Store::parse_id(id)?;
    let path = PathBuf::normalize(path);
    let stored = state
        .store
        .append(&id, &path, apikey(headers), body)
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Handler for PUT /api/json/{id}/{*path}
async fn handle_set(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let body = parse_body(&body)?;
    let id = Store::parse_id(&id)?;
    let path = PathBuf::normalize(&path);
    Ok(Json(
        state.store.set_at(&id, &path, apikey(&headers), body).await?,
    ))
}

/// Handler for PATCH /api/json/{id}/{*path}
async fn handle_merge(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    merge(&state, &id, &path, &headers, &body).await
}

/// Handler for PATCH /api/json/{id} - Merge into a root-level map
async fn handle_merge_root(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    merge(&state, &id, "", &headers, &body).await
}

async fn merge(
    state: &AppState,
    id: &str,
    path: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> ApiResult<Json<Value>> {
    let body = parse_body(body)?;
    let id = Store::parse_id(id)?;
    let path = PathBuf::normalize(path);
    Ok(Json(
        state
            .store
            .merge_at(&id, &path, apikey(headers), body)
            .await?,
    ))
}

/// Handler for DELETE /api/json/{id}/{*path}
async fn handle_delete(
    State(state): State<AppState>,
    Path((id, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let id = Store::parse_id(&id)?;
    let path = PathBuf::normalize(&path);
    Ok(deleted(
        state.store.delete_at(&id, &path, apikey(&headers)).await?,
    ))
}

// ============================================================================
// Health and Fallback Handlers
// ============================================================================

/// Handler for GET /health - Health check endpoint
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: backend_kind(state.store.backend().as_ref()),
    })
}

fn backend_kind(backend: &dyn BackendImpl) -> &'static str {
    if let Some(sqlx) = backend.as_any().downcast_ref::<SqlxBackend>() {
        match sqlx.kind() {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    } else if backend.as_any().is::<InMemory>() {
        "inmemory"
    } else {
        "unknown"
    }
}

async fn handle_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found" })),
    )
}
