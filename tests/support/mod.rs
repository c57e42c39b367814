//! In-process stand-in for the share API, served on a random localhost port.
#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sharelink::api::ApiClient;
use sharelink::config::Config;
use sharelink::session::{Session, SessionStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::RwLock;

pub const TOKEN: &str = "test-token-0123456789";
pub const ORIGIN: &str = "https://share.example.com";

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: String,
    pub name: String,
    pub file_type: String,
    pub content: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
}

/// Switches for the misbehaving-server scenarios.
#[derive(Debug, Default)]
pub struct Behavior {
    pub list_html: bool,
    pub list_without_files: bool,
    pub upload_plain_text: bool,
    pub upload_html: bool,
    pub upload_error: Option<(StatusCode, serde_json::Value)>,
    pub include_presigned_in_list: bool,
    /// Answer a successful upload with only `message`, `fileId` and `expiresAt`.
    pub upload_minimal_body: bool,
    /// Reject the public lookup with 401.
    pub lookup_unauthorized: bool,
    /// Serve downloads chunked, without Content-Length.
    pub stream_downloads: bool,
    pub next_file_id: Option<String>,
    pub fixed_expires_at: Option<DateTime<Utc>>,
}

pub struct ApiState {
    pub base_url: String,
    pub files: RwLock<Vec<StoredFile>>,
    pub behavior: RwLock<Behavior>,
    pub upload_queries: RwLock<Vec<HashMap<String, String>>>,
    requests: AtomicUsize,
}

impl ApiState {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn seed(&self, name: &str, file_type: &str, content: &[u8], expires_in_hours: i64) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.files.write().await.push(StoredFile {
            id: id.clone(),
            name: name.to_string(),
            file_type: file_type.to_string(),
            content: content.to_vec(),
            created_at: now,
            expiration_time: now + Duration::hours(expires_in_hours),
        });
        id
    }
}

pub struct FakeApi {
    pub state: Arc<ApiState>,
    pub config: Config,
    pub sessions: SessionStore,
    pub client: ApiClient,
    _dir: TempDir,
}

impl FakeApi {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = Arc::new(ApiState {
            base_url: base_url.clone(),
            files: RwLock::new(Vec::new()),
            behavior: RwLock::new(Behavior::default()),
            upload_queries: RwLock::new(Vec::new()),
            requests: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/upload", post(upload))
            .route("/api/files", get(list_files))
            .route("/api/files/:id", get(get_file))
            .route("/blob/:id", get(blob))
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake API stopped");
        });

        let dir = TempDir::new().unwrap();
        let config = Config::default()
            .with_overrides(Some(base_url), Some(ORIGIN.to_string()))
            .unwrap();
        let config = Config {
            session_file: dir.path().join(".session"),
            ..config
        };
        let sessions = SessionStore::new(config.session_file.clone());
        let client = ApiClient::new(&config).unwrap();

        Self { state, config, sessions, client, _dir: dir }
    }

    pub fn log_in(&self) {
        self.sessions.save(&Session { token: TOKEN.to_string() }).unwrap();
    }

    pub fn log_in_with(&self, token: &str) {
        self.sessions.save(&Session { token: token.to_string() }).unwrap();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid token" }))).into_response()
}

fn record_json(file: &StoredFile) -> serde_json::Value {
    json!({
        "id": file.id,
        "name": file.name,
        "fileType": file.file_type,
        "createdAt": file.created_at.to_rfc3339(),
        "expirationTime": file.expiration_time.to_rfc3339(),
    })
}

async fn upload(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    state.hit();
    if !authorized(&headers) {
        return unauthorized();
    }
    state.upload_queries.write().await.push(query.clone());

    let behavior = state.behavior.read().await;
    if behavior.upload_html {
        return (
            StatusCode::BAD_GATEWAY,
            [(header::CONTENT_TYPE, "text/html")],
            "<!DOCTYPE html><html><body>Bad Gateway</body></html>",
        )
            .into_response();
    }
    if behavior.upload_plain_text {
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], "ok").into_response();
    }
    if let Some((status, body)) = &behavior.upload_error {
        return (*status, Json(body.clone())).into_response();
    }

    let hours: i64 = query
        .get("expirationHours")
        .and_then(|h| h.parse().ok())
        .unwrap_or(24);
    let now = Utc::now();
    let file = StoredFile {
        id: behavior
            .next_file_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: query.get("fileName").cloned().unwrap_or_default(),
        file_type: query.get("fileType").cloned().unwrap_or_else(|| "txt".to_string()),
        content: body.to_vec(),
        created_at: now,
        expiration_time: behavior.fixed_expires_at.unwrap_or(now + Duration::hours(hours)),
    };
    let minimal = behavior.upload_minimal_body;
    drop(behavior);

    let response = if minimal {
        json!({
            "message": "ok",
            "fileId": file.id,
            "expiresAt": file.expiration_time.to_rfc3339(),
        })
    } else {
        json!({
            "message": "File uploaded successfully",
            "fileId": file.id,
            "fileName": file.name,
            "fileType": file.file_type,
            "expiresAt": file.expiration_time.to_rfc3339(),
            "uploadUrl": format!("{}/blob/{}", state.base_url, file.id),
        })
    };
    state.files.write().await.push(file);

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn list_files(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    state.hit();
    if !authorized(&headers) {
        return unauthorized();
    }

    let behavior = state.behavior.read().await;
    if behavior.list_html {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            "<!DOCTYPE html><html><body>You are about to visit...</body></html>",
        )
            .into_response();
    }
    if behavior.list_without_files {
        return Json(json!({ "items": [] })).into_response();
    }

    let files = state.files.read().await;
    let records: Vec<_> = files
        .iter()
        .map(|f| {
            let mut record = record_json(f);
            if behavior.include_presigned_in_list {
                record["presignedUrl"] = json!(format!("{}/blob/{}?listed=1", state.base_url, f.id));
            }
            record
        })
        .collect();

    Json(json!({ "files": records })).into_response()
}

async fn get_file(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> Response {
    state.hit();
    if state.behavior.read().await.lookup_unauthorized {
        return unauthorized();
    }
    let files = state.files.read().await;
    let Some(file) = files.iter().find(|f| f.id == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "File not found" }))).into_response();
    };
    if file.expiration_time <= Utc::now() {
        return (StatusCode::GONE, Json(json!({ "message": "File expired" }))).into_response();
    }

    Json(json!({
        "file": record_json(file),
        "presignedUrl": format!("{}/blob/{}", state.base_url, file.id),
    }))
    .into_response()
}

async fn blob(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> Response {
    state.hit();
    let files = state.files.read().await;
    let Some(file) = files.iter().find(|f| f.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let content = file.content.clone();
    drop(files);

    if state.behavior.read().await.stream_downloads {
        let chunks: Vec<Result<Bytes, std::io::Error>> = content
            .chunks(1000)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
    }

    ([(header::CONTENT_TYPE, "application/octet-stream")], content).into_response()
}
