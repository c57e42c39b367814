use bytes::Bytes;
use crate::config::Config;
use crate::download::{self, Progress};
use crate::error::{Result, ShareError};
use crate::models::{ErrorBody, FileListResponse, FileLookupResponse, FileType, UploadResult};
use crate::session::Session;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Thin HTTP client for the external share API.
///
/// Every response is classified into [`ShareError`] here so callers only see
/// typed outcomes. A 401 from any endpoint becomes [`ShareError::Unauthorized`];
/// clearing the stored token is the session store's job.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Parameters for `POST /api/upload`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub file_type: FileType,
    pub expiration_hours: u32,
    pub bytes: Bytes,
}

impl UploadRequest {
    pub fn query(&self) -> [(&'static str, String); 3] {
        [
            ("fileName", self.file_name.clone()),
            ("fileType", self.file_type.to_string()),
            ("expirationHours", self.expiration_hours.to_string()),
        ]
    }
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(ShareError::network("Failed to create HTTP client"))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn upload(&self, session: &Session, request: &UploadRequest) -> Result<UploadResult> {
        let url = self.build_url("/api/upload");
        debug!(%url, file_name = %request.file_name, bytes = request.bytes.len(), "uploading");

        let response = self
            .client
            .post(&url)
            .query(&request.query())
            .header(AUTHORIZATION, session.bearer())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(request.bytes.clone())
            .send()
            .await
            .map_err(ShareError::network("An error occurred during upload"))?;

        let status = response.status();
        debug!(%status, "upload response");
        if status == StatusCode::UNAUTHORIZED {
            return Err(ShareError::Unauthorized);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(ShareError::network("An error occurred during upload"))?;

        if !content_type.contains("application/json") {
            return Err(if looks_like_html(&body) {
                ShareError::HtmlResponse { api_url: self.base_url.clone() }
            } else {
                ShareError::UnexpectedFormat {
                    content_type: if content_type.is_empty() {
                        "null".to_string()
                    } else {
                        content_type
                    },
                }
            });
        }

        if !status.is_success() {
            return Err(api_error(status, &body, "Upload failed"));
        }

        parse_json(&body)
    }

    pub async fn list_files(&self, session: &Session) -> Result<FileListResponse> {
        let url = self.build_url("/api/files");
        debug!(%url, "fetching files");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, session.bearer())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(ShareError::network(
                "Failed to fetch files. Please check your connection and try again.",
            ))?;

        let status = response.status();
        debug!(%status, "list response");
        if status == StatusCode::UNAUTHORIZED {
            return Err(ShareError::Unauthorized);
        }

        let body = response.text().await.map_err(ShareError::network(
            "Failed to fetch files. Please check your connection and try again.",
        ))?;

        if looks_like_html(&body) || body.trim_start().starts_with('<') {
            return Err(ShareError::HtmlResponse { api_url: self.base_url.clone() });
        }

        let value: serde_json::Value = parse_json(&body)?;

        if !status.is_success() {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Failed to fetch files ({})", status.as_u16()));
            return Err(ShareError::Api { status, message });
        }

        if !value.get("files").is_some_and(|f| f.is_array()) {
            return Err(ShareError::MissingFiles { preview: preview(&value.to_string(), 200) });
        }

        let response: FileListResponse = serde_json::from_value(value)
            .map_err(|_| ShareError::MalformedJson { preview: preview(&body, 100) })?;
        debug!(count = response.files.len(), "files loaded");
        Ok(response)
    }

    /// `GET /api/files/{id}`. Public; no credentials are sent.
    pub async fn get_file(&self, file_id: &str) -> Result<FileLookupResponse> {
        let url = self.build_url(&format!("/api/files/{}", file_id));
        debug!(%url, "resolving file");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ShareError::network("An error occurred while loading the file"))?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(ShareError::NotFound),
            StatusCode::GONE => return Err(ShareError::Expired),
            StatusCode::UNAUTHORIZED => return Err(ShareError::Unauthorized),
            _ => {}
        }

        let body = response
            .text()
            .await
            .map_err(ShareError::network("An error occurred while loading the file"))?;

        if !status.is_success() {
            return Err(api_error(status, &body, "Failed to load file"));
        }

        parse_json(&body)
    }

    /// Stream `url` into memory with progress, then save it to `destination`.
    pub async fn download<F>(&self, url: &str, destination: &Path, on_progress: F) -> Result<PathBuf>
    where
        F: FnMut(Progress),
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ShareError::Download(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "download refused");
            return Err(ShareError::Download(format!("server responded {}", status).into()));
        }

        let total = response.content_length();
        debug!(?total, "download started");
        let bytes = download::accumulate(response.bytes_stream(), total, on_progress).await?;
        download::save(&bytes, destination)
    }
}

fn looks_like_html(body: &str) -> bool {
    body.contains("<!DOCTYPE") || body.contains("<html")
}

fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "response is not valid JSON");
        ShareError::MalformedJson { preview: preview(body, 100) }
    })
}

fn api_error(status: StatusCode, body: &str, fallback: &str) -> ShareError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ShareError::Api { status, message }
}
