use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advisory type tag sent alongside an upload. Derived from the file name
/// only; the content is never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Txt,
    Pdf,
    Jpg,
}

impl FileType {
    pub fn from_file_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => FileType::Pdf,
            "jpg" | "jpeg" | "png" | "gif" => FileType::Jpg,
            _ => FileType::Txt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Txt => "txt",
            FileType::Pdf => "pdf",
            FileType::Jpg => "jpg",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a shared file is presented, resolved once from the server's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Image,
    Document,
    Other,
}

impl RenderKind {
    pub fn from_type_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "jpg" | "png" | "gif" => RenderKind::Image,
            "pdf" => RenderKind::Document,
            _ => RenderKind::Other,
        }
    }
}

/// Body of a successful upload. Only the id and expiry are needed to build a
/// share link; the rest is echoed back by some servers and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(default)]
    pub message: Option<String>,
    pub file_id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub upload_url: Option<String>,
}

/// Server-owned metadata for one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presigned_url: Option<String>,
}

impl FileRecord {
    pub fn render_kind(&self) -> RenderKind {
        RenderKind::from_type_tag(&self.file_type)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLookupResponse {
    pub file: FileRecord,
    #[serde(default)]
    pub presigned_url: String,
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
