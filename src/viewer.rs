use crate::api::ApiClient;
use crate::download::{self, Progress};
use crate::error::{Result, ShareError};
use crate::models::{FileRecord, RenderKind};
use crate::session::SessionStore;
use std::path::{Path, PathBuf};
use tracing::info;

/// What the public file page shows for a resolved file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering {
    Image { url: String },
    Document { url: String },
    Download { url: String },
    Unavailable,
}

impl Rendering {
    pub fn url(&self) -> Option<&str> {
        match self {
            Rendering::Image { url } | Rendering::Document { url } | Rendering::Download { url } => {
                Some(url)
            }
            Rendering::Unavailable => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rendering::Image { .. } => "image",
            Rendering::Document { .. } => "document",
            Rendering::Download { .. } => "download",
            Rendering::Unavailable => "unavailable",
        }
    }
}

pub fn select_rendering(file: &FileRecord, presigned_url: &str) -> Rendering {
    if presigned_url.trim().is_empty() {
        return Rendering::Unavailable;
    }
    let url = presigned_url.to_string();
    match file.render_kind() {
        RenderKind::Image => Rendering::Image { url },
        RenderKind::Document => Rendering::Document { url },
        RenderKind::Other => Rendering::Download { url },
    }
}

#[derive(Debug, Clone)]
pub struct FileView {
    pub file: FileRecord,
    pub rendering: Rendering,
}

/// Resolve a share id. No session is needed; 404 and 410 come back as
/// `NotFound` and `Expired` and no rendering is chosen. A 401 still clears
/// whatever token is stored.
pub async fn open(api: &ApiClient, sessions: &SessionStore, file_id: &str) -> Result<FileView> {
    let lookup = api
        .get_file(file_id)
        .await
        .map_err(|e| sessions.on_error(e))?;
    let rendering = select_rendering(&lookup.file, &lookup.presigned_url);
    info!(file_id, kind = rendering.label(), "file resolved");
    Ok(FileView { file: lookup.file, rendering })
}

/// Resolve a share id and save the file, defaulting to the server's name.
pub async fn download<F>(
    api: &ApiClient,
    sessions: &SessionStore,
    file_id: &str,
    output: Option<&Path>,
    on_progress: F,
) -> Result<PathBuf>
where
    F: FnMut(Progress),
{
    let view = open(api, sessions, file_id).await?;
    let url = view
        .rendering
        .url()
        .ok_or_else(|| ShareError::Download("no download URL available".into()))?;

    let destination = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(download::suggested_file_name(&view.file.name)),
    };
    api.download(url, &destination, on_progress).await
}
