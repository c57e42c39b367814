use crate::api::{ApiClient, UploadRequest};
use crate::config::Config;
use crate::error::{Result, ShareError};
use crate::models::FileType;
use crate::session::SessionStore;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Largest file accepted for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

pub const EXPIRATION_PRESETS: [u32; 5] = [1, 6, 12, 24, 48];
pub const DEFAULT_EXPIRATION_HOURS: u32 = 24;

pub fn validate_size(size: u64) -> Result<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ShareError::FileTooLarge { size });
    }
    Ok(())
}

/// Label for a link lifetime, the way the expiry picker names it. Values off
/// the preset list are marked custom.
pub fn expiration_label(hours: u32) -> String {
    let unit = if hours == 1 { "hour" } else { "hours" };
    if EXPIRATION_PRESETS.contains(&hours) {
        format!("{} {}", hours, unit)
    } else {
        format!("{} {} (custom)", hours, unit)
    }
}

/// Accepts any positive whole number of hours.
pub fn parse_expiration(input: &str) -> Result<u32> {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|h| *h > 0)
        .ok_or(ShareError::InvalidExpiration)
}

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Read a file from disk. The size is checked from metadata before the
    /// contents are read, so an oversized file is never loaded.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(ShareError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }
        validate_size(metadata.len())?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let bytes = fs::read(path)?;
        Ok(Self::new(name, bytes))
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_file_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub file_id: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ViewState {
    Upload,
    FileSelected(SelectedFile),
    LinkGenerated { file: SelectedFile, link: ShareLink },
}

/// The three-step share flow: pick a file, choose an expiry, get a link.
#[derive(Debug)]
pub struct UploadFlow {
    state: ViewState,
    expiration_hours: u32,
}

impl Default for UploadFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadFlow {
    pub fn new() -> Self {
        Self {
            state: ViewState::Upload,
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn expiration_hours(&self) -> u32 {
        self.expiration_hours
    }

    /// Rejects oversized files locally and leaves the current state untouched.
    pub fn select(&mut self, file: SelectedFile) -> Result<()> {
        validate_size(file.size)?;
        debug!(name = %file.name, size = file.size, "file selected");
        self.state = ViewState::FileSelected(file);
        Ok(())
    }

    pub fn remove(&mut self) {
        self.state = ViewState::Upload;
    }

    pub fn set_expiration(&mut self, hours: u32) -> Result<()> {
        if hours == 0 {
            return Err(ShareError::InvalidExpiration);
        }
        self.expiration_hours = hours;
        Ok(())
    }

    pub fn request(&self) -> Result<UploadRequest> {
        let file = match &self.state {
            ViewState::FileSelected(file) => file,
            _ => return Err(ShareError::NoFileSelected),
        };
        Ok(UploadRequest {
            file_name: file.name.clone(),
            file_type: file.file_type(),
            expiration_hours: self.expiration_hours,
            bytes: file.bytes.clone(),
        })
    }

    /// Upload the selected file and move to the link-generated state.
    ///
    /// On any error the flow stays in `FileSelected` so the user can retry by
    /// hand. A 401 also clears the stored session.
    pub async fn generate(
        &mut self,
        api: &ApiClient,
        sessions: &SessionStore,
        config: &Config,
    ) -> Result<ShareLink> {
        let request = self.request()?;
        let session = sessions.require()?;

        let result = api
            .upload(&session, &request)
            .await
            .map_err(|e| sessions.on_error(e))?;

        let link = ShareLink {
            url: config.share_url(&result.file_id),
            file_id: result.file_id,
            expires_at: result.expires_at,
        };
        info!(file_id = %link.file_id, expires_at = %link.expires_at, "share link generated");

        if let ViewState::FileSelected(file) = std::mem::replace(&mut self.state, ViewState::Upload) {
            self.state = ViewState::LinkGenerated { file, link: link.clone() };
        }
        Ok(link)
    }

    /// Start over: no file, default expiry.
    pub fn reset(&mut self) {
        self.state = ViewState::Upload;
        self.expiration_hours = DEFAULT_EXPIRATION_HOURS;
    }
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn format_time_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = expires_at - now;
    if diff <= chrono::Duration::zero() {
        return "Expired".to_string();
    }
    let hours = diff.num_hours();
    let minutes = diff.num_minutes() % 60;
    format!("{}h {}m", hours, minutes)
}
