use crate::error::{Result, ShareError};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3002";
const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_SESSION_FILE: &str = ".session";

/// Where the client talks to and where it keeps its session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external API server.
    pub api_url: String,
    /// Web origin that serves the public `/files/{id}` page.
    pub origin: String,
    pub session_file: PathBuf,
    /// No timeout unless configured.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("SHARELINK_API_URL") {
            config.api_url = url;
        }
        if let Some(origin) = lookup("SHARELINK_ORIGIN") {
            config.origin = origin;
        }
        if let Some(path) = lookup("SHARELINK_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(secs) = lookup("SHARELINK_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| {
                    ShareError::Config(format!(
                        "SHARELINK_TIMEOUT_SECS must be a positive integer, got '{}'",
                        secs
                    ))
                })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        config.normalize()
    }

    /// Override the API URL and origin, e.g. from command-line flags.
    pub fn with_overrides(mut self, api_url: Option<String>, origin: Option<String>) -> Result<Self> {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(origin) = origin {
            self.origin = origin;
        }
        self.normalize()
    }

    fn normalize(mut self) -> Result<Self> {
        self.api_url = self.api_url.trim().trim_end_matches('/').to_string();
        self.origin = self.origin.trim().trim_end_matches('/').to_string();

        for (name, value) in [("API URL", &self.api_url), ("origin", &self.origin)] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ShareError::Config(format!(
                    "{} must start with http:// or https://, got '{}'",
                    name, value
                )));
            }
        }

        Ok(self)
    }

    /// Public share link for an uploaded file.
    pub fn share_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.origin, file_id)
    }
}
