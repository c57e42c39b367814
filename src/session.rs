use crate::error::{Result, ShareError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

impl Session {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Token with everything but the first and last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

/// The single piece of persisted client state: an opaque bearer token in a
/// JSON file. Handed to every operation that needs authorization.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).map_err(std::io::Error::from)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// A missing, unreadable or empty-token session file all mean "no session".
    pub fn load(&self) -> Option<Session> {
        let data = fs::read_to_string(&self.path).ok()?;
        let session: Session = match serde_json::from_str(&data) {
            Ok(session) => session,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                return None;
            }
        };
        if session.token.trim().is_empty() {
            return None;
        }
        Some(session)
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Gate for protected operations. Runs before any request is built.
    pub fn require(&self) -> Result<Session> {
        self.load().ok_or(ShareError::LoginRequired)
    }

    /// Drop the stored token when a request came back unauthorized, then hand
    /// the error back unchanged.
    pub fn on_error(&self, err: ShareError) -> ShareError {
        if err.is_unauthorized() {
            if let Err(clear_err) = self.clear() {
                warn!(error = %clear_err, "failed to clear session after 401");
            }
        }
        err
    }
}
