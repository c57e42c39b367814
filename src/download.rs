//! Streamed download with progress.
//!
//! A response body is consumed as a finite, single-use stream of byte chunks.
//! Chunks are appended in arrival order into one buffer, a [`Progress`] is
//! reported after every chunk, and only once the stream is exhausted is the
//! buffer written to disk. A failed read drops the partial buffer, so nothing
//! is ever saved from an incomplete transfer.

use crate::error::{Result, ShareError};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Upper bound on the up-front allocation taken from an advertised length.
const MAX_PREALLOCATE: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub received: u64,
    pub total: Option<u64>,
    /// `None` when the server did not advertise a length.
    pub percent: Option<u8>,
}

impl Progress {
    fn new(received: u64, total: Option<u64>) -> Self {
        Self {
            received,
            total,
            percent: total.map(|t| percent(received, t)),
        }
    }
}

/// `floor(received * 100 / total)`, clamped to 100. An empty payload is
/// complete by definition.
pub fn percent(received: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (received as u128 * 100) / total as u128;
    pct.min(100) as u8
}

/// Drain `chunks` into one contiguous buffer.
///
/// `total` is the advertised length, if any. When it is known, a stream that
/// ends short of it is treated as an interrupted transfer.
pub async fn accumulate<S, E, F>(chunks: S, total: Option<u64>, mut on_progress: F) -> Result<Vec<u8>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    F: FnMut(Progress),
{
    let mut chunks = std::pin::pin!(chunks);
    let capacity = total.unwrap_or(0).min(MAX_PREALLOCATE) as usize;
    let mut buffer = Vec::with_capacity(capacity);
    let mut received: u64 = 0;
    let mut chunk_count = 0usize;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| ShareError::Download(e.into()))?;
        buffer.extend_from_slice(&chunk);
        received += chunk.len() as u64;
        chunk_count += 1;
        on_progress(Progress::new(received, total));
    }

    if let Some(total) = total {
        if received < total {
            return Err(ShareError::Download(
                format!("stream ended after {} of {} bytes", received, total).into(),
            ));
        }
        if chunk_count == 0 {
            on_progress(Progress::new(0, Some(total)));
        }
    }

    debug!(bytes = received, chunks = chunk_count, "download stream exhausted");
    Ok(buffer)
}

/// Write a fully accumulated payload to `destination`.
///
/// The bytes go to a temporary file next to the destination which is then
/// renamed into place; if anything fails the temporary file is removed.
pub fn save(bytes: &[u8], destination: &Path) -> Result<PathBuf> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(destination).map_err(|e| ShareError::Io(e.error))?;

    debug!(path = %destination.display(), bytes = bytes.len(), "download saved");
    Ok(destination.to_path_buf())
}

/// Reduce a server-supplied file name to a bare name safe to create in the
/// current directory.
pub fn suggested_file_name(name: &str) -> String {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .map(str::to_string)
        .unwrap_or_else(|| "download".to_string())
}
