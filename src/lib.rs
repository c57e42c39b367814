//! Client for a time-limited file sharing API: upload a file, get a share
//! link, list your files, and view or download shared files.

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod listing;
pub mod models;
pub mod session;
pub mod upload;
pub mod viewer;

pub use error::{ErrorKind, Result, ShareError};

/// Initialize tracing for the CLI. Logs go to stderr; stdout is for output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
