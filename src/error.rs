use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShareError>;

/// Coarse category of a [`ShareError`], used to decide how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Format,
    Application,
    Network,
    Authorization,
    Local,
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("File size must be less than 10MB ({size} bytes given)")]
    FileTooLarge { size: u64 },

    #[error("Expiration must be a positive number of hours")]
    InvalidExpiration,

    #[error("No file selected")]
    NoFileSelected,

    #[error("API server returned HTML instead of JSON. Please check that your API server is running at {api_url}")]
    HtmlResponse { api_url: String },

    #[error("Unexpected response format ({content_type}). Expected JSON.")]
    UnexpectedFormat { content_type: String },

    #[error("Failed to parse response as JSON. Response starts with: {preview}")]
    MalformedJson { preview: String },

    #[error("No files data returned from server. Response: {preview}")]
    MissingFiles { preview: String },

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("File not found")]
    NotFound,

    #[error("This file has expired")]
    Expired,

    #[error("{context}")]
    Network {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to download file")]
    Download(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("You must be logged in. Use: sharelink login --token <token>")]
    LoginRequired,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0} functionality not yet implemented")]
    NotImplemented(&'static str),
}

impl ShareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileTooLarge { .. } | Self::InvalidExpiration | Self::NoFileSelected => {
                ErrorKind::Validation
            }
            Self::HtmlResponse { .. }
            | Self::UnexpectedFormat { .. }
            | Self::MalformedJson { .. }
            | Self::MissingFiles { .. } => ErrorKind::Format,
            Self::Api { .. } | Self::NotFound | Self::Expired => ErrorKind::Application,
            Self::Network { .. } | Self::Download(_) => ErrorKind::Network,
            Self::Unauthorized | Self::LoginRequired => ErrorKind::Authorization,
            Self::Io(_) | Self::Config(_) | Self::NotImplemented(_) => ErrorKind::Local,
        }
    }

    /// True when the stored session must be discarded.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub(crate) fn network(context: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Network { context, source }
    }
}
