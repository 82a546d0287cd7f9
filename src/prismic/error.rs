use thiserror::Error;

/// Failures talking to the content API
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content API returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("No {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    #[error("Content API has no master ref")]
    NoMasterRef,

    #[error("Cursor is not a page of this repository: {0}")]
    InvalidCursor(String),

    #[error("Cursor was already visited: {0}")]
    CursorLoop(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Malformed document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ContentError {
    /// Whether the failure means the document does not exist upstream
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
