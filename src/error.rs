//! Error types for the PMR client

use serde::Serialize;
use thiserror::Error;

/// Failures surfaced to the workbench, each carrying a short title and a
/// remediation message suitable for a dialog.
#[derive(Error, Debug)]
pub enum PmrError {
    /// The remote returned a forbidden status.
    #[error("Permission Error: {message}")]
    Permission { message: String },

    /// The remote returned any other non-success status.
    #[error("Web Service Error: {message}")]
    WebService { message: String },

    /// The response body could not be decoded as the expected format, or a
    /// redirect arrived where none is allowed.
    #[error("Unexpected Server Response: {message}")]
    UnexpectedResponse { message: String },

    /// The remote workspace advertises a storage backend with no local
    /// counterpart.
    #[error("Remote storage format unsupported: the remote storage `{storage}` is not one of the ones that this client currently supports.")]
    UnsupportedStorage { storage: String },

    /// Catch-all carrying the original failure's text.
    #[error("Unexpected exception: {message}")]
    Unexpected { message: String },
}

impl PmrError {
    /// Short dialog title for this error kind.
    pub fn title(&self) -> &'static str {
        match self {
            PmrError::Permission { .. } => "Permission Error",
            PmrError::WebService { .. } => "Web Service Error",
            PmrError::UnexpectedResponse { .. } => "Unexpected Server Response",
            PmrError::UnsupportedStorage { .. } => "Remote storage format unsupported",
            PmrError::Unexpected { .. } => "Unexpected exception",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            PmrError::Permission { .. } => "PERMISSION",
            PmrError::WebService { .. } => "WEB_SERVICE",
            PmrError::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            PmrError::UnsupportedStorage { .. } => "UNSUPPORTED_STORAGE",
            PmrError::Unexpected { .. } => "UNEXPECTED",
        }
    }

    /// Wrap any lower-level failure into the catch-all variant.
    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        PmrError::Unexpected {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for PmrError {
    fn from(err: std::io::Error) -> Self {
        PmrError::unexpected(err)
    }
}

impl From<git2::Error> for PmrError {
    fn from(err: git2::Error) -> Self {
        PmrError::unexpected(err)
    }
}

impl From<serde_json::Error> for PmrError {
    fn from(err: serde_json::Error) -> Self {
        PmrError::unexpected(err)
    }
}

impl From<reqwest::Error> for PmrError {
    fn from(err: reqwest::Error) -> Self {
        PmrError::unexpected(err)
    }
}

/// Serializable error response for the GUI layer
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub code: String,
    pub title: String,
    pub message: String,
}

impl From<&PmrError> for ErrorResponse {
    fn from(error: &PmrError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            title: error.title().to_string(),
            message: error.to_string(),
        }
    }
}

impl Serialize for PmrError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

/// Result type alias for PMR client operations
pub type Result<T> = std::result::Result<T, PmrError>;
