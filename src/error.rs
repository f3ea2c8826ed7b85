//! Custom error types for archivist

use thiserror::Error;

/// Main error type for archivist operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No owner identity provided")]
    Unauthorized,

    #[error("Upload of {size} bytes exceeds the {max} byte limit")]
    SizeExceeded { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File extension '{extension}' does not match declared type '{mime_type}'")]
    ExtensionMismatch { extension: String, mime_type: String },

    #[error("Text extraction failed: {0}")]
    ProcessingFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not initialized: run 'archivist init' first")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Whether the caller, not the system, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized
                | Error::SizeExceeded { .. }
                | Error::UnsupportedType(_)
                | Error::ExtensionMismatch { .. }
                | Error::DocumentNotFound(_)
                | Error::Forbidden(_)
        )
    }
}

/// Convert qdrant errors
impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::Index(err.to_string())
    }
}

/// Result type alias for archivist
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(Error::Unauthorized.is_client_error());
        assert!(Error::SizeExceeded { size: 2, max: 1 }.is_client_error());
        assert!(Error::Forbidden("nope".to_string()).is_client_error());
        assert!(!Error::Index("down".to_string()).is_client_error());
        assert!(!Error::Embedding("down".to_string()).is_client_error());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::SizeExceeded { size: 2048, max: 1024 };
        assert_eq!(err.to_string(), "Upload of 2048 bytes exceeds the 1024 byte limit");

        let err = Error::ExtensionMismatch {
            extension: "pdf".to_string(),
            mime_type: "text/plain".to_string(),
        };
        assert!(err.to_string().contains("pdf"));
        assert!(err.to_string().contains("text/plain"));
    }
}
