//! Common error types for notionsync.

use thiserror::Error;

/// Top-level error type for sync operations.
#[derive(Debug, Error)]
pub enum Error {
    /// API credential or destination database is not configured.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Content tree nests deeper than a single request accepts.
    #[error("Structural limit exceeded: nesting depth {depth} is above the limit of {limit}")]
    StructuralLimitExceeded { depth: usize, limit: usize },

    /// The remote create call did not succeed.
    #[error("Remote sync failed: {0}")]
    RemoteSyncFailed(String),

    /// Overflow content could not be appended to a created page.
    #[error("Append to page {page_id} failed: {reason}")]
    AppendFailed { page_id: String, reason: String },

    /// The document could not be updated after a successful remote sync.
    #[error("Failed to write sync metadata to {path}: {reason}")]
    MetadataWriteFailed { path: String, reason: String },

    /// Copying the page URL to the clipboard failed.
    #[error("Clipboard error: {0}")]
    ClipboardFailed(String),

    /// Transport-level failure talking to the remote API.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error leaves the remote page in place.
    ///
    /// Append and metadata failures happen after the page was created, so the
    /// document is only partially synced rather than not synced at all.
    pub fn is_partial_success(&self) -> bool {
        matches!(
            self,
            Error::AppendFailed { .. } | Error::MetadataWriteFailed { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_success_classification() {
        let append = Error::AppendFailed {
            page_id: "p1".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(append.is_partial_success());

        let write = Error::MetadataWriteFailed {
            path: "a.md".to_string(),
            reason: "read-only".to_string(),
        };
        assert!(write.is_partial_success());

        assert!(!Error::RemoteSyncFailed("400".to_string()).is_partial_success());
        assert!(!Error::StructuralLimitExceeded { depth: 3, limit: 2 }.is_partial_success());
    }

    #[test]
    fn test_structural_limit_message() {
        let err = Error::StructuralLimitExceeded { depth: 3, limit: 2 };
        assert_eq!(
            err.to_string(),
            "Structural limit exceeded: nesting depth 3 is above the limit of 2"
        );
    }
}
