//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Request was rejected, timed out or never reached the service.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Service answered with a well-formed error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Error text reported by the service.
        message: String,
    },

    /// Persisted session record could not be parsed.
    #[error("Stored session is corrupt: {0}")]
    StorageCorrupt(String),

    /// Persisted session is well-formed but past its expiry.
    #[error("Session has expired")]
    ExpiredSession,

    /// Operation requires an active session.
    #[error("No active session")]
    NoSession,

    /// Message with the given id is not in the inbox.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Base URL could not be parsed or extended.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an API error from a status code and message.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Returns true for failures that must not tear down a running session.
    ///
    /// Refresh errors of this kind are reported and the previous inbox is kept.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api(500, "mailbox unavailable");
        assert_eq!(err.to_string(), "API error (500): mailbox unavailable");
        assert!(err.is_transient());
    }

    #[test]
    fn test_storage_errors_are_not_transient() {
        assert!(!Error::StorageCorrupt("bad json".into()).is_transient());
        assert!(!Error::ExpiredSession.is_transient());
        assert!(!Error::NoSession.is_transient());
    }
}
