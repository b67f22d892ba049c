//! Unified error types for harbor.
//!
//! Strategy-level failures never leave the engine (they become synthetic
//! 503 responses); these variants surface from lifecycle operations, cache
//! backends, collaborators, and the control surface.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the harbor proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network unreachable, connection reset, or the request never completed.
    #[error("TRANSPORT_FAILURE: {0}")]
    Transport(String),

    /// The network did not answer within the allotted time.
    #[error("TRANSPORT_TIMEOUT: {0}")]
    Timeout(String),

    /// No cache entry or generation for the given key.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The remote sync endpoint answered with a non-2xx status.
    #[error("REMOTE_REJECTION: status {status}")]
    RemoteRejection { status: u16 },

    /// A platform capability is not available in the current host.
    #[error("UNSUPPORTED: {0}")]
    Unsupported(String),

    /// The retry scheduler gave up on a tag.
    #[error("RETRY_EXHAUSTED: {tag} after {attempts} attempts")]
    RetryExhausted { tag: String, attempts: u32 },

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored entry could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error means the network could not be reached in time.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Transport(msg) => (-32000, msg.clone()),
            Error::Timeout(msg) => (-32001, msg.clone()),
            Error::NotFound(msg) => (-32003, msg.clone()),
            Error::RemoteRejection { status } => (-32004, format!("sync endpoint returned {status}")),
            Error::Unsupported(msg) => (-32005, msg.clone()),
            Error::RetryExhausted { .. } => (-32006, err.to_string()),
            Error::InvalidUrl(msg) => (-32007, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Serialization(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("https://example.com/app.js".to_string());
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("app.js"));

        let err = Error::RemoteRejection { status: 502 };
        assert_eq!(err.to_string(), "REMOTE_REJECTION: status 502");
    }

    #[test]
    fn test_is_transport() {
        assert!(Error::Transport("reset".into()).is_transport());
        assert!(Error::Timeout("5s".into()).is_transport());
        assert!(!Error::RemoteRejection { status: 500 }.is_transport());
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::NotFound("key".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32003);

        let err = Error::InvalidInput("bad".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }
}
