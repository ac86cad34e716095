//! Storage error types.

use std::fmt;

/// The store operation a backend failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `get(key)`.
    Get,
    /// `set(key, value)`.
    Set,
    /// `delete(key)`.
    Delete,
    /// `clear()`.
    Clear,
    /// Creating or advancing a `keys`/`values`/`entries` cursor.
    Enumerate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Delete => "delete",
            Self::Clear => "clear",
            Self::Enumerate => "enumerate",
        };
        f.write_str(name)
    }
}

/// Error reported by a remote backend connection.
///
/// Carries the backend's own message unchanged; the storage layer never
/// retries or reinterprets it.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// Create a backend error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping the client's own error.
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// The backend's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for BackendError {
    fn from(e: redis::RedisError) -> Self {
        Self::from_source(e)
    }
}

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A backend call failed while performing `op`.
    #[error("{op} failed: {source}")]
    Backend {
        /// The store operation that was running.
        op: Operation,
        /// The backend's error.
        #[source]
        source: BackendError,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The namespace or key is invalid.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The storage configuration is malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A storage operation failed internally.
    #[error("storage error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Tag a backend failure with the operation it interrupted.
    #[must_use]
    pub fn backend(op: Operation, source: BackendError) -> Self {
        Self::Backend { op, source }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_names_operation() {
        let err = StorageError::backend(Operation::Clear, BackendError::new("connection reset"));
        assert_eq!(err.to_string(), "clear failed: connection reset");
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = BackendError::from_source(io);
        assert_eq!(err.message(), "timed out");
        assert!(std::error::Error::source(&err).is_some());
    }
}
