//! Error types for proxy operations

use thiserror::Error;

/// Result type for proxy and backend operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors surfaced by the proxy and by document backends
///
/// Backend-originated variants (`Conflict`, `Io`, `Backend`, ...) are passed
/// through the proxy unchanged.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// A value does not have the shape or capability an operation requires
    #[error("Type validation error: {0}")]
    TypeValidation(String),

    /// Unknown backend name, document, revision, attachment or view
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write conflict reported by a backend
    #[error("Conflict: {0}")]
    Conflict(String),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error from a storage backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ProxyError {
    /// Create a type validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::TypeValidation(message.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a backend error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProxyError::NotFound(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, ProxyError::Conflict(_))
    }

    /// Check if this is a type validation error
    pub fn is_type_validation(&self) -> bool {
        matches!(self, ProxyError::TypeValidation(_))
    }
}
