//! Error types for the Metacontroller operator

use thiserror::Error;

/// Main error type for operator operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Validation error for deployment descriptors
    #[error("validation error: {0}")]
    Validation(String),

    /// Manifest rendering error
    ///
    /// Rendering is all-or-nothing: a failure here means no object from the
    /// set may be applied.
    #[error("render error: {0}")]
    Render(String),

    /// The charm lacks permission to create cluster-scoped RBAC
    ///
    /// Maps a 403 from the API server while applying the RBAC bundle. The
    /// charm must be deployed with `--trust`.
    #[error("cannot create required RBAC ({0}); charm may not have `--trust`")]
    Forbidden(String),

    /// Deployed resources are missing or not ready
    #[error("resource check failed: {0}")]
    CheckFailed(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid charm configuration
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// No pinned images could be extracted
    #[error("no pinned images found: {0}")]
    NoImages(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a render error with the given message
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a check-failed error with the given message
    pub fn check_failed(msg: impl Into<String>) -> Self {
        Self::CheckFailed(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an invalid-config error with the given message
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
