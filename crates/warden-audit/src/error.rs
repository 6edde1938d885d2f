//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur inside an audit storage backend.
///
/// These never reach the caller of an operation; the logger reports them
/// through `tracing` and carries on.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to initialize a storage backend.
    #[error("failed to initialize audit storage: {0}")]
    InitializationFailed(String),

    /// Storage error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
