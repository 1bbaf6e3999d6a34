//! Error types module
//!
//! All failures surfaced by the upload client fall into three kinds:
//! invalid input caught before any network activity, a control-plane phase
//! (apply or commit) that failed or exhausted its retry budget, and an error
//! raised by the object-storage transfer collaborator.

use thiserror::Error;

/// Errors raised by the object-storage transfer collaborator.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Top-level error taxonomy for an upload invocation.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Invalid or missing input, detected locally before any network call.
    /// Never retried.
    #[error("Invalid parameter: {0}")]
    Parameter(String),

    /// A remote phase (apply or commit) returned an explicit failure
    /// indicator or exhausted its retry budget. `body` carries the
    /// serialized response for operator inspection.
    #[error("{message}, result={body}")]
    Handle { message: String, body: String },

    /// An error from the storage-transfer collaborator, propagated
    /// unmodified. The transfer session is still released.
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;
