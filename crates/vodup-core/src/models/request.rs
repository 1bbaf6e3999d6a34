//! Upload request parameters and validation.

use std::path::Path;

use crate::error::{UploadError, UploadResult};

/// Parameters for one upload invocation.
///
/// Immutable once validated: the client constructs the request from its own
/// configuration plus the caller-supplied paths, validates it, and then only
/// reads from it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub secret_id: String,
    pub secret_key: String,
    pub video_path: String,
    pub cover_path: Option<String>,
    /// Optional processing workflow to run after the upload is committed.
    pub procedure: Option<String>,
}

impl UploadRequest {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        video_path: impl Into<String>,
        cover_path: Option<String>,
        procedure: Option<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            video_path: video_path.into(),
            cover_path,
            procedure,
        }
    }

    /// Check the request before any network call is made.
    ///
    /// Fails with [`UploadError::Parameter`] naming the first offending
    /// field. No side effects beyond a local file-existence check.
    pub fn validate(&self) -> UploadResult<()> {
        if self.secret_id.is_empty() {
            return Err(UploadError::Parameter("secretId is null".to_string()));
        }
        if self.secret_key.is_empty() {
            return Err(UploadError::Parameter("secretKey is null".to_string()));
        }
        if self.video_path.is_empty() {
            return Err(UploadError::Parameter("videoPath is null".to_string()));
        }
        if !Path::new(&self.video_path).is_file() {
            return Err(UploadError::Parameter("videoPath is invalid".to_string()));
        }
        if let Some(cover_path) = &self.cover_path {
            if !Path::new(cover_path).is_file() {
                return Err(UploadError::Parameter("coverPath is invalid".to_string()));
            }
        }
        Ok(())
    }
}
