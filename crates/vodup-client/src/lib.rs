//! Upload client for a cloud video-on-demand platform.
//!
//! Provides a three-phase upload flow: apply for storage destinations and
//! temporary credentials, transfer the video (and optional cover) to object
//! storage, then commit the upload with the control plane. Apply and commit
//! are retried up to a configured attempt budget; the transfer session is
//! released on every path before the commit phase runs.

pub mod api;
pub mod sign;
pub mod transfer;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use vodup_core::{ApplyUploadResponse, CommitUploadResponse, TransferDescriptor, UploadRequest};

use crate::api::{UploadApi, VodApiClient};
use crate::sign::SigningContext;
use crate::transfer::{S3TransferFactory, StorageCredentials, TransferFactory, TransferSession};

pub use crate::api::DEFAULT_ENDPOINT;
pub use vodup_core::{TransferError, UploadError, UploadResult};

/// Default validity of the temporary storage credentials, in seconds.
pub const DEFAULT_SIGN_EXPIRED_SECS: u64 = 24 * 3600;

/// Default total attempt budget for the apply and commit operations.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Construction-time configuration. Immutable once the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub secret_id: String,
    pub secret_key: String,
    /// Validity of the temporary storage credentials.
    pub sign_expired: Duration,
    /// Total attempts for the apply operation.
    pub apply_attempts: u32,
    /// Total attempts for the commit operation.
    pub commit_attempts: u32,
    /// Control-plane endpoint.
    pub endpoint: String,
}

impl ClientConfig {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            sign_expired: Duration::from_secs(DEFAULT_SIGN_EXPIRED_SECS),
            apply_attempts: DEFAULT_MAX_ATTEMPTS,
            commit_attempts: DEFAULT_MAX_ATTEMPTS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Read credentials from `VOD_SECRET_ID` / `VOD_SECRET_KEY`.
    pub fn from_env() -> UploadResult<Self> {
        let secret_id = env::var("VOD_SECRET_ID")
            .map_err(|_| UploadError::Parameter("VOD_SECRET_ID is not set".to_string()))?;
        let secret_key = env::var("VOD_SECRET_KEY")
            .map_err(|_| UploadError::Parameter("VOD_SECRET_KEY is not set".to_string()))?;
        Ok(Self::new(secret_id, secret_key))
    }

    pub fn with_sign_expired(mut self, expires_in: Duration) -> Self {
        self.sign_expired = expires_in;
        self
    }

    pub fn with_attempts(mut self, apply: u32, commit: u32) -> Self {
        self.apply_attempts = apply;
        self.commit_attempts = commit;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Client for the three-phase upload flow.
///
/// Holds only read-only configuration and stateless collaborators, so a
/// single value can serve concurrent uploads independently.
pub struct VodUploadClient {
    config: ClientConfig,
    api: Arc<dyn UploadApi>,
    transfer: Arc<dyn TransferFactory>,
}

impl VodUploadClient {
    /// Client with default configuration (24h credential validity, 3
    /// attempts for apply and commit).
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> UploadResult<Self> {
        Self::with_config(ClientConfig::new(secret_id, secret_key))
    }

    pub fn with_config(config: ClientConfig) -> UploadResult<Self> {
        let api = VodApiClient::new(&config.endpoint)
            .map_err(|e| UploadError::Parameter(format!("invalid client configuration: {e}")))?;
        Ok(Self {
            config,
            api: Arc::new(api),
            transfer: Arc::new(S3TransferFactory::new()),
        })
    }

    pub fn from_env() -> UploadResult<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Client with injected collaborators. Used by tests; production code
    /// should prefer [`VodUploadClient::with_config`].
    pub fn with_collaborators(
        config: ClientConfig,
        api: Arc<dyn UploadApi>,
        transfer: Arc<dyn TransferFactory>,
    ) -> Self {
        Self {
            config,
            api,
            transfer,
        }
    }

    /// Upload a video.
    pub async fn upload(&self, video_path: &str) -> UploadResult<CommitUploadResponse> {
        self.upload_with_procedure(video_path, None, None).await
    }

    /// Upload a video with a cover image.
    pub async fn upload_with_cover(
        &self,
        video_path: &str,
        cover_path: &str,
    ) -> UploadResult<CommitUploadResponse> {
        self.upload_with_procedure(video_path, Some(cover_path), None)
            .await
    }

    /// Upload a video, optionally with a cover image and a processing
    /// procedure to run after commit. The other `upload*` methods are sugar
    /// over this one.
    pub async fn upload_with_procedure(
        &self,
        video_path: &str,
        cover_path: Option<&str>,
        procedure: Option<&str>,
    ) -> UploadResult<CommitUploadResponse> {
        let request = UploadRequest::new(
            self.config.secret_id.as_str(),
            self.config.secret_key.as_str(),
            video_path,
            cover_path.map(|p| p.to_string()),
            procedure.map(|p| p.to_string()),
        );
        request.validate()?;

        let ctx = SigningContext::new(
            self.config.secret_id.as_str(),
            self.config.secret_key.as_str(),
            "GET",
            self.config.sign_expired,
        );

        // Apply: allocate storage destinations and temporary credentials.
        let apply = match api::apply_with_retry(
            self.api.as_ref(),
            &ctx,
            &request,
            self.config.apply_attempts,
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "apply upload failed after retries");
                return Err(UploadError::Handle {
                    message: "apply upload fail".to_string(),
                    body: e.to_string(),
                });
            }
        };
        let apply_json = serde_json::to_string(&apply).unwrap_or_default();
        if apply.is_fail() {
            tracing::error!(result = %apply_json, "apply upload fail");
            return Err(UploadError::Handle {
                message: "apply upload fail".to_string(),
                body: apply_json,
            });
        }
        tracing::info!(result = %apply_json, "apply upload success");

        // Transfer: video first, then cover, over one scoped session.
        let credentials = self.storage_credentials(&apply, &apply_json)?;
        let descriptors = self.transfer_descriptors(&apply, &request, &apply_json)?;

        let mut session = self.transfer.open_session(&credentials).await?;
        let transferred = transfer_assets(session.as_ref(), &descriptors).await;
        // Release the session before anything else, success or not.
        session.shutdown().await;
        if let Err(e) = transferred {
            tracing::error!(error = %e, "object transfer failed");
            return Err(e.into());
        }

        // Commit: finalize the upload with the control plane.
        let commit = match api::commit_with_retry(
            self.api.as_ref(),
            &ctx,
            &apply,
            self.config.commit_attempts,
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "commit upload failed after retries");
                return Err(UploadError::Handle {
                    message: "commit upload fail".to_string(),
                    body: apply_json,
                });
            }
        };
        let commit_json = serde_json::to_string(&commit).unwrap_or_default();
        if commit.is_fail() {
            tracing::error!(result = %commit_json, "commit upload fail");
            // The apply body is carried here so operators can correlate the
            // failed commit with the session that granted it.
            return Err(UploadError::Handle {
                message: "commit upload fail".to_string(),
                body: apply_json,
            });
        }
        tracing::info!(result = %commit_json, "commit upload success");

        Ok(commit)
    }

    fn storage_credentials(
        &self,
        apply: &ApplyUploadResponse,
        apply_json: &str,
    ) -> UploadResult<StorageCredentials> {
        let bucket = non_empty(apply.storage_bucket.as_deref())
            .ok_or_else(|| missing_field("storageBucket", apply_json))?;
        let region = non_empty(apply.storage_region.as_deref())
            .ok_or_else(|| missing_field("storageRegion", apply_json))?;
        let certificate = apply
            .temp_certificate
            .as_ref()
            .ok_or_else(|| missing_field("tempCertificate", apply_json))?;

        Ok(StorageCredentials {
            bucket,
            region,
            secret_id: certificate.secret_id.clone(),
            secret_key: certificate.secret_key.clone(),
            token: certificate.token.clone(),
            expires_in: self.config.sign_expired,
        })
    }

    fn transfer_descriptors(
        &self,
        apply: &ApplyUploadResponse,
        request: &UploadRequest,
        apply_json: &str,
    ) -> UploadResult<Vec<TransferDescriptor>> {
        let bucket = non_empty(apply.storage_bucket.as_deref())
            .ok_or_else(|| missing_field("storageBucket", apply_json))?;

        let video_storage = apply
            .video
            .as_ref()
            .and_then(|v| non_empty(Some(v.storage_path.as_str())))
            .ok_or_else(|| missing_field("video.storagePath", apply_json))?;
        let mut descriptors = vec![TransferDescriptor::new(
            bucket.as_str(),
            video_storage,
            request.video_path.as_str(),
        )];

        if let Some(cover_path) = &request.cover_path {
            let cover_storage = apply
                .cover
                .as_ref()
                .and_then(|c| non_empty(Some(c.storage_path.as_str())))
                .ok_or_else(|| missing_field("cover.storagePath", apply_json))?;
            descriptors.push(TransferDescriptor::new(
                bucket.as_str(),
                cover_storage,
                cover_path.as_str(),
            ));
        }

        Ok(descriptors)
    }
}

async fn transfer_assets(
    session: &dyn TransferSession,
    descriptors: &[TransferDescriptor],
) -> Result<(), TransferError> {
    for descriptor in descriptors {
        session.upload_object(descriptor).await?;
        tracing::info!(
            key = %descriptor.storage_path,
            source = %descriptor.local_path,
            "asset upload complete"
        );
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(|v| v.to_string())
}

fn missing_field(field: &str, apply_json: &str) -> UploadError {
    UploadError::Handle {
        message: format!("apply response missing {field}"),
        body: apply_json.to_string(),
    }
}
