//! Object-storage transfer session.
//!
//! A session is opened from the temporary credentials granted by the apply
//! phase, used for the video and (optionally) cover transfers, and shut down
//! exactly once afterwards. The S3 implementation delegates the byte
//! transfer to `object_store`; no retry happens at this layer.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStoreExt, PutPayload};
use vodup_core::{TransferDescriptor, TransferError};

/// Temporary storage credentials derived from a successful apply response.
#[derive(Debug, Clone)]
pub struct StorageCredentials {
    pub bucket: String,
    pub region: String,
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
    /// Requested credential validity, from client configuration.
    pub expires_in: Duration,
}

/// One transfer session. Implementations must tolerate `shutdown` being the
/// only call after a failed `upload_object`.
#[async_trait]
pub trait TransferSession: Send + Sync {
    /// Transfer one local file to its destination path. Raises on failure;
    /// the caller aborts remaining transfers.
    async fn upload_object(&self, descriptor: &TransferDescriptor) -> Result<(), TransferError>;

    /// Release the session. Called exactly once, on success and on error.
    async fn shutdown(&mut self);
}

/// Opens transfer sessions from apply-phase credentials.
#[async_trait]
pub trait TransferFactory: Send + Sync {
    async fn open_session(
        &self,
        credentials: &StorageCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError>;
}

/// S3-compatible transfer backend.
#[derive(Debug, Clone, Default)]
pub struct S3TransferFactory {
    /// Custom endpoint override for S3-compatible providers; when unset the
    /// endpoint is derived from the granted storage region.
    endpoint: Option<String>,
}

impl S3TransferFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
        }
    }
}

pub(crate) fn default_endpoint(region: &str) -> String {
    format!("https://cos.{region}.myqcloud.com")
}

#[async_trait]
impl TransferFactory for S3TransferFactory {
    async fn open_session(
        &self,
        credentials: &StorageCredentials,
    ) -> Result<Box<dyn TransferSession>, TransferError> {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| default_endpoint(&credentials.region));
        let allow_http = endpoint.starts_with("http://");

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(credentials.bucket.clone())
            .with_region(credentials.region.clone())
            .with_access_key_id(credentials.secret_id.clone())
            .with_secret_access_key(credentials.secret_key.clone())
            .with_endpoint(endpoint)
            .with_allow_http(allow_http)
            .with_virtual_hosted_style_request(true);

        if let Some(token) = &credentials.token {
            builder = builder.with_token(token.clone());
        }

        let store = builder
            .build()
            .map_err(|e| TransferError::ConfigError(e.to_string()))?;

        tracing::debug!(
            bucket = %credentials.bucket,
            region = %credentials.region,
            "transfer session opened"
        );

        Ok(Box::new(S3TransferSession {
            store,
            bucket: credentials.bucket.clone(),
        }))
    }
}

struct S3TransferSession {
    store: AmazonS3,
    bucket: String,
}

#[async_trait]
impl TransferSession for S3TransferSession {
    async fn upload_object(&self, descriptor: &TransferDescriptor) -> Result<(), TransferError> {
        let data = tokio::fs::read(&descriptor.local_path).await?;
        let size = data.len() as u64;
        let location = ObjectPath::from(descriptor.storage_path.trim_start_matches('/'));
        let start = Instant::now();

        let result = self
            .store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %descriptor.storage_path,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "object upload failed"
            );
            TransferError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %descriptor.storage_path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "object upload successful"
        );

        Ok(())
    }

    async fn shutdown(&mut self) {
        // The object_store client holds no server-side session; closing is
        // a local release plus an audit line.
        tracing::debug!(bucket = %self.bucket, "transfer session closed");
    }
}
