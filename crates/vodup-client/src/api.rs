//! Control-plane callers: apply and commit with bounded retry.
//!
//! The [`UploadApi`] trait is the seam between the orchestrator and the
//! remote control plane; [`VodApiClient`] is the HTTP implementation. Retry
//! wraps the trait from the outside so transient transport failures are
//! masked up to the configured attempt budget.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use vodup_core::{ApplyUploadResponse, CommitUploadResponse, UploadRequest};

use crate::sign::{self, SigningContext};

/// Default control-plane endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://vod.api.qcloud.com/v2/index.php";

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from one control-plane round trip. All variants are treated as
/// retryable by the callers below; an explicit failure flag in a decoded
/// response is not an `ApiError` and is checked by the orchestrator.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Remote control-plane operations consumed by the upload flow.
#[async_trait]
pub trait UploadApi: Send + Sync {
    /// Request storage destinations and temporary transfer credentials.
    async fn apply_upload(
        &self,
        ctx: &SigningContext,
        request: &UploadRequest,
    ) -> Result<ApplyUploadResponse, ApiError>;

    /// Finalize an upload whose bytes have been transferred.
    async fn commit_upload(
        &self,
        ctx: &SigningContext,
        apply: &ApplyUploadResponse,
    ) -> Result<CommitUploadResponse, ApiError>;
}

/// HTTP implementation of [`UploadApi`] using signed GET requests.
#[derive(Debug, Clone)]
pub struct VodApiClient {
    client: Client,
    endpoint: Url,
}

impl VodApiClient {
    pub fn new(endpoint: &str) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ApiError::Endpoint(e.to_string()))?;
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { client, endpoint })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        ctx: &SigningContext,
        params: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let host = self.endpoint.host_str().unwrap_or_default();
        let query = sign::signed_query(ctx, host, self.endpoint.path(), params);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl UploadApi for VodApiClient {
    async fn apply_upload(
        &self,
        ctx: &SigningContext,
        request: &UploadRequest,
    ) -> Result<ApplyUploadResponse, ApiError> {
        self.call(ctx, apply_params(request)).await
    }

    async fn commit_upload(
        &self,
        ctx: &SigningContext,
        apply: &ApplyUploadResponse,
    ) -> Result<CommitUploadResponse, ApiError> {
        self.call(ctx, commit_params(apply)).await
    }
}

/// Wire parameters for the apply operation. The cover parameters are sent
/// only when the request carries a cover path.
pub(crate) fn apply_params(request: &UploadRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("Action".to_string(), "ApplyUpload".to_string()),
        ("videoType".to_string(), file_type(&request.video_path)),
        ("videoName".to_string(), file_name(&request.video_path)),
    ];
    if let Some(cover_path) = &request.cover_path {
        params.push(("coverType".to_string(), file_type(cover_path)));
        params.push(("coverName".to_string(), file_name(cover_path)));
    }
    if let Some(procedure) = &request.procedure {
        params.push(("procedure".to_string(), procedure.clone()));
    }
    params
}

/// Wire parameters for the commit operation, referencing the session key
/// granted by the apply phase.
pub(crate) fn commit_params(apply: &ApplyUploadResponse) -> Vec<(String, String)> {
    vec![
        ("Action".to_string(), "CommitUpload".to_string()),
        (
            "vodSessionKey".to_string(),
            apply.vod_session_key.clone().unwrap_or_default(),
        ),
    ]
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_type(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Invoke the apply operation with up to `max_attempts` total attempts,
/// sleeping briefly between attempts.
pub(crate) async fn apply_with_retry(
    api: &dyn UploadApi,
    ctx: &SigningContext,
    request: &UploadRequest,
    max_attempts: u32,
) -> Result<ApplyUploadResponse, ApiError> {
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match api.apply_upload(ctx, request).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay_ms = 100 * (attempt + 1) as u64;
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        delay_ms = delay_ms,
                        error = %e,
                        "apply upload failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(ApiError::Status {
        code: 0,
        body: "no attempt was made".to_string(),
    }))
}

/// Invoke the commit operation with up to `max_attempts` total attempts.
pub(crate) async fn commit_with_retry(
    api: &dyn UploadApi,
    ctx: &SigningContext,
    apply: &ApplyUploadResponse,
    max_attempts: u32,
) -> Result<CommitUploadResponse, ApiError> {
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match api.commit_upload(ctx, apply).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay_ms = 100 * (attempt + 1) as u64;
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        delay_ms = delay_ms,
                        error = %e,
                        "commit upload failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(ApiError::Status {
        code: 0,
        body: "no attempt was made".to_string(),
    }))
}
