//! Control-plane response wire types.
//!
//! The control-plane API returns camelCase JSON with an integer `code` field
//! acting as the explicit failure indicator (`0` means success). Only the
//! fields this client consumes are modeled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Per-asset storage destination granted by the apply phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetStorage {
    pub storage_path: String,
}

/// Temporary credentials for the object-storage transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TempCertificate {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
    pub expired_time: Option<u64>,
}

/// Response of the apply phase: storage destinations plus the session key
/// the commit phase must reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyUploadResponse {
    pub code: i64,
    pub message: Option<String>,
    pub code_desc: Option<String>,
    pub storage_bucket: Option<String>,
    pub storage_region: Option<String>,
    pub video: Option<AssetStorage>,
    pub cover: Option<AssetStorage>,
    pub temp_certificate: Option<TempCertificate>,
    pub vod_session_key: Option<String>,
}

impl ApplyUploadResponse {
    /// Explicit failure indicator from the control plane.
    pub fn is_fail(&self) -> bool {
        self.code != 0
    }
}

/// Published location of an asset after commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetUrl {
    pub url: String,
}

/// Terminal artifact of a successful upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitUploadResponse {
    pub code: i64,
    pub message: Option<String>,
    pub code_desc: Option<String>,
    pub file_id: Option<String>,
    pub video: Option<AssetUrl>,
    pub cover: Option<AssetUrl>,
}

impl CommitUploadResponse {
    /// Explicit failure indicator from the control plane.
    pub fn is_fail(&self) -> bool {
        self.code != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_apply_response() {
        let json = r#"{
            "code": 0,
            "message": "",
            "codeDesc": "Success",
            "storageBucket": "vodgzp123456",
            "storageRegion": "ap-guangzhou",
            "video": {"storagePath": "/dir/video.mp4"},
            "cover": {"storagePath": "/dir/cover.jpg"},
            "tempCertificate": {
                "secretId": "tmp-id",
                "secretKey": "tmp-key",
                "token": "tok",
                "expiredTime": 1700000000
            },
            "vodSessionKey": "session-key",
            "unknownField": 42
        }"#;

        let resp: ApplyUploadResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_fail());
        assert_eq!(resp.storage_bucket.as_deref(), Some("vodgzp123456"));
        assert_eq!(resp.video.unwrap().storage_path, "/dir/video.mp4");
        assert_eq!(resp.temp_certificate.unwrap().secret_id, "tmp-id");
        assert_eq!(resp.vod_session_key.as_deref(), Some("session-key"));
    }

    #[test]
    fn deserializes_commit_response() {
        let json = r#"{
            "code": 0,
            "fileId": "123456789",
            "video": {"url": "http://example.com/video.mp4"}
        }"#;

        let resp: CommitUploadResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.is_fail());
        assert_eq!(resp.file_id.as_deref(), Some("123456789"));
        assert_eq!(resp.video.unwrap().url, "http://example.com/video.mp4");
        assert!(resp.cover.is_none());
    }

    #[test]
    fn nonzero_code_is_failure() {
        let resp: ApplyUploadResponse =
            serde_json::from_str(r#"{"code": 4000, "message": "invalid param"}"#).unwrap();
        assert!(resp.is_fail());

        let resp: CommitUploadResponse =
            serde_json::from_str(r#"{"code": 500, "codeDesc": "InternalError"}"#).unwrap();
        assert!(resp.is_fail());
    }
}
