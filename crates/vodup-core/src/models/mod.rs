//! Domain models and control-plane wire types.

mod request;
mod response;

pub use request::UploadRequest;
pub use response::{
    ApplyUploadResponse, AssetStorage, AssetUrl, CommitUploadResponse, TempCertificate,
};

/// One asset transfer: where the bytes go and where they come from.
///
/// Built from the apply response for each required asset and handed to the
/// transfer session; it lives only for the duration of one transfer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// Destination bucket assigned by the apply phase.
    pub bucket: String,
    /// Destination object path within the bucket.
    pub storage_path: String,
    /// Local source file.
    pub local_path: String,
}

impl TransferDescriptor {
    pub fn new(
        bucket: impl Into<String>,
        storage_path: impl Into<String>,
        local_path: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            storage_path: storage_path.into(),
            local_path: local_path.into(),
        }
    }
}
