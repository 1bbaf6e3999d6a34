//! Vodup Core Library
//!
//! This crate provides the domain models, wire types, error taxonomy, and
//! request validation shared by the Vodup upload client. It has no network
//! or storage dependencies of its own; the client crate supplies those.

pub mod error;
pub mod models;

// Re-export commonly used types
pub use error::{TransferError, UploadError, UploadResult};
pub use models::{
    ApplyUploadResponse, AssetStorage, AssetUrl, CommitUploadResponse, TempCertificate,
    TransferDescriptor, UploadRequest,
};
