//! Error types for the store crate.

use enclave_core::{CoreError, DaemonId};

/// Errors that can occur during workspace store operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// No workspace with this ID is registered.
    #[error("workspace not found: {0}")]
    NotFound(DaemonId),

    /// An add or update request carried no files.
    #[error("upload contains no files")]
    EmptyUpload,

    /// An uploaded file failed validation.
    #[error("invalid upload: {0}")]
    InvalidUpload(#[from] CoreError),

    /// The provisioner could not prepare the workspace.
    #[error("provisioning failed for {id}: {reason}")]
    Provision { id: DaemonId, reason: String },

    /// The status snapshot could not be encoded or decoded.
    #[error("status persistence failed: {0}")]
    Persist(#[from] serde_json::Error),

    /// Underlying I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
