//! Core types for the Enclave workspace daemon.
//!
//! Defines the identifiers, workspace status records and upload payloads
//! shared by the store and the HTTP gateway.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod id;
pub mod upload;
pub mod workspace;

pub use error::CoreError;
pub use id::{ContentHash, DaemonId, IdKind};
pub use upload::{validate_file_name, UploadedFile};
pub use workspace::{
    WorkspaceArguments, WorkspaceItem, WorkspaceMetadata, WorkspaceState, WorkspaceStoreStatus,
};
