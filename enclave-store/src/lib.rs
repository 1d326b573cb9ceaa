//! Workspace storage for the Enclave daemon.
//!
//! Stages uploaded file bundles on disk, allocates workspace IDs, tracks
//! each workspace's lifecycle and hands staged workspaces to a
//! [`Provisioner`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod persist;
pub mod provisioner;
pub mod staging;
pub mod store;

pub use error::StoreError;
pub use provisioner::{DirectoryProvisioner, ProvisionReport, Provisioner};
pub use store::{LocalWorkspaceStore, WorkspaceStore};
