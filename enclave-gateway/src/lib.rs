//! HTTP API gateway for the Enclave workspace daemon.
//!
//! Exposes CRUD routes over a [`enclave_store::WorkspaceStore`]: uploads
//! become workspaces whose IDs are later used to build Pea/Pod/Flow
//! components.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod routes;
pub mod upload;
