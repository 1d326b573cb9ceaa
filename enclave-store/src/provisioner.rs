//! Provisioner abstraction trait and the directory-inspecting default.
//!
//! Allows swapping the step that turns a staged workspace into a ready
//! environment (image build, venv install, ...) without changing the
//! store's lifecycle logic.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use enclave_core::{ContentHash, DaemonId};

use crate::staging::display_name;
use crate::StoreError;

/// Name of the file whose lines are reported as workspace requirements.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// What a successful provisioning run found in the workdir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Relative paths of every file in the workdir, sorted.
    pub files: Vec<String>,
    /// Entries parsed from [`REQUIREMENTS_FILE`], if present.
    pub requirements: Vec<String>,
    /// Hash over the sorted paths and their contents.
    pub content_hash: ContentHash,
}

/// Builds and tears down the environment behind a workspace.
///
/// Implementations must be `Send + Sync` so the store can drive them from
/// background tasks.
#[async_trait]
pub trait Provisioner: Send + Sync + 'static {
    /// Prepare the environment for the files staged in `workdir`.
    ///
    /// # Errors
    /// Returns [`StoreError::Provision`] if the environment cannot be built,
    /// or [`StoreError::Io`] if the workdir cannot be read.
    async fn provision(&self, id: &DaemonId, workdir: &Path) -> Result<ProvisionReport, StoreError>;

    /// Release whatever [`provision`](Self::provision) acquired.
    ///
    /// # Errors
    /// Returns [`StoreError::Provision`] if resources cannot be released.
    async fn teardown(&self, id: &DaemonId, workdir: &Path) -> Result<(), StoreError>;

    /// Check whether the provisioner is usable.
    ///
    /// # Errors
    /// Returns [`StoreError::Provision`] if the environment is not ready.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Provisioner that inspects the staged directory and builds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryProvisioner;

impl DirectoryProvisioner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provisioner for DirectoryProvisioner {
    async fn provision(&self, id: &DaemonId, workdir: &Path) -> Result<ProvisionReport, StoreError> {
        let mut files = list_files(workdir).await?;
        files.sort();

        let mut hasher = Sha256::new();
        let mut requirements = Vec::new();
        for name in &files {
            let content = tokio::fs::read(workdir.join(name)).await?;
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(&content);
            hasher.update([0u8]);
            if name == REQUIREMENTS_FILE {
                requirements = parse_requirements(&String::from_utf8_lossy(&content));
            }
        }
        let content_hash = ContentHash::new(hasher.finalize().into());

        tracing::debug!(%id, files = files.len(), %content_hash, "workspace inspected");
        Ok(ProvisionReport { files, requirements, content_hash })
    }

    async fn teardown(&self, _id: &DaemonId, _workdir: &Path) -> Result<(), StoreError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Recursively list regular files under `root` as `/`-separated relative paths.
async fn list_files(root: &Path) -> Result<Vec<String>, StoreError> {
    let mut files = Vec::new();
    let mut pending: Vec<PathBuf> = vec![PathBuf::new()];
    while let Some(relative) = pending.pop() {
        let mut entries = tokio::fs::read_dir(root.join(&relative)).await?;
        while let Some(entry) = entries.next_entry().await? {
            let child = relative.join(entry.file_name());
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(child);
            } else if file_type.is_file() {
                files.push(display_name(&child));
            }
        }
    }
    Ok(files)
}

/// Parse `requirements.txt` content: one entry per line, comments and blanks dropped.
#[must_use]
pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
