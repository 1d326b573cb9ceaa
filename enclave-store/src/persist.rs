//! On-disk snapshot of the store status.
//!
//! The snapshot is written to a sibling temp file and renamed over
//! `store.json`, so a crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use enclave_core::WorkspaceStoreStatus;

use crate::StoreError;

/// File name of the snapshot inside the store root.
pub const SNAPSHOT_FILE: &str = "store.json";

/// Failure reason recorded for items that were mid-flight when the daemon stopped.
pub const INTERRUPTED_REASON: &str = "interrupted by daemon restart";

#[must_use]
pub fn snapshot_path(root: &Path) -> PathBuf {
    root.join(SNAPSHOT_FILE)
}

/// Write `status` to `<root>/store.json`.
///
/// # Errors
/// Returns [`StoreError::Persist`] if encoding fails or [`StoreError::Io`]
/// if the file cannot be written.
pub async fn save(root: &Path, status: &WorkspaceStoreStatus) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(status)?;
    let target = snapshot_path(root);
    let tmp = target.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &target).await?;
    Ok(())
}

/// Load the snapshot from `<root>/store.json`, or `None` if there is none.
///
/// Items left in a transient state are marked `FAILED`; their background
/// work died with the previous process.
///
/// # Errors
/// Returns [`StoreError::Persist`] if the snapshot is corrupt or
/// [`StoreError::Io`] if it cannot be read.
pub async fn load(root: &Path) -> Result<Option<WorkspaceStoreStatus>, StoreError> {
    let bytes = match tokio::fs::read(snapshot_path(root)).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut status: WorkspaceStoreStatus = serde_json::from_slice(&bytes)?;
    for (id, item) in &mut status.items {
        if item.state.is_transient() {
            tracing::warn!(%id, state = ?item.state, "marking interrupted workspace as failed");
            item.mark_failed(INTERRUPTED_REASON);
        }
    }
    status.size = status.items.len();
    Ok(Some(status))
}
