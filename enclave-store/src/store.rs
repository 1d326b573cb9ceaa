//! Workspace store: the collaborator contract and its local-disk implementation.
//!
//! Each workspace lives in `<root>/<id>/`. One async mutex per workspace
//! serializes staging, provisioning and deletion of that workspace; the
//! status map is only locked for short, non-blocking sections.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use enclave_core::{DaemonId, UploadedFile, WorkspaceItem, WorkspaceState, WorkspaceStoreStatus};

use crate::{persist, staging::stage_files, Provisioner, StoreError};

/// Operations the HTTP layer needs from a workspace store.
///
/// # Cancel Safety
/// Staging is not cancel safe: dropping an `add` or `update` future midway
/// may leave partially written files in the workdir. Status updates are
/// applied atomically.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Snapshot of every workspace and the store counters.
    async fn status(&self) -> WorkspaceStoreStatus;

    /// Look up one workspace.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the ID is not registered.
    async fn get(&self, id: &DaemonId) -> Result<WorkspaceItem, StoreError>;

    /// Stage `files` in a new workspace and return its ID.
    ///
    /// # Errors
    /// Returns [`StoreError::EmptyUpload`] or [`StoreError::InvalidUpload`]
    /// for unusable uploads, [`StoreError::Io`] if staging fails.
    async fn add(&self, files: Vec<UploadedFile>) -> Result<DaemonId, StoreError>;

    /// Stage `files` into an existing workspace and return the same ID.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the ID is not registered, plus the
    /// upload errors of [`add`](Self::add).
    async fn update(&self, id: &DaemonId, files: Vec<UploadedFile>) -> Result<DaemonId, StoreError>;

    /// Tear down a workspace. With `everything`, its staged files are removed too.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the ID is not registered.
    async fn delete(&self, id: &DaemonId, everything: bool) -> Result<(), StoreError>;

    /// Delete every workspace, including staged files.
    ///
    /// # Errors
    /// Propagates the first non-`NotFound` error from [`delete`](Self::delete).
    async fn clear(&self) -> Result<(), StoreError>;

    /// [`clear`](Self::clear), then start over with zeroed counters.
    ///
    /// # Errors
    /// Propagates errors from [`clear`](Self::clear) and persistence.
    async fn reset(&self) -> Result<(), StoreError>;
}

/// Workspace store backed by a directory on local disk.
///
/// Cloning is cheap and yields a handle to the same store.
pub struct LocalWorkspaceStore<P: Provisioner> {
    inner: Arc<Inner<P>>,
}

impl<P: Provisioner> Clone for LocalWorkspaceStore<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct Inner<P> {
    root: PathBuf,
    provisioner: P,
    status: RwLock<WorkspaceStoreStatus>,
    workspace_locks: StdMutex<HashMap<DaemonId, Arc<Mutex<()>>>>,
    persist_lock: Mutex<()>,
}

impl<P: Provisioner> LocalWorkspaceStore<P> {
    /// Open (or create) a store rooted at `root`, reloading any saved status.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the root cannot be created,
    /// [`StoreError::Persist`] if the saved status is corrupt, or the
    /// provisioner's health-check error.
    pub async fn open(root: impl AsRef<Path>, provisioner: P) -> Result<Self, StoreError> {
        provisioner.health_check().await?;
        tokio::fs::create_dir_all(root.as_ref()).await?;
        let root = tokio::fs::canonicalize(root.as_ref()).await?;

        let status = match persist::load(&root).await? {
            Some(status) => {
                tracing::info!(root = %root.display(), workspaces = status.size, "restored workspace store");
                status
            }
            None => WorkspaceStoreStatus::new(),
        };

        let store = Self {
            inner: Arc::new(Inner {
                root,
                provisioner,
                status: RwLock::new(status),
                workspace_locks: StdMutex::new(HashMap::new()),
                persist_lock: Mutex::new(()),
            }),
        };
        store.inner.persist().await?;
        Ok(store)
    }

    /// Directory holding every workspace and the status snapshot.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    fn spawn_provision(&self, id: DaemonId, phase: WorkspaceState) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.provision(id, phase).await });
    }
}

impl<P: Provisioner> Inner<P> {
    fn workspace_lock(&self, id: DaemonId) -> Arc<Mutex<()>> {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        let mut locks = self.workspace_locks.lock().expect("workspace lock map poisoned");
        Arc::clone(locks.entry(id).or_default())
    }

    fn forget_lock(&self, id: &DaemonId) {
        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.workspace_locks
            .lock()
            .expect("workspace lock map poisoned")
            .remove(id);
    }

    /// Write the latest status to disk. Saves are serialized so the newest
    /// snapshot always lands last.
    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.status.read().await.clone();
        persist::save(&self.root, &snapshot).await
    }

    /// Apply `change` to the in-memory status only after a snapshot carrying
    /// it has been saved. On error the status is left untouched.
    async fn commit<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: Fn(&mut WorkspaceStoreStatus) + Send,
    {
        let _guard = self.persist_lock.lock().await;
        let mut snapshot = self.status.read().await.clone();
        change(&mut snapshot);
        persist::save(&self.root, &snapshot).await?;
        change(&mut *self.status.write().await);
        Ok(())
    }

    async fn persist_or_log(&self, id: &DaemonId) {
        if let Err(e) = self.persist().await {
            tracing::error!(%id, error = %e, "failed to persist workspace status");
        }
    }

    /// Background provisioning run for one workspace.
    async fn provision(&self, id: DaemonId, phase: WorkspaceState) {
        let lock = self.workspace_lock(id);
        let _guard = lock.lock().await;

        let workdir = {
            let mut status = self.status.write().await;
            let Some(item) = status.get_mut(&id) else {
                tracing::debug!(%id, "workspace gone before provisioning started");
                self.forget_lock(&id);
                return;
            };
            if item.state == WorkspaceState::Deleting {
                return;
            }
            item.transition(phase);
            item.metadata.workdir.clone()
        };
        self.persist_or_log(&id).await;

        tracing::info!(%id, state = ?phase, "provisioning workspace");
        let result = self.provisioner.provision(&id, &workdir).await;

        {
            let mut status = self.status.write().await;
            let Some(item) = status.get_mut(&id) else {
                return;
            };
            if item.state == WorkspaceState::Deleting {
                tracing::debug!(%id, "workspace deleted while provisioning");
                return;
            }
            match result {
                Ok(report) => {
                    tracing::info!(%id, files = report.files.len(), hash = %report.content_hash, "workspace active");
                    item.arguments.files = report.files;
                    item.mark_active(report.content_hash, report.requirements);
                }
                Err(e) => {
                    tracing::warn!(%id, error = %e, "workspace provisioning failed");
                    item.mark_failed(e.to_string());
                }
            }
        }
        self.persist_or_log(&id).await;
    }
}

#[async_trait]
impl<P: Provisioner> WorkspaceStore for LocalWorkspaceStore<P> {
    async fn status(&self) -> WorkspaceStoreStatus {
        self.inner.status.read().await.clone()
    }

    async fn get(&self, id: &DaemonId) -> Result<WorkspaceItem, StoreError> {
        self.inner
            .status
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    async fn add(&self, files: Vec<UploadedFile>) -> Result<DaemonId, StoreError> {
        let id = DaemonId::workspace();
        let workdir = self.inner.root.join(id.to_string());

        let names = match stage_files(&workdir, &files).await {
            Ok(names) => names,
            Err(e) => {
                if matches!(e, StoreError::Io(_)) {
                    if let Err(cleanup) = tokio::fs::remove_dir_all(&workdir).await {
                        tracing::warn!(%id, error = %cleanup, "failed to clean up partial workspace");
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(%id, files = names.len(), "workspace staged");
        let item = WorkspaceItem::new(workdir.clone(), names);
        if let Err(e) = self.inner.commit(|status| status.insert(id, item.clone())).await {
            tracing::error!(%id, error = %e, "failed to persist new workspace, discarding it");
            if let Err(cleanup) = tokio::fs::remove_dir_all(&workdir).await {
                tracing::warn!(%id, error = %cleanup, "failed to clean up discarded workspace");
            }
            return Err(e);
        }

        self.spawn_provision(id, WorkspaceState::Creating);
        Ok(id)
    }

    async fn update(&self, id: &DaemonId, files: Vec<UploadedFile>) -> Result<DaemonId, StoreError> {
        if !self.inner.status.read().await.contains(id) {
            return Err(StoreError::NotFound(*id));
        }

        let lock = self.inner.workspace_lock(*id);
        let guard = lock.lock().await;

        let workdir = match self.inner.status.read().await.get(id) {
            Some(item) if item.state != WorkspaceState::Deleting => item.metadata.workdir.clone(),
            _ => return Err(StoreError::NotFound(*id)),
        };
        let names = stage_files(&workdir, &files).await?;

        {
            let mut status = self.inner.status.write().await;
            match status.get_mut(id) {
                Some(item) if item.state != WorkspaceState::Deleting => {
                    item.merge_files(names);
                    item.transition(WorkspaceState::Updating);
                }
                _ => return Err(StoreError::NotFound(*id)),
            }
        }
        if let Err(e) = self.inner.persist().await {
            tracing::error!(%id, error = %e, "failed to persist workspace update");
            if let Some(item) = self.inner.status.write().await.get_mut(id) {
                item.mark_failed(format!("failed to persist update: {e}"));
            }
            return Err(e);
        }
        drop(guard);

        tracing::info!(%id, files = files.len(), "workspace files updated");
        self.spawn_provision(*id, WorkspaceState::Updating);
        Ok(*id)
    }

    async fn delete(&self, id: &DaemonId, everything: bool) -> Result<(), StoreError> {
        {
            let mut status = self.inner.status.write().await;
            let Some(item) = status.get_mut(id) else {
                return Err(StoreError::NotFound(*id));
            };
            item.transition(WorkspaceState::Deleting);
        }

        let lock = self.inner.workspace_lock(*id);
        let _guard = lock.lock().await;

        let Some(workdir) = self
            .inner
            .status
            .read()
            .await
            .get(id)
            .map(|item| item.metadata.workdir.clone())
        else {
            // A concurrent delete finished first.
            return Err(StoreError::NotFound(*id));
        };

        if let Err(e) = self.inner.provisioner.teardown(id, &workdir).await {
            if let Some(item) = self.inner.status.write().await.get_mut(id) {
                item.mark_failed(e.to_string());
            }
            self.inner.persist_or_log(id).await;
            return Err(e);
        }

        if let Err(e) = self
            .inner
            .commit(|status| {
                status.remove(id);
            })
            .await
        {
            tracing::error!(%id, error = %e, "failed to persist workspace deletion");
            if let Some(item) = self.inner.status.write().await.get_mut(id) {
                item.mark_failed(format!("failed to persist deletion: {e}"));
            }
            return Err(e);
        }
        self.inner.forget_lock(id);

        if everything {
            match tokio::fs::remove_dir_all(&workdir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(%id, everything, "workspace deleted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let ids: Vec<DaemonId> = self.inner.status.read().await.items.keys().copied().collect();
        for id in &ids {
            match self.delete(id, true).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        tracing::info!(count = ids.len(), "cleared all workspaces");
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.clear().await?;
        *self.inner.status.write().await = WorkspaceStoreStatus::new();
        self.inner.persist().await
    }
}
