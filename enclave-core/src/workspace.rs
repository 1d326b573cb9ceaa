use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::{ContentHash, DaemonId};

/// Lifecycle state of a workspace.
///
/// ```text
/// PENDING ─► CREATING ─► ACTIVE | FAILED
///                  UPDATING ─► ACTIVE | FAILED
/// any ─► DELETING ─► (removed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum WorkspaceState {
    /// Files are staged; provisioning has not started.
    Pending,
    /// First provisioning run in progress.
    Creating,
    /// Re-provisioning after new files were staged.
    Updating,
    /// Provisioned and ready to back components.
    Active,
    /// Provisioning failed; see [`WorkspaceMetadata::error`].
    Failed,
    /// Being torn down.
    Deleting,
}

impl WorkspaceState {
    /// Returns `true` while background work on the workspace is outstanding.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Pending | Self::Creating | Self::Updating | Self::Deleting)
    }
}

/// What the client supplied for a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WorkspaceArguments {
    /// Names of every staged file, sorted and deduplicated.
    pub files: Vec<String>,
    /// Entries from a staged `requirements.txt`.
    pub requirements: Vec<String>,
}

/// Where a workspace lives and what provisioning found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WorkspaceMetadata {
    /// Directory holding the staged files.
    pub workdir: PathBuf,
    /// Hash of the staged tree, set once provisioning succeeds.
    pub content_hash: Option<ContentHash>,
    /// Failure reason when the state is [`WorkspaceState::Failed`].
    pub error: Option<String>,
}

/// Status record describing one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WorkspaceItem {
    pub state: WorkspaceState,
    pub metadata: WorkspaceMetadata,
    pub arguments: WorkspaceArguments,
    pub time_created: DateTime<Utc>,
    pub time_updated: DateTime<Utc>,
}

impl WorkspaceItem {
    /// Creates a `PENDING` item for a freshly staged workdir.
    #[must_use]
    pub fn new(workdir: PathBuf, files: Vec<String>) -> Self {
        let now = Utc::now();
        let mut item = Self {
            state: WorkspaceState::Pending,
            metadata: WorkspaceMetadata { workdir, content_hash: None, error: None },
            arguments: WorkspaceArguments::default(),
            time_created: now,
            time_updated: now,
        };
        item.merge_files(files);
        item
    }

    /// Moves to `state` and bumps `time_updated`.
    pub fn transition(&mut self, state: WorkspaceState) {
        self.state = state;
        self.time_updated = Utc::now();
    }

    /// Adds newly staged file names, keeping the list sorted and unique.
    pub fn merge_files(&mut self, files: impl IntoIterator<Item = String>) {
        self.arguments.files.extend(files);
        self.arguments.files.sort();
        self.arguments.files.dedup();
    }

    /// Records a successful provisioning run.
    pub fn mark_active(&mut self, content_hash: ContentHash, requirements: Vec<String>) {
        self.metadata.content_hash = Some(content_hash);
        self.metadata.error = None;
        self.arguments.requirements = requirements;
        self.transition(WorkspaceState::Active);
    }

    /// Records a failed provisioning run.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.metadata.error = Some(reason.into());
        self.transition(WorkspaceState::Failed);
    }
}

/// Aggregate snapshot of every workspace the store knows about.
///
/// `size` always equals `items.len()` when mutated through
/// [`insert`](Self::insert) and [`remove`](Self::remove).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct WorkspaceStoreStatus {
    pub time_created: DateTime<Utc>,
    pub time_updated: DateTime<Utc>,
    /// Workspaces ever added since `time_created`.
    pub num_add: u64,
    /// Workspaces ever deleted since `time_created`.
    pub num_del: u64,
    pub size: usize,
    /// Items in creation order.
    pub items: IndexMap<DaemonId, WorkspaceItem>,
}

impl Default for WorkspaceStoreStatus {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            time_created: now,
            time_updated: now,
            num_add: 0,
            num_del: 0,
            size: 0,
            items: IndexMap::new(),
        }
    }
}

impl WorkspaceStoreStatus {
    /// Creates an empty status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new item and counts it in `num_add`.
    pub fn insert(&mut self, id: DaemonId, item: WorkspaceItem) {
        self.items.insert(id, item);
        self.num_add += 1;
        self.touch();
    }

    /// Removes an item, counting it in `num_del`. Returns the removed item.
    pub fn remove(&mut self, id: &DaemonId) -> Option<WorkspaceItem> {
        let removed = self.items.shift_remove(id);
        if removed.is_some() {
            self.num_del += 1;
            self.touch();
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: &DaemonId) -> Option<&WorkspaceItem> {
        self.items.get(id)
    }

    /// Mutable access to an item; bumps `time_updated` when found.
    pub fn get_mut(&mut self, id: &DaemonId) -> Option<&mut WorkspaceItem> {
        if self.items.contains_key(id) {
            self.time_updated = Utc::now();
        }
        self.items.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &DaemonId) -> bool {
        self.items.contains_key(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn touch(&mut self) {
        self.size = self.items.len();
        self.time_updated = Utc::now();
    }
}
