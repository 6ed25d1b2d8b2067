//! Workspace synchronizer: cache-or-fetch, optimistic create, rename, delete
//! and mutation tracking over an owned entry table.
//!
//! The table lock is never held across an `.await`; every remote call works
//! on a snapshot and re-acquires the lock to apply its result. A failed
//! remote call leaves the table exactly as it was, except for `remove`,
//! which drops the local entry up front.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use tandem_core::{canonical, WorkspaceDocument, WorkspaceId, WorkspaceSummary};

use crate::entry::{EntryState, WorkspaceEntry};
use crate::error::SyncError;
use crate::store::RemoteDocumentStore;

/// Id → entry map owned by one synchronizer.
pub type EntryTable = HashMap<WorkspaceId, WorkspaceEntry>;

/// Content returned by [`WorkspaceSynchronizer::switch_to`].
#[derive(Debug, Clone, PartialEq)]
pub struct Switched {
    pub content: WorkspaceDocument,
    /// Served from the entry without a network call.
    pub from_cache: bool,
}

/// Outcome of a dirty-checked edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Structurally identical to the cached content; flags untouched.
    Unchanged,
}

/// Outcome of [`WorkspaceSynchronizer::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    /// Nothing to save; no network call was made.
    Unchanged,
    /// Saved, but the entry was edited again while the save was in flight
    /// and stays dirty.
    SupersededWhileSaving,
}

/// First phase of an optimistic create: the stub is already in the table;
/// await [`PendingCreate::confirmed`] for the remote result.
#[derive(Debug)]
pub struct PendingCreate {
    stub: WorkspaceEntry,
    confirmation: Confirmation,
}

#[derive(Debug)]
enum Confirmation {
    Spawned(JoinHandle<Result<WorkspaceEntry, SyncError>>),
    Unavailable(String),
}

impl PendingCreate {
    pub fn stub(&self) -> &WorkspaceEntry {
        &self.stub
    }

    /// Wait for the background create. On failure the stub stays in the
    /// table; surfacing the error is up to the caller.
    pub async fn confirmed(self) -> Result<WorkspaceEntry, SyncError> {
        match self.confirmation {
            Confirmation::Spawned(handle) => handle
                .await
                .map_err(|err| SyncError::Background(err.to_string()))?,
            Confirmation::Unavailable(reason) => Err(SyncError::Background(reason)),
        }
    }
}

/// Keeps a client-side workspace cache consistent with a remote store.
pub struct WorkspaceSynchronizer {
    pub(crate) entries: Arc<Mutex<EntryTable>>,
    pub(crate) store: Arc<dyn RemoteDocumentStore>,
}

impl WorkspaceSynchronizer {
    pub fn new(store: Arc<dyn RemoteDocumentStore>, entries: EntryTable) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            store,
        }
    }

    /// Snapshot of one entry.
    pub fn entry(&self, id: &WorkspaceId) -> Option<WorkspaceEntry> {
        self.entries.lock().get(id).cloned()
    }

    /// Snapshot of every entry, sorted by id.
    pub fn entries(&self) -> Vec<WorkspaceEntry> {
        let mut all: Vec<_> = self.entries.lock().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn state(&self, id: &WorkspaceId) -> Option<EntryState> {
        self.entries.lock().get(id).map(WorkspaceEntry::state)
    }

    /// Copy of the whole table.
    pub fn snapshot(&self) -> EntryTable {
        self.entries.lock().clone()
    }

    /// Fetch the remote list and add a stub for every id not yet known.
    /// Known entries only get their name refreshed.
    pub async fn load_list(&self) -> Result<Vec<WorkspaceSummary>, SyncError> {
        let listed = self.store.list().await.map_err(|err| {
            tracing::warn!(error = %err, "workspace list fetch failed");
            SyncError::Remote(err)
        })?;

        let mut entries = self.entries.lock();
        let mut added = 0usize;
        for summary in &listed {
            match entries.get_mut(&summary.id) {
                Some(entry) => entry.name = summary.name.clone(),
                None => {
                    entries.insert(
                        summary.id.clone(),
                        WorkspaceEntry::stub(summary.id.clone(), summary.name.clone()),
                    );
                    added += 1;
                }
            }
        }
        tracing::debug!(listed = listed.len(), added, "workspace list loaded");
        Ok(listed)
    }

    /// Return content for `id`, from the entry when it was already pulled or
    /// carries unsaved edits, otherwise from the remote store.
    ///
    /// A remote with nothing stored yields the built-in starter document
    /// rather than an error. Dirty content is never replaced by a fetch, and
    /// an id the table has never seen is only added when the remote has
    /// content for it.
    pub async fn switch_to(&self, id: &WorkspaceId) -> Result<Switched, SyncError> {
        if let Some(content) = self
            .entries
            .lock()
            .get(id)
            .and_then(WorkspaceEntry::cached_content)
        {
            tracing::debug!(workspace = %id, "serving workspace from cache");
            return Ok(Switched {
                content: content.clone(),
                from_cache: true,
            });
        }

        let fetched = self.store.fetch(id).await.map_err(|err| {
            tracing::warn!(workspace = %id, error = %err, "workspace fetch failed");
            SyncError::Remote(err)
        })?;

        let mut entries = self.entries.lock();

        // Edited while the fetch was in flight.
        if let Some(local) = entries
            .get(id)
            .filter(|e| e.has_local_edits)
            .and_then(|e| e.content.clone())
        {
            tracing::debug!(workspace = %id, "keeping local edits over fetched content");
            return Ok(Switched {
                content: local,
                from_cache: true,
            });
        }

        let content = match fetched {
            Some(content) => {
                entries
                    .entry(id.clone())
                    .or_insert_with(|| WorkspaceEntry::stub(id.clone(), id.0.clone()))
                    .populate(content.clone());
                content
            }
            None => {
                tracing::info!(workspace = %id, "remote has no content; using starter workflow");
                let content = WorkspaceDocument::starter();
                if let Some(entry) = entries.get_mut(id) {
                    entry.content = Some(content.clone());
                }
                content
            }
        };

        Ok(Switched {
            content,
            from_cache: false,
        })
    }

    /// Insert a stub for `id` immediately and create the workspace remotely
    /// in the background.
    ///
    /// Without caller content the workspace starts from
    /// [`WorkspaceDocument::blank`]. Must be called from inside a Tokio
    /// runtime; otherwise the confirmation reports [`SyncError::Background`].
    pub fn create_optimistic(
        &self,
        id: WorkspaceId,
        name: impl Into<String>,
        initial: Option<WorkspaceDocument>,
    ) -> PendingCreate {
        let name = name.into();
        let stub = WorkspaceEntry::stub(id.clone(), name.clone());
        self.entries.lock().insert(id.clone(), stub.clone());

        let initial = initial.unwrap_or_else(WorkspaceDocument::blank);
        let task = confirm_create(self.entries.clone(), self.store.clone(), id, name, initial);
        let confirmation = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Confirmation::Spawned(handle.spawn(task)),
            Err(err) => Confirmation::Unavailable(err.to_string()),
        };

        PendingCreate { stub, confirmation }
    }

    /// Replace the content of `id` and mark it dirty. Must be called for
    /// every local edit.
    pub fn mark_mutated(
        &self,
        id: &WorkspaceId,
        content: WorkspaceDocument,
    ) -> Result<(), SyncError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SyncError::UnknownWorkspace(id.clone()))?;
        entry.apply_local(content);
        tracing::debug!(workspace = %id, "workspace marked dirty");
        Ok(())
    }

    /// [`mark_mutated`](Self::mark_mutated), skipped when `content` is
    /// structurally identical to what is cached.
    pub fn apply_edit(
        &self,
        id: &WorkspaceId,
        content: WorkspaceDocument,
    ) -> Result<EditOutcome, SyncError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SyncError::UnknownWorkspace(id.clone()))?;
        if !entry.differs_from(&content) {
            tracing::debug!(workspace = %id, "edit unchanged");
            return Ok(EditOutcome::Unchanged);
        }
        entry.apply_local(content);
        Ok(EditOutcome::Applied)
    }

    /// Clear the dirty flag after persistence happened elsewhere.
    pub fn confirm_persisted(&self, id: &WorkspaceId) -> Result<(), SyncError> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SyncError::UnknownWorkspace(id.clone()))?;
        entry.confirm_persisted(Utc::now());
        Ok(())
    }

    /// Save dirty content and, once the remote accepts it, clear the dirty
    /// flag. Clean entries are not sent.
    pub async fn persist(&self, id: &WorkspaceId) -> Result<PersistOutcome, SyncError> {
        let content = {
            let entries = self.entries.lock();
            let entry = entries
                .get(id)
                .ok_or_else(|| SyncError::UnknownWorkspace(id.clone()))?;
            if !entry.has_local_edits {
                return Ok(PersistOutcome::Unchanged);
            }
            entry
                .content
                .clone()
                .ok_or_else(|| SyncError::NoContent(id.clone()))?
        };

        let saved_at = Utc::now();
        let accepted = self
            .store
            .save(id, &content, saved_at)
            .await
            .map_err(|err| {
                tracing::warn!(workspace = %id, error = %err, "workspace save failed");
                SyncError::Remote(err)
            })?;
        if !accepted {
            return Err(SyncError::Declined {
                op: "save",
                id: id.clone(),
            });
        }

        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(id) else {
            return Ok(PersistOutcome::Saved);
        };
        if !canonical::equal(entry.content.as_ref(), Some(&content)) {
            tracing::debug!(workspace = %id, "workspace edited during save; stays dirty");
            return Ok(PersistOutcome::SupersededWhileSaving);
        }
        entry.confirm_persisted(saved_at);
        tracing::info!(workspace = %id, "workspace saved");
        Ok(PersistOutcome::Saved)
    }

    /// Rename remotely; the local name only changes once the remote accepts.
    pub async fn rename(
        &self,
        id: &WorkspaceId,
        new_name: &str,
    ) -> Result<WorkspaceSummary, SyncError> {
        let summary = self.store.rename(id, new_name).await.map_err(|err| {
            tracing::warn!(workspace = %id, error = %err, "workspace rename failed");
            SyncError::Remote(err)
        })?;

        if let Some(entry) = self.entries.lock().get_mut(id) {
            entry.name = summary.name.clone();
        }
        Ok(summary)
    }

    /// Drop the local entry immediately, then delete remotely. The result
    /// only reports the remote side.
    pub async fn remove(&self, id: &WorkspaceId) -> Result<(), SyncError> {
        let removed = self.entries.lock().remove(id);
        tracing::debug!(workspace = %id, had_entry = removed.is_some(), "workspace removed locally");

        match self.store.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SyncError::Declined {
                op: "delete",
                id: id.clone(),
            }),
            Err(err) => {
                tracing::warn!(workspace = %id, error = %err, "remote delete failed");
                Err(SyncError::Remote(err))
            }
        }
    }
}

fn confirm_create(
    entries: Arc<Mutex<EntryTable>>,
    store: Arc<dyn RemoteDocumentStore>,
    id: WorkspaceId,
    name: String,
    initial: WorkspaceDocument,
) -> impl Future<Output = Result<WorkspaceEntry, SyncError>> + Send + 'static {
    async move {
        let summary = match store.create(&id, &name, &initial).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(workspace = %id, error = %err, "remote create failed; stub kept");
                return Err(SyncError::Remote(err));
            }
        };

        let mut entries = entries.lock();
        match entries.get_mut(&id) {
            Some(entry) => {
                entry.name = summary.name;
                if !entry.has_local_edits {
                    entry.populate(initial);
                }
                tracing::info!(workspace = %id, "workspace created");
                Ok(entry.clone())
            }
            None => {
                tracing::debug!(workspace = %id, "workspace removed before create confirmed");
                let mut entry = WorkspaceEntry::stub(summary.id, summary.name);
                entry.populate(initial);
                Ok(entry)
            }
        }
    }
}
