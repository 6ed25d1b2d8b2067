//! Remote document store contract consumed by the synchronizer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tandem_core::{RemoteError, WorkspaceDocument, WorkspaceId, WorkspaceSummary};

/// Remote side of the workspace cache.
///
/// Implementations carry their own transport timeout; an expired call is
/// reported as [`RemoteError::Timeout`].
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Every workspace the remote knows about.
    async fn list(&self) -> Result<Vec<WorkspaceSummary>, RemoteError>;

    /// Stored content, or `None` when the remote has nothing for `id`.
    async fn fetch(&self, id: &WorkspaceId) -> Result<Option<WorkspaceDocument>, RemoteError>;

    async fn create(
        &self,
        id: &WorkspaceId,
        name: &str,
        initial: &WorkspaceDocument,
    ) -> Result<WorkspaceSummary, RemoteError>;

    async fn rename(&self, id: &WorkspaceId, new_name: &str)
        -> Result<WorkspaceSummary, RemoteError>;

    /// `false` when the remote had nothing to delete.
    async fn delete(&self, id: &WorkspaceId) -> Result<bool, RemoteError>;

    /// `false` when the remote refused the write.
    async fn save(
        &self,
        id: &WorkspaceId,
        content: &WorkspaceDocument,
        timestamp: DateTime<Utc>,
    ) -> Result<bool, RemoteError>;
}
