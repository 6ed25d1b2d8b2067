//! Error types for tandem-sync.

use thiserror::Error;

use tandem_core::{RemoteError, WorkspaceId};

/// Every failure the synchronizer reports. Remote failures are caught at the
/// call site and returned as [`SyncError::Remote`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("unknown workspace '{0}'")]
    UnknownWorkspace(WorkspaceId),

    #[error("workspace '{0}' has no content loaded")]
    NoContent(WorkspaceId),

    /// The store answered but refused the operation.
    #[error("remote store declined to {op} workspace '{id}'")]
    Declined { op: &'static str, id: WorkspaceId },

    /// The background half of an optimistic operation could not run.
    #[error("background task failed: {0}")]
    Background(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
