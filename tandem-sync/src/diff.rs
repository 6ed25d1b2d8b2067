//! Unified diff between the remote copy of a workspace and local content.
//!
//! Both sides are rendered in canonical pretty-JSON form, so reordering
//! blocks or edges never shows up as a change.

use similar::TextDiff;

use tandem_core::{canonical, WorkspaceDocument, WorkspaceId};

use crate::error::SyncError;
use crate::synchronizer::WorkspaceSynchronizer;

/// Diff for one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDiff {
    pub id: WorkspaceId,
    pub unified_diff: String,
}

/// Render `remote` → `local`, or `None` when they are structurally equal.
///
/// A missing remote document diffs against an empty file.
pub fn diff_documents(
    id: &WorkspaceId,
    remote: Option<&WorkspaceDocument>,
    local: &WorkspaceDocument,
) -> Result<Option<WorkspaceDiff>, SyncError> {
    if canonical::equal(remote, Some(local)) {
        return Ok(None);
    }

    let old = match remote {
        Some(doc) => with_trailing_newline(canonical::canonical_json(doc)?),
        None => String::new(),
    };
    let new = with_trailing_newline(canonical::canonical_json(local)?);

    let old_header = format!("remote/{id}");
    let new_header = format!("local/{id}");
    let unified = TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(WorkspaceDiff {
        id: id.clone(),
        unified_diff: unified,
    }))
}

impl WorkspaceSynchronizer {
    /// Compare the remote copy of `id` against its cached content.
    ///
    /// Always asks the remote; the cache is not consulted for the remote side
    /// and is left untouched.
    pub async fn diff(&self, id: &WorkspaceId) -> Result<Option<WorkspaceDiff>, SyncError> {
        let local = self
            .entry(id)
            .ok_or_else(|| SyncError::UnknownWorkspace(id.clone()))?
            .content
            .ok_or_else(|| SyncError::NoContent(id.clone()))?;
        let remote = self.store.fetch(id).await?;
        diff_documents(id, remote.as_ref(), &local)
    }
}

fn with_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
