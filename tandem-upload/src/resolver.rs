//! Optimistic-concurrency append of one chunk to a shared manifest.
//!
//! Attempt sequence:
//! 1. conditional write with the caller's etag
//! 2. only if (1) failed with a no-prior-version conflict while an etag was
//!    presented: one more write with no etag
//!
//! Nothing else is retried. The resolver keeps no state between calls.

use std::sync::Arc;

use tandem_core::{
    ChunkDescriptor, ConflictReason, Etag, ManifestStatus, RemoteError, ResourceKey, VersionId,
};

use crate::error::AppendError;
use crate::store::{ManifestUpdate, RemoteManifestStore};

#[derive(Clone)]
pub struct ManifestResolver {
    store: Arc<dyn RemoteManifestStore>,
}

impl ManifestResolver {
    pub fn new(store: Arc<dyn RemoteManifestStore>) -> Self {
        Self { store }
    }

    /// Append `descriptor` and return the manifest's new etag, which the
    /// caller adopts as its baseline for the next append.
    pub async fn append_chunk(
        &self,
        resource_key: &ResourceKey,
        version_id: &VersionId,
        descriptor: ChunkDescriptor,
        expected_etag: Option<Etag>,
        status: ManifestStatus,
    ) -> Result<Etag, AppendError> {
        let mut update = ManifestUpdate {
            resource_key: resource_key.clone(),
            version_id: version_id.clone(),
            expected_etag,
            new_chunk: descriptor,
            status,
        };

        let err = match self.store.update_manifest(&update).await {
            Ok(etag) => return Ok(etag),
            Err(err) => err,
        };

        match err {
            RemoteError::Conflict {
                reason: ConflictReason::NoPriorVersion,
                ..
            } if update.expected_etag.is_some() => {
                tracing::info!(
                    resource = %resource_key,
                    version = %version_id,
                    "no prior manifest version; retrying without etag"
                );
                update.expected_etag = None;
                self.store
                    .update_manifest(&update)
                    .await
                    .map_err(|err| unresolved(err, true))
            }
            RemoteError::Conflict { .. } => Err(unresolved(err, false)),
            other => {
                tracing::warn!(
                    resource = %resource_key,
                    version = %version_id,
                    error = %other,
                    "manifest update failed"
                );
                Err(AppendError::Transport(other))
            }
        }
    }
}

fn unresolved(err: RemoteError, retried: bool) -> AppendError {
    let reason = err.conflict_reason().unwrap_or(ConflictReason::Other);
    let detail = match err {
        RemoteError::Conflict { detail, .. } => detail,
        other => other.to_string(),
    };
    tracing::warn!(%reason, %detail, retried, "manifest conflict unresolved");
    AppendError::ConflictUnresolved {
        reason,
        detail,
        retried,
    }
}
