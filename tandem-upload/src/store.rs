//! Remote object and manifest store contracts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tandem_core::{
    ChunkDescriptor, Etag, ManifestState, ManifestStatus, RemoteError, ResourceKey, VersionId,
};

/// What the object store reports after accepting a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Full object key, usable with [`RemoteObjectStore::delete_object`].
    pub object_name: String,
    pub version_id: VersionId,
    pub object_etag: Etag,
    pub size_bytes: u64,
}

/// Conditional append of one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestUpdate {
    pub resource_key: ResourceKey,
    pub version_id: VersionId,
    /// `None` asserts that no manifest exists yet for this version.
    pub expected_etag: Option<Etag>,
    pub new_chunk: ChunkDescriptor,
    pub status: ManifestStatus,
}

#[async_trait]
pub trait RemoteObjectStore: Send + Sync {
    /// Store `bytes` under `resource`. Without `version_id` the store mints
    /// a fresh version.
    async fn put_object(
        &self,
        resource: &ResourceKey,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
        version_id: Option<&VersionId>,
    ) -> Result<StoredObject, RemoteError>;

    /// `false` when nothing was stored under `object_key`.
    async fn delete_object(
        &self,
        resource: &ResourceKey,
        object_key: &str,
    ) -> Result<bool, RemoteError>;
}

#[async_trait]
pub trait RemoteManifestStore: Send + Sync {
    /// Apply `update` if `expected_etag` matches the stored etag and return
    /// the new one. A mismatch is [`RemoteError::Conflict`].
    async fn update_manifest(&self, update: &ManifestUpdate) -> Result<Etag, RemoteError>;

    async fn load(
        &self,
        resource: &ResourceKey,
        version_id: &VersionId,
    ) -> Result<Option<ManifestState>, RemoteError>;
}
