//! Directory-backed object and manifest stores.
//!
//! ```text
//! <root>/objects/<resource>/<version>/<file_name>
//! <root>/manifests/<resource>/<version>.json
//! ```
//!
//! Object etags are the SHA-256 of the stored bytes. Manifest etags are
//! minted fresh on every accepted write.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use tandem_core::{
    error::io_err,
    persist::{self, checked_segment},
    timeout::bounded,
    ConflictReason, Etag, ManifestState, ManifestStatus, RemoteError, ResourceKey, VersionId,
};

use crate::store::{ManifestUpdate, RemoteManifestStore, RemoteObjectStore, StoredObject};

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    timeout: Duration,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }
}

#[async_trait]
impl RemoteObjectStore for FsObjectStore {
    async fn put_object(
        &self,
        resource: &ResourceKey,
        file_name: &str,
        _mime_type: &str,
        bytes: &[u8],
        version_id: Option<&VersionId>,
    ) -> Result<StoredObject, RemoteError> {
        bounded(self.timeout, async {
            let version_id = match version_id {
                Some(v) => v.clone(),
                None => mint_version(),
            };
            let resource_seg = checked_segment(&resource.0)?;
            let version_seg = checked_segment(&version_id.0)?;
            let file_seg = checked_segment(file_name)?;

            let path = self
                .objects_dir()
                .join(resource_seg)
                .join(version_seg)
                .join(file_seg);
            if tokio::fs::try_exists(&path)
                .await
                .map_err(|err| io_err(&path, err))?
            {
                return Err(RemoteError::Rejected(format!(
                    "object '{resource_seg}/{version_seg}/{file_seg}' already exists"
                )));
            }
            persist::write_bytes(&path, bytes).await?;

            Ok(StoredObject {
                object_name: format!("{resource_seg}/{version_seg}/{file_seg}"),
                object_etag: Etag(sha256_hex(bytes)),
                size_bytes: bytes.len() as u64,
                version_id,
            })
        })
        .await
    }

    async fn delete_object(
        &self,
        resource: &ResourceKey,
        object_key: &str,
    ) -> Result<bool, RemoteError> {
        bounded(self.timeout, async {
            let mut path = self.objects_dir();
            let mut segments = object_key.split('/');
            if segments.next() != Some(resource.0.as_str()) {
                return Err(RemoteError::Rejected(format!(
                    "object '{object_key}' is not under resource '{resource}'"
                )));
            }
            path.push(checked_segment(&resource.0)?);
            for segment in segments {
                path.push(checked_segment(segment)?);
            }
            persist::remove(&path).await
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FsManifestStore {
    root: PathBuf,
    timeout: Duration,
    write_lock: Mutex<()>,
}

impl FsManifestStore {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
            write_lock: Mutex::new(()),
        }
    }

    fn manifest_path(
        &self,
        resource: &ResourceKey,
        version_id: &VersionId,
    ) -> Result<PathBuf, RemoteError> {
        Ok(self
            .root
            .join("manifests")
            .join(checked_segment(&resource.0)?)
            .join(format!("{}.json", checked_segment(&version_id.0)?)))
    }
}

#[async_trait]
impl RemoteManifestStore for FsManifestStore {
    async fn update_manifest(&self, update: &ManifestUpdate) -> Result<Etag, RemoteError> {
        bounded(self.timeout, async {
            let _guard = self.write_lock.lock().await;
            let path = self.manifest_path(&update.resource_key, &update.version_id)?;
            let current: Option<ManifestState> = persist::read_json(&path).await?;

            let mut state = match (current, &update.expected_etag) {
                (None, None) => ManifestState {
                    resource_key: update.resource_key.clone(),
                    version_id: update.version_id.clone(),
                    chunks: Vec::new(),
                    status: ManifestStatus::Generating,
                    etag: None,
                },
                (None, Some(_)) => {
                    return Err(RemoteError::Conflict {
                        reason: ConflictReason::NoPriorVersion,
                        detail: format!(
                            "no prior version of manifest {}/{}",
                            update.resource_key, update.version_id
                        ),
                    });
                }
                (Some(state), expected) if state.etag.as_ref() == expected.as_ref() => state,
                (Some(state), expected) => {
                    return Err(RemoteError::Conflict {
                        reason: ConflictReason::StaleEtag,
                        detail: format!(
                            "etag mismatch: expected {}, current {}",
                            display_etag(expected.as_ref()),
                            display_etag(state.etag.as_ref())
                        ),
                    });
                }
            };

            state.chunks.push(update.new_chunk.clone());
            state.status = update.status;
            let etag = mint_etag(&state)?;
            state.etag = Some(etag.clone());
            persist::write_json(&path, &state).await?;

            tracing::debug!(
                resource = %update.resource_key,
                version = %update.version_id,
                chunks = state.chunks.len(),
                etag = %etag,
                "manifest updated"
            );
            Ok(etag)
        })
        .await
    }

    async fn load(
        &self,
        resource: &ResourceKey,
        version_id: &VersionId,
    ) -> Result<Option<ManifestState>, RemoteError> {
        bounded(self.timeout, async {
            persist::read_json(&self.manifest_path(resource, version_id)?).await
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn mint_version() -> VersionId {
    VersionId(format!("v{}", Utc::now().timestamp_millis()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hash of the chunk list, the status and the previous etag.
fn mint_etag(state: &ManifestState) -> Result<Etag, RemoteError> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&state.chunks)?);
    hasher.update(state.status.to_string().as_bytes());
    if let Some(prev) = &state.etag {
        hasher.update(prev.0.as_bytes());
    }
    Ok(Etag(hex::encode(hasher.finalize())))
}

fn display_etag(etag: Option<&Etag>) -> String {
    etag.map_or_else(|| "<none>".to_string(), |e| e.0.clone())
}
