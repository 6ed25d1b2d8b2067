//! Per-file upload driver: object write, then manifest append.
//!
//! Files of one batch run strictly in submission order. A file's failure is
//! recorded in its own result and the batch moves on to the next file.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tandem_core::{ChunkDescriptor, ChunkKind, Etag, ManifestStatus, ResourceKey, VersionId};

use crate::error::UploadError;
use crate::resolver::ManifestResolver;
use crate::store::{RemoteManifestStore, RemoteObjectStore};

/// One file of a batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Derived from the file's [`ChunkKind`] when absent.
    pub mime_type: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime_type: None,
        }
    }
}

/// Locally tracked `(version, etag)` pair for a batch in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBaseline {
    pub version_id: Option<VersionId>,
    pub etag: Option<Etag>,
}

#[derive(Debug)]
pub struct FileUploadResult {
    pub file_name: String,
    pub outcome: Result<ChunkDescriptor, UploadError>,
}

impl FileUploadResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Results in submission order plus the baseline left after the last file.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<FileUploadResult>,
    pub baseline: UploadBaseline,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

pub struct UploadOrchestrator {
    objects: Arc<dyn RemoteObjectStore>,
    resolver: ManifestResolver,
}

impl UploadOrchestrator {
    pub fn new(
        objects: Arc<dyn RemoteObjectStore>,
        manifests: Arc<dyn RemoteManifestStore>,
    ) -> Self {
        Self {
            objects,
            resolver: ManifestResolver::new(manifests),
        }
    }

    /// Upload `files` to `resource` starting from `baseline`.
    ///
    /// Only the last file of the batch appends with
    /// [`ManifestStatus::Completed`].
    pub async fn upload_batch(
        &self,
        resource: &ResourceKey,
        files: Vec<UploadFile>,
        mut baseline: UploadBaseline,
    ) -> BatchReport {
        let last = files.len().saturating_sub(1);
        let mut results = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let status = if index == last {
                ManifestStatus::Completed
            } else {
                ManifestStatus::Generating
            };
            let file_name = file.file_name.clone();
            let outcome = self.upload_one(resource, file, status, &mut baseline).await;
            match &outcome {
                Ok(chunk) => tracing::info!(
                    resource = %resource,
                    file = %file_name,
                    object = %chunk.object_name,
                    %status,
                    "chunk uploaded"
                ),
                Err(err) => tracing::warn!(
                    resource = %resource,
                    file = %file_name,
                    error = %err,
                    "chunk upload failed"
                ),
            }
            results.push(FileUploadResult { file_name, outcome });
        }

        BatchReport { results, baseline }
    }

    async fn upload_one(
        &self,
        resource: &ResourceKey,
        file: UploadFile,
        status: ManifestStatus,
        baseline: &mut UploadBaseline,
    ) -> Result<ChunkDescriptor, UploadError> {
        let kind = ChunkKind::from_file_name(&file.file_name);
        let mime_type = file
            .mime_type
            .unwrap_or_else(|| kind.default_mime_type().to_string());

        let stored = self
            .objects
            .put_object(
                resource,
                &file.file_name,
                &mime_type,
                &file.bytes,
                baseline.version_id.as_ref(),
            )
            .await
            .map_err(UploadError::ObjectWrite)?;

        if baseline.version_id.as_ref() != Some(&stored.version_id) {
            tracing::debug!(
                resource = %resource,
                version = %stored.version_id,
                "new upload version; dropping cached etag"
            );
            baseline.version_id = Some(stored.version_id.clone());
            baseline.etag = None;
        }

        let chunk = ChunkDescriptor {
            object_name: stored.object_name,
            display_name: file.file_name,
            mime_type,
            size_bytes: stored.size_bytes,
            object_etag: stored.object_etag,
            kind,
        };

        let etag = self
            .resolver
            .append_chunk(
                resource,
                &stored.version_id,
                chunk.clone(),
                baseline.etag.clone(),
                status,
            )
            .await?;
        baseline.etag = Some(etag);
        Ok(chunk)
    }

    /// Delete one stored object by its full key.
    pub async fn remove_object(
        &self,
        resource: &ResourceKey,
        object_key: &str,
    ) -> Result<(), UploadError> {
        match self.objects.delete_object(resource, object_key).await {
            Ok(true) => {
                tracing::info!(resource = %resource, object = object_key, "object removed");
                Ok(())
            }
            Ok(false) => Err(UploadError::ObjectMissing(object_key.to_string())),
            Err(err) => Err(UploadError::ObjectDelete(err)),
        }
    }
}
