//! Batch ordering, status signaling and failure isolation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use tandem_core::{
    ChunkKind, Etag, ManifestStatus, RemoteError, ResourceKey, VersionId,
};
use tandem_upload::{
    FsManifestStore, FsObjectStore, ManifestUpdate, RemoteManifestStore, RemoteObjectStore,
    StoredObject, UploadBaseline, UploadError, UploadFile, UploadOrchestrator,
};

// ---------------------------------------------------------------------------
// Recording stores
// ---------------------------------------------------------------------------

/// Object store that fails for selected file names and logs every call.
struct RecordingObjects {
    failing: HashSet<&'static str>,
    version: &'static str,
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RemoteObjectStore for RecordingObjects {
    async fn put_object(
        &self,
        resource: &ResourceKey,
        file_name: &str,
        _mime_type: &str,
        bytes: &[u8],
        version_id: Option<&VersionId>,
    ) -> Result<StoredObject, RemoteError> {
        self.calls.lock().push(format!("put {file_name}"));
        if self.failing.contains(file_name) {
            return Err(RemoteError::Transport(format!("{file_name}: 503")));
        }
        let version_id = version_id
            .cloned()
            .unwrap_or_else(|| VersionId::from(self.version));
        Ok(StoredObject {
            object_name: format!("{resource}/{version_id}/{file_name}"),
            version_id,
            object_etag: Etag(format!("obj-{file_name}")),
            size_bytes: bytes.len() as u64,
        })
    }

    async fn delete_object(
        &self,
        _resource: &ResourceKey,
        object_key: &str,
    ) -> Result<bool, RemoteError> {
        self.calls.lock().push(format!("delete {object_key}"));
        Ok(object_key.ends_with(".pdf"))
    }
}

/// Manifest store that accepts everything and hands out sequential etags.
struct RecordingManifests {
    calls: Arc<Mutex<Vec<String>>>,
    updates: Mutex<Vec<ManifestUpdate>>,
}

#[async_trait]
impl RemoteManifestStore for RecordingManifests {
    async fn update_manifest(&self, update: &ManifestUpdate) -> Result<Etag, RemoteError> {
        self.calls
            .lock()
            .push(format!("append {}", update.new_chunk.display_name));
        let mut updates = self.updates.lock();
        updates.push(update.clone());
        Ok(Etag(format!("m{}", updates.len())))
    }

    async fn load(
        &self,
        _resource: &ResourceKey,
        _version_id: &VersionId,
    ) -> Result<Option<tandem_core::ManifestState>, RemoteError> {
        Ok(None)
    }
}

fn recording(
    failing: &[&'static str],
) -> (UploadOrchestrator, Arc<Mutex<Vec<String>>>, Arc<RecordingManifests>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let objects = Arc::new(RecordingObjects {
        failing: failing.iter().copied().collect(),
        version: "v9",
        calls: calls.clone(),
    });
    let manifests = Arc::new(RecordingManifests {
        calls: calls.clone(),
        updates: Mutex::default(),
    });
    (
        UploadOrchestrator::new(objects, manifests.clone()),
        calls,
        manifests,
    )
}

fn files(names: &[&str]) -> Vec<UploadFile> {
    names
        .iter()
        .map(|name| UploadFile::new(*name, name.as_bytes().to_vec()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_object_write_does_not_block_the_rest() {
    let (orchestrator, calls, _) = recording(&["b.txt"]);

    let report = orchestrator
        .upload_batch(
            &ResourceKey::from("kb"),
            files(&["a.pdf", "b.txt", "c.md"]),
            UploadBaseline::default(),
        )
        .await;

    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].is_ok());
    assert!(matches!(
        report.results[1].outcome,
        Err(UploadError::ObjectWrite(RemoteError::Transport(_)))
    ));
    assert!(report.results[2].is_ok());
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    assert_eq!(
        *calls.lock(),
        vec!["put a.pdf", "append a.pdf", "put b.txt", "put c.md", "append c.md"]
    );
}

#[tokio::test]
async fn only_last_file_completes_and_etags_chain() {
    let (orchestrator, _, manifests) = recording(&[]);

    let report = orchestrator
        .upload_batch(
            &ResourceKey::from("kb"),
            files(&["a.pdf", "b.txt", "c.md"]),
            UploadBaseline::default(),
        )
        .await;
    assert_eq!(report.failed(), 0);

    let updates = manifests.updates.lock();
    let statuses: Vec<_> = updates.iter().map(|u| u.status).collect();
    assert_eq!(
        statuses,
        vec![
            ManifestStatus::Generating,
            ManifestStatus::Generating,
            ManifestStatus::Completed
        ]
    );
    let expected: Vec<_> = updates.iter().map(|u| u.expected_etag.clone()).collect();
    assert_eq!(
        expected,
        vec![None, Some(Etag::from("m1")), Some(Etag::from("m2"))]
    );
    assert_eq!(
        report.baseline,
        UploadBaseline {
            version_id: Some(VersionId::from("v9")),
            etag: Some(Etag::from("m3")),
        }
    );
}

#[tokio::test]
async fn fresh_version_discards_cached_etag() {
    let (orchestrator, _, manifests) = recording(&[]);
    let stale = UploadBaseline {
        version_id: None,
        etag: Some(Etag::from("from-previous-version")),
    };

    orchestrator
        .upload_batch(&ResourceKey::from("kb"), files(&["a.pdf"]), stale)
        .await;

    assert_eq!(manifests.updates.lock()[0].expected_etag, None);
}

#[tokio::test]
async fn kinds_and_mime_types_are_derived() {
    let (orchestrator, _, _) = recording(&[]);
    let mut custom = UploadFile::new("diagram.svg", b"<svg/>".to_vec());
    custom.mime_type = Some("image/svg+xml".into());

    let report = orchestrator
        .upload_batch(
            &ResourceKey::from("kb"),
            vec![
                UploadFile::new("notes.txt", b"x".to_vec()),
                UploadFile::new("README.md", b"#".to_vec()),
                custom,
            ],
            UploadBaseline::default(),
        )
        .await;

    let chunks: Vec<_> = report
        .results
        .iter()
        .map(|r| r.outcome.as_ref().expect("uploaded"))
        .collect();
    assert_eq!(chunks[0].kind, ChunkKind::Text);
    assert_eq!(chunks[0].mime_type, "text/plain");
    assert_eq!(chunks[1].kind, ChunkKind::Markdown);
    assert_eq!(chunks[2].kind, ChunkKind::Application);
    assert_eq!(chunks[2].mime_type, "image/svg+xml");
}

#[tokio::test]
async fn remove_object_reports_missing_objects() {
    let (orchestrator, _, _) = recording(&[]);
    let resource = ResourceKey::from("kb");

    orchestrator
        .remove_object(&resource, "kb/v9/a.pdf")
        .await
        .expect("removed");
    let err = orchestrator
        .remove_object(&resource, "kb/v9/a.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::ObjectMissing(_)));
}

#[tokio::test]
async fn filesystem_stores_end_to_end() {
    let dir = TempDir::new().expect("tempdir");
    let timeout = Duration::from_secs(5);
    let manifests = Arc::new(FsManifestStore::new(dir.path(), timeout));
    let orchestrator = UploadOrchestrator::new(
        Arc::new(FsObjectStore::new(dir.path(), timeout)),
        manifests.clone(),
    );
    let resource = ResourceKey::from("kb");

    let first = orchestrator
        .upload_batch(&resource, files(&["a.pdf", "b.csv"]), UploadBaseline::default())
        .await;
    assert_eq!(first.failed(), 0);
    let version = first.baseline.version_id.clone().expect("version minted");

    let second = orchestrator
        .upload_batch(&resource, files(&["c.json"]), first.baseline.clone())
        .await;
    assert_eq!(second.failed(), 0);

    let state = manifests
        .load(&resource, &version)
        .await
        .expect("load")
        .expect("manifest");
    let names: Vec<_> = state.chunks.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.csv", "c.json"]);
    assert_eq!(state.status, ManifestStatus::Completed);
    assert_eq!(state.etag, second.baseline.etag);

    let repeat = orchestrator
        .upload_batch(&resource, files(&["a.pdf"]), second.baseline.clone())
        .await;
    assert_eq!(repeat.failed(), 1);
    let state = manifests
        .load(&resource, &version)
        .await
        .expect("load")
        .expect("manifest");
    assert_eq!(state.chunks.len(), 3);
}
