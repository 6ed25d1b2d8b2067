//! Directory-backed [`RemoteDocumentStore`].
//!
//! ```text
//! <root>/workspaces/<id>.json   {id, name, content, saved_at}
//! ```
//!
//! Every call is bounded by the configured transport timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tandem_core::{
    error::io_err,
    persist::{self, checked_segment},
    timeout::bounded,
    RemoteError, WorkspaceDocument, WorkspaceId, WorkspaceSummary,
};

use crate::store::RemoteDocumentStore;

/// On-disk record for one workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredWorkspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub content: Option<WorkspaceDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
    timeout: Duration,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    fn workspaces_dir(&self) -> PathBuf {
        self.root.join("workspaces")
    }

    fn record_path(&self, id: &WorkspaceId) -> Result<PathBuf, RemoteError> {
        let segment = checked_segment(&id.0)?;
        Ok(self.workspaces_dir().join(format!("{segment}.json")))
    }

    async fn load(&self, id: &WorkspaceId) -> Result<Option<StoredWorkspace>, RemoteError> {
        persist::read_json(&self.record_path(id)?).await
    }

    async fn load_existing(&self, id: &WorkspaceId) -> Result<StoredWorkspace, RemoteError> {
        self.load(id)
            .await?
            .ok_or_else(|| RemoteError::NotFound(format!("workspace '{id}'")))
    }

    async fn store(&self, record: &StoredWorkspace) -> Result<(), RemoteError> {
        persist::write_json(&self.record_path(&record.id)?, record).await
    }

    async fn list_records(&self) -> Result<Vec<StoredWorkspace>, RemoteError> {
        let dir = self.workspaces_dir();
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(&dir, err)),
        };

        let mut records = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| io_err(&dir, e))? {
            let path = entry.path();
            if !is_record(&path) {
                continue;
            }
            match persist::read_json::<StoredWorkspace>(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(RemoteError::Json(err)) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable workspace record");
                }
                Err(err) => return Err(err),
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

#[async_trait]
impl RemoteDocumentStore for FsDocumentStore {
    async fn list(&self) -> Result<Vec<WorkspaceSummary>, RemoteError> {
        bounded(self.timeout, async {
            Ok(self
                .list_records()
                .await?
                .into_iter()
                .map(|r| WorkspaceSummary {
                    id: r.id,
                    name: r.name,
                })
                .collect())
        })
        .await
    }

    async fn fetch(&self, id: &WorkspaceId) -> Result<Option<WorkspaceDocument>, RemoteError> {
        bounded(self.timeout, async {
            Ok(self.load(id).await?.and_then(|r| r.content))
        })
        .await
    }

    async fn create(
        &self,
        id: &WorkspaceId,
        name: &str,
        initial: &WorkspaceDocument,
    ) -> Result<WorkspaceSummary, RemoteError> {
        bounded(self.timeout, async {
            if self.load(id).await?.is_some() {
                return Err(RemoteError::Rejected(format!(
                    "workspace '{id}' already exists"
                )));
            }
            let record = StoredWorkspace {
                id: id.clone(),
                name: name.to_string(),
                content: Some(initial.clone()),
                saved_at: Some(Utc::now()),
            };
            self.store(&record).await?;
            tracing::debug!(workspace = %id, "created workspace record");
            Ok(WorkspaceSummary {
                id: record.id,
                name: record.name,
            })
        })
        .await
    }

    async fn rename(
        &self,
        id: &WorkspaceId,
        new_name: &str,
    ) -> Result<WorkspaceSummary, RemoteError> {
        bounded(self.timeout, async {
            let mut record = self.load_existing(id).await?;
            let taken = self
                .list_records()
                .await?
                .iter()
                .any(|other| other.id != *id && other.name == new_name);
            if taken {
                return Err(RemoteError::Rejected(format!(
                    "a workspace named '{new_name}' already exists"
                )));
            }
            record.name = new_name.to_string();
            self.store(&record).await?;
            Ok(WorkspaceSummary {
                id: record.id,
                name: record.name,
            })
        })
        .await
    }

    async fn delete(&self, id: &WorkspaceId) -> Result<bool, RemoteError> {
        bounded(self.timeout, async { persist::remove(&self.record_path(id)?).await }).await
    }

    async fn save(
        &self,
        id: &WorkspaceId,
        content: &WorkspaceDocument,
        timestamp: DateTime<Utc>,
    ) -> Result<bool, RemoteError> {
        bounded(self.timeout, async {
            let Some(mut record) = self.load(id).await? else {
                return Ok(false);
            };
            record.content = Some(content.clone());
            record.saved_at = Some(timestamp);
            self.store(&record).await?;
            Ok(true)
        })
        .await
    }
}

fn is_record(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}
