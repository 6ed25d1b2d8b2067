//! JSON file helpers shared by the filesystem-backed stores.
//!
//! Writes use the `.tmp` + rename pattern so a reader never observes a
//! half-written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{io_err, RemoteError};

/// Read and decode `path`, or `None` when the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RemoteError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Encode `value` as pretty JSON and atomically replace `path`.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RemoteError> {
    let json = serde_json::to_vec_pretty(value)?;
    write_bytes(path, &json).await
}

/// Atomically replace `path` with `bytes`, creating parent directories.
pub async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), RemoteError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_err(parent, e))?;
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| io_err(&tmp, e))?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(path, err));
    }
    Ok(())
}

/// Remove `path`; `false` when it was already gone.
pub async fn remove(path: &Path) -> Result<bool, RemoteError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Reject path segments that could escape the store root.
pub fn checked_segment(segment: &str) -> Result<&str, RemoteError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(RemoteError::Rejected(format!(
            "invalid path segment '{segment}'"
        )));
    }
    Ok(segment)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
