//! Error types for tandem-upload.

use thiserror::Error;

use tandem_core::{ConflictReason, RemoteError};

/// Failure of a single manifest append.
#[derive(Debug, Error)]
pub enum AppendError {
    /// The store kept refusing the conditional write. `retried` is set when
    /// the single no-prior-version retry was already spent.
    #[error("manifest conflict unresolved ({reason}): {detail}")]
    ConflictUnresolved {
        reason: ConflictReason,
        detail: String,
        retried: bool,
    },

    /// Non-conflict failure on the first attempt. Never retried.
    #[error("manifest update failed: {0}")]
    Transport(#[source] RemoteError),
}

/// Per-file failure reported by the orchestrator.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("object write failed: {0}")]
    ObjectWrite(#[source] RemoteError),

    #[error(transparent)]
    Manifest(#[from] AppendError),

    #[error("object delete failed: {0}")]
    ObjectDelete(#[source] RemoteError),

    #[error("object '{0}' does not exist")]
    ObjectMissing(String),
}
