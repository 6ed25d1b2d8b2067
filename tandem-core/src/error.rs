//! Error types for tandem-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a conditional write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The caller presented an etag but the store has nothing recorded for
    /// this version yet.
    NoPriorVersion,
    /// The caller's etag does not match the store's current one.
    StaleEtag,
    Other,
}

impl ConflictReason {
    /// Classify a free-text conflict detail from stores that do not return a
    /// structured reason.
    pub fn from_detail(detail: &str) -> Self {
        let detail = detail.to_ascii_lowercase();
        if detail.contains("no prior version")
            || detail.contains("does not exist")
            || detail.contains("not found")
        {
            Self::NoPriorVersion
        } else if detail.contains("etag") || detail.contains("precondition") {
            Self::StaleEtag
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::NoPriorVersion => write!(f, "no prior version"),
            ConflictReason::StaleEtag => write!(f, "stale etag"),
            ConflictReason::Other => write!(f, "conflict"),
        }
    }
}

/// Failure reported by any remote collaborator.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network failure or non-success response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call did not complete inside the transport timeout.
    #[error("request timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("not found: {0}")]
    NotFound(String),

    /// Precondition failure on a conditional write (HTTP 409 equivalent).
    #[error("conflict ({reason}): {detail}")]
    Conflict {
        reason: ConflictReason,
        detail: String,
    },

    /// The store understood the request and declined it.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Local I/O failure in a filesystem-backed store.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RemoteError {
    /// Build a conflict, deriving the reason from the detail text.
    pub fn conflict(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        RemoteError::Conflict {
            reason: ConflictReason::from_detail(&detail),
            detail,
        }
    }

    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            RemoteError::Conflict { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Convenience constructor for [`RemoteError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RemoteError {
    RemoteError::Io {
        path: path.into(),
        source,
    }
}

/// Errors from loading or saving `config.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("config not found at {path}; run `tandem init` first")]
    NotFound { path: PathBuf },
}
