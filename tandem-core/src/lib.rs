//! Tandem core library: document and manifest types, canonical comparison,
//! configuration, errors.
//!
//! - [`types`]: newtypes, workspace documents, manifest records
//! - [`canonical`]: normalization and structural equality
//! - [`config`]: `~/.tandem/config.yaml`
//! - [`error`]: [`RemoteError`], [`ConfigError`]
//! - [`persist`]: atomic JSON file helpers for filesystem-backed stores
//! - [`timeout`]: transport timeout wrapper

pub mod canonical;
pub mod config;
pub mod error;
pub mod persist;
pub mod timeout;
pub mod types;

pub use config::TandemConfig;
pub use error::{ConfigError, ConflictReason, RemoteError};
pub use types::{
    ChunkDescriptor, ChunkKind, Edge, Etag, ManifestState, ManifestStatus, Node, Port,
    ResourceKey, VersionId, Viewport, WorkspaceDocument, WorkspaceId, WorkspaceSummary,
};
