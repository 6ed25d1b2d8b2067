//! # tandem-upload
//!
//! Chunked uploads into a shared, etag-guarded manifest.
//!
//! - [`resolver`]: compare-and-swap append with one bounded retry
//! - [`orchestrator`]: ordered per-file object write + manifest append
//! - [`store`]: remote object / manifest contracts
//! - [`fs_store`]: directory-backed implementations of those contracts

pub mod error;
pub mod fs_store;
pub mod orchestrator;
pub mod resolver;
pub mod store;

pub use error::{AppendError, UploadError};
pub use fs_store::{FsManifestStore, FsObjectStore};
pub use orchestrator::{BatchReport, FileUploadResult, UploadBaseline, UploadFile, UploadOrchestrator};
pub use resolver::ManifestResolver;
pub use store::{ManifestUpdate, RemoteManifestStore, RemoteObjectStore, StoredObject};
