//! # tandem-sync
//!
//! Client-side workspace cache kept consistent with a remote document store
//! under optimistic, local-first mutation.
//!
//! Build a [`WorkspaceSynchronizer`] over any [`RemoteDocumentStore`] (the
//! directory-backed [`FsDocumentStore`] ships here) and drive it with
//! `switch_to`, `create_optimistic`, `mark_mutated`, `persist`, `rename`
//! and `remove`.

pub mod diff;
pub mod entry;
pub mod error;
pub mod fs_store;
pub mod store;
pub mod synchronizer;

pub use diff::{diff_documents, WorkspaceDiff};
pub use entry::{EntryState, WorkspaceEntry};
pub use error::SyncError;
pub use fs_store::FsDocumentStore;
pub use store::RemoteDocumentStore;
pub use synchronizer::{
    EditOutcome, EntryTable, PendingCreate, PersistOutcome, Switched, WorkspaceSynchronizer,
};
