//! Per-workspace cache record and its state classification.
//!
//! State precedence:
//! 1. `Dirty` (local edits not yet confirmed persisted)
//! 2. `Stub` (no content yet)
//! 3. `Placeholder` (content synthesized locally, never pulled)
//! 4. `Populated`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tandem_core::{canonical, WorkspaceDocument, WorkspaceId};

/// Client-side cache record for one workspace.
///
/// `has_local_edits` is only set through a local mutation and only cleared by
/// a persistence confirmation. `pulled_from_remote` is only set when
/// `content` came from (or was accepted by) the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub content: Option<WorkspaceDocument>,
    pub pulled_from_remote: bool,
    pub has_local_edits: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Where an entry sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
    Stub,
    Placeholder,
    Populated,
    Dirty,
}

impl WorkspaceEntry {
    /// Placeholder inserted before any content is known.
    pub fn stub(id: WorkspaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            content: None,
            pulled_from_remote: false,
            has_local_edits: false,
            last_synced_at: None,
        }
    }

    pub fn state(&self) -> EntryState {
        if self.has_local_edits {
            return EntryState::Dirty;
        }
        match (&self.content, self.pulled_from_remote) {
            (None, _) => EntryState::Stub,
            (Some(_), false) => EntryState::Placeholder,
            (Some(_), true) => EntryState::Populated,
        }
    }

    /// Content that can be served without a network call: anything pulled,
    /// and any unsaved local edit.
    pub fn cached_content(&self) -> Option<&WorkspaceDocument> {
        if self.pulled_from_remote || self.has_local_edits {
            self.content.as_ref()
        } else {
            None
        }
    }

    /// Whether `doc` is structurally different from the cached content.
    pub fn differs_from(&self, doc: &WorkspaceDocument) -> bool {
        !canonical::equal(self.content.as_ref(), Some(doc))
    }

    pub(crate) fn populate(&mut self, content: WorkspaceDocument) {
        self.content = Some(content);
        self.pulled_from_remote = true;
        self.has_local_edits = false;
    }

    pub(crate) fn apply_local(&mut self, content: WorkspaceDocument) {
        self.content = Some(content);
        self.has_local_edits = true;
    }

    pub(crate) fn confirm_persisted(&mut self, at: DateTime<Utc>) {
        self.has_local_edits = false;
        self.pulled_from_remote = self.content.is_some();
        self.last_synced_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::Node;

    fn entry() -> WorkspaceEntry {
        WorkspaceEntry::stub(WorkspaceId::from("wf-1"), "Flow")
    }

    #[test]
    fn stub_has_no_content_and_clean_flags() {
        let e = entry();
        assert_eq!(e.state(), EntryState::Stub);
        assert!(e.content.is_none());
        assert!(!e.pulled_from_remote);
        assert!(!e.has_local_edits);
        assert!(e.cached_content().is_none());
    }

    #[test]
    fn populate_then_edit_then_confirm() {
        let mut e = entry();
        e.populate(WorkspaceDocument::blank());
        assert_eq!(e.state(), EntryState::Populated);
        assert!(e.cached_content().is_some());

        let mut edited = WorkspaceDocument::blank();
        edited.blocks.push(Node::new("b1"));
        e.apply_local(edited);
        assert_eq!(e.state(), EntryState::Dirty);

        let at = Utc::now();
        e.confirm_persisted(at);
        assert_eq!(e.state(), EntryState::Populated);
        assert_eq!(e.last_synced_at, Some(at));
    }

    #[test]
    fn local_content_without_pull_is_placeholder() {
        let mut e = entry();
        e.content = Some(WorkspaceDocument::starter());
        assert_eq!(e.state(), EntryState::Placeholder);
        assert!(e.cached_content().is_none());
    }

    #[test]
    fn unpulled_dirty_content_is_served_locally() {
        let mut e = entry();
        e.apply_local(WorkspaceDocument::blank());
        assert_eq!(e.state(), EntryState::Dirty);
        assert!(!e.pulled_from_remote);
        assert_eq!(e.cached_content(), Some(&WorkspaceDocument::blank()));
    }

    #[test]
    fn differs_from_uses_structural_equality() {
        let mut e = entry();
        let mut doc = WorkspaceDocument::blank();
        doc.blocks = vec![Node::new("b2"), Node::new("b1")];
        e.populate(doc);

        let mut reordered = WorkspaceDocument::blank();
        reordered.blocks = vec![Node::new("b1"), Node::new("b2")];
        assert!(!e.differs_from(&reordered));

        reordered.blocks.push(Node::new("b3"));
        assert!(e.differs_from(&reordered));
    }

    #[test]
    fn stub_differs_from_any_document() {
        assert!(entry().differs_from(&WorkspaceDocument::blank()));
    }
}
