//! Editing session state types.

use serde::Serialize;

use std::fmt;

use crate::document::{ChangeList, DocumentId};

/// Lifecycle of an editing session.
///
/// `Idle -> Fetching -> Reconciling -> {Ready, ConflictPending}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Fetching,
    Reconciling,
    Ready,
    ConflictPending,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Fetching => write!(f, "fetching"),
            SessionState::Reconciling => write!(f, "reconciling"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::ConflictPending => write!(f, "conflict_pending"),
        }
    }
}

/// A local draft that could not be reconciled with the server.
///
/// Raised when the local draft was built on a server draft that has since
/// been superseded. The changes are handed to the user; nothing is merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftConflict {
    pub document_id: DocumentId,
    pub discarded_changes: ChangeList,
    pub local_draft_id: u64,
    pub server_draft_id: u64,
}
