//! Local draft types.
//!
//! A draft is the unsaved change list for one document, kept in local
//! storage so that edits survive a crash or a failed autosave. The draft ID
//! records which server-side draft the local copy was derived from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{ChangeList, DocumentId};

/// Prefix of every local storage key holding a draft.
pub const DRAFT_KEY_PREFIX: &str = "draft_";

/// Local storage key for the draft of `document_id`.
pub fn draft_key(document_id: &DocumentId) -> String {
    format!("{DRAFT_KEY_PREFIX}{document_id}")
}

/// Inverse of [`draft_key`]. Returns `None` for keys that do not hold drafts.
pub fn document_id_from_key(key: &str) -> Option<DocumentId> {
    key.strip_prefix(DRAFT_KEY_PREFIX)
        .and_then(|id| DocumentId::new(id).ok())
}

/// A locally persisted draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub document_id: DocumentId,
    pub change_list: ChangeList,
    /// Server draft ID the change list was built on top of.
    pub draft_id: u64,
    pub saved_at: DateTime<Utc>,
}

impl Draft {
    /// A draft is valid only while the server still reports the draft ID it
    /// was built on. Any other ID means a newer autosave superseded it.
    pub fn is_valid(&self, server_draft_id: u64) -> bool {
        self.draft_id == server_draft_id
    }

    pub fn from_stored(document_id: DocumentId, stored: StoredDraft) -> Self {
        Self {
            document_id,
            change_list: stored.change_list,
            draft_id: stored.draft_id,
            saved_at: stored.saved_at.unwrap_or_else(Utc::now),
        }
    }

    pub fn to_stored(&self) -> StoredDraft {
        StoredDraft {
            change_list: self.change_list.clone(),
            draft_id: self.draft_id,
            saved_at: Some(self.saved_at),
        }
    }
}

/// On-disk JSON shape of a draft: `{"changeList": [...], "draftId": n}`.
///
/// `savedAt` was added later and is optional so older entries still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDraft {
    pub change_list: ChangeList,
    pub draft_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Lightweight description of a stored draft for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSummary {
    pub document_id: DocumentId,
    pub draft_id: u64,
    pub change_count: usize,
    pub saved_at: DateTime<Utc>,
}

impl From<&Draft> for DraftSummary {
    fn from(draft: &Draft) -> Self {
        Self {
            document_id: draft.document_id.clone(),
            draft_id: draft.draft_id,
            change_count: draft.change_list.len(),
            saved_at: draft.saved_at,
        }
    }
}
