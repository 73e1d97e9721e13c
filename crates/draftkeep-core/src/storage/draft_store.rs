//! Per-document draft persistence.
//!
//! `DraftStore` keeps at most one pending change list per document under the
//! key `draft_<documentId>`. The medium may be unavailable (disabled, full,
//! broken); the store probes it once at construction and degrades every
//! operation to a no-op when the probe fails. Storage errors never reach
//! callers: a lost local draft is recoverable, a failed edit is not.

use chrono::Utc;
use tracing::{debug, warn};

use draftkeep_types::document::{Change, DocumentId};
use draftkeep_types::draft::{
    Draft, DraftSummary, StoredDraft, document_id_from_key, draft_key,
};
use draftkeep_types::error::RepositoryError;

use super::local_storage::LocalStorage;

/// Key written and removed by the availability probe.
const PROBE_KEY: &str = "draftkeep_storage_probe";
const PROBE_VALUE: &str = "probe";

pub struct DraftStore<S: LocalStorage> {
    storage: S,
    available: bool,
}

impl<S: LocalStorage> DraftStore<S> {
    /// Wrap `storage`, probing it once. The result is kept for the lifetime
    /// of the store.
    pub async fn init(storage: S) -> Self {
        let available = match probe(&storage).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "Local draft storage unavailable; drafts will not persist");
                false
            }
        };
        debug!(available, "Draft store initialized");
        Self { storage, available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Persist `change_list` as the draft for `document_id`, replacing any
    /// previous draft.
    pub async fn save(&self, document_id: &DocumentId, change_list: &[Change], draft_id: u64) {
        if !self.available {
            return;
        }
        let draft = Draft {
            document_id: document_id.clone(),
            change_list: change_list.to_vec(),
            draft_id,
            saved_at: Utc::now(),
        };
        let value = match serde_json::to_string(&draft.to_stored()) {
            Ok(v) => v,
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "Failed to serialize draft");
                return;
            }
        };
        match self.storage.set_item(&draft_key(document_id), &value).await {
            Ok(()) => debug!(
                document_id = %document_id,
                draft_id,
                changes = change_list.len(),
                "Saved local draft"
            ),
            Err(e) => warn!(document_id = %document_id, error = %e, "Failed to save local draft"),
        }
    }

    /// Load the draft for `document_id`.
    ///
    /// Returns `None` if there is no draft, storage is unavailable, or the
    /// stored value does not parse.
    pub async fn load(&self, document_id: &DocumentId) -> Option<Draft> {
        if !self.available {
            return None;
        }
        let raw = match self.storage.get_item(&draft_key(document_id)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "Failed to read local draft");
                return None;
            }
        };
        match serde_json::from_str::<StoredDraft>(&raw) {
            Ok(stored) => Some(Draft::from_stored(document_id.clone(), stored)),
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "Ignoring unparseable local draft");
                None
            }
        }
    }

    /// Delete the draft for `document_id`. No-op if none exists.
    pub async fn remove(&self, document_id: &DocumentId) {
        if !self.available {
            return;
        }
        if let Err(e) = self.storage.remove_item(&draft_key(document_id)).await {
            warn!(document_id = %document_id, error = %e, "Failed to remove local draft");
        }
    }

    /// All stored drafts, most recently saved first.
    pub async fn list(&self) -> Vec<DraftSummary> {
        if !self.available {
            return Vec::new();
        }
        let keys = match self.storage.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list local drafts");
                return Vec::new();
            }
        };

        let mut summaries = Vec::new();
        for document_id in keys.iter().filter_map(|k| document_id_from_key(k)) {
            if let Some(draft) = self.load(&document_id).await {
                summaries.push(DraftSummary::from(&draft));
            }
        }
        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        summaries
    }
}

async fn probe<S: LocalStorage>(storage: &S) -> Result<bool, RepositoryError> {
    storage.set_item(PROBE_KEY, PROBE_VALUE).await?;
    let read_back = storage.get_item(PROBE_KEY).await?;
    storage.remove_item(PROBE_KEY).await?;
    Ok(read_back.as_deref() == Some(PROBE_VALUE))
}
