//! In-memory backend double shared by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::json;

use draftkeep_types::document::{
    AutosaveReceipt, Change, Document, DocumentId, DocumentUpdate, DraftAutosave,
    PublishedDocument,
};
use draftkeep_types::error::{BackendError, DocumentError};

use crate::repository::backend::{EditableBackend, EditorQuery, ReadOnlyBackend};

#[derive(Default)]
pub struct MockState {
    pub documents: HashMap<DocumentId, Document>,
    pub published: HashMap<DocumentId, PublishedDocument>,
    pub editable_fetches: Vec<(DocumentId, EditorQuery)>,
    pub published_fetches: Vec<(DocumentId, Option<u64>)>,
    pub updates: Vec<(DocumentId, DocumentUpdate)>,
    pub autosaves: Vec<(DocumentId, DraftAutosave)>,
    pub discards: Vec<DocumentId>,
    pub deletes: Vec<DocumentId>,
    pub fail_autosave: bool,
    pub fail_fetch: bool,
}

/// Backend double recording every call. Clones share state.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Arc<Mutex<MockState>>,
}

pub fn doc_id(id: &str) -> DocumentId {
    DocumentId::new(id).unwrap()
}

pub fn change(cmd: &str) -> Change {
    Change(json!({"cmd": cmd}))
}

pub fn document(id: &str, version: u64, draft_change_list_id: Option<u64>) -> Document {
    Document {
        document_id: doc_id(id),
        version,
        draft_change_list_id,
        draft_changes: None,
        is_version_of_draft_valid: None,
        language_code: "en".to_string(),
        content: json!({"html": format!("<p>{id} v{version}</p>")}),
    }
}

pub fn published(id: &str, version: u64) -> PublishedDocument {
    PublishedDocument {
        document_id: doc_id(id),
        version,
        language_code: "en".to_string(),
        content: json!({"html": format!("<p>{id} v{version}</p>")}),
    }
}

fn not_found(id: &DocumentId) -> DocumentError {
    DocumentError::BackendRequestFailed(BackendError::new(
        Some(404),
        json!({"error": format!("document {id} not found")}),
    ))
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, doc: Document) -> Self {
        self.lock().documents.insert(doc.document_id.clone(), doc);
        self
    }

    pub fn with_published(self, doc: PublishedDocument) -> Self {
        self.lock().published.insert(doc.document_id.clone(), doc);
        self
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl ReadOnlyBackend for MockBackend {
    async fn fetch_published(
        &self,
        id: &DocumentId,
        version: Option<u64>,
    ) -> Result<PublishedDocument, DocumentError> {
        let mut state = self.lock();
        state.published_fetches.push((id.clone(), version));
        let doc = state.published.get(id).cloned().ok_or_else(|| not_found(id))?;
        Ok(match version {
            Some(v) => PublishedDocument { version: v, ..doc },
            None => doc,
        })
    }
}

impl EditableBackend for MockBackend {
    async fn fetch_editable(
        &self,
        id: &DocumentId,
        query: EditorQuery,
    ) -> Result<Document, DocumentError> {
        let mut state = self.lock();
        state.editable_fetches.push((id.clone(), query));
        if state.fail_fetch {
            return Err(DocumentError::BackendRequestFailed(BackendError::new(
                Some(503),
                json!({"error": "unavailable"}),
            )));
        }
        let doc = state.documents.get(id).cloned().ok_or_else(|| not_found(id))?;
        Ok(match query {
            EditorQuery::Version(v) => Document { version: v, ..doc },
            _ => doc,
        })
    }

    async fn update(
        &self,
        id: &DocumentId,
        update: &DocumentUpdate,
    ) -> Result<Document, DocumentError> {
        let mut state = self.lock();
        state.updates.push((id.clone(), update.clone()));
        let doc = state.documents.get_mut(id).ok_or_else(|| not_found(id))?;
        if update.version != doc.version {
            return Err(DocumentError::VersionConflict(BackendError::new(
                Some(409),
                json!({"error": format!(
                    "Trying to update version {} of document from version {}, which is too old",
                    doc.version, update.version
                )}),
            )));
        }
        doc.version += 1;
        doc.draft_changes = None;
        doc.is_version_of_draft_valid = None;
        Ok(doc.clone())
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), DocumentError> {
        let mut state = self.lock();
        state.deletes.push(id.clone());
        state.documents.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn autosave_draft(
        &self,
        id: &DocumentId,
        autosave: &DraftAutosave,
    ) -> Result<AutosaveReceipt, DocumentError> {
        let mut state = self.lock();
        state.autosaves.push((id.clone(), autosave.clone()));
        if state.fail_autosave {
            return Err(DocumentError::BackendRequestFailed(BackendError::new(
                Some(500),
                json!({"error": "autosave failed"}),
            )));
        }
        let doc = state.documents.get_mut(id).ok_or_else(|| not_found(id))?;
        let next_id = doc.effective_draft_id() + 1;
        let valid = autosave.version == doc.version;
        doc.draft_change_list_id = Some(next_id);
        doc.draft_changes = Some(autosave.change_list.clone());
        doc.is_version_of_draft_valid = Some(valid);
        Ok(AutosaveReceipt {
            draft_change_list_id: next_id,
            is_version_of_draft_valid: Some(valid),
        })
    }

    async fn discard_draft(&self, id: &DocumentId) -> Result<(), DocumentError> {
        let mut state = self.lock();
        state.discards.push(id.clone());
        if let Some(doc) = state.documents.get_mut(id) {
            doc.draft_changes = None;
            doc.is_version_of_draft_valid = None;
        }
        Ok(())
    }
}
