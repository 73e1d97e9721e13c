//! Editable-document gateway.
//!
//! Wraps the editor-facing backend. Every successful write (update or
//! delete) invalidates the read-only cache entry for that document, because
//! the published snapshot no longer matches what the editor committed.
//! Errors are passed through unmodified and nothing is retried.

use std::sync::Arc;

use tracing::{debug, warn};

use draftkeep_types::document::{
    AutosaveReceipt, Change, Document, DocumentId, DocumentUpdate, DraftAutosave,
};
use draftkeep_types::error::DocumentError;

use crate::document::read_only_cache::ReadOnlyDocumentCache;
use crate::repository::backend::{EditableBackend, EditorQuery, ReadOnlyBackend};

pub struct EditableDocumentGateway<E: EditableBackend, R: ReadOnlyBackend> {
    backend: E,
    read_only_cache: Arc<ReadOnlyDocumentCache<R>>,
}

impl<E: EditableBackend, R: ReadOnlyBackend> EditableDocumentGateway<E, R> {
    pub fn new(backend: E, read_only_cache: Arc<ReadOnlyDocumentCache<R>>) -> Self {
        Self {
            backend,
            read_only_cache,
        }
    }

    pub fn read_only_cache(&self) -> &Arc<ReadOnlyDocumentCache<R>> {
        &self.read_only_cache
    }

    pub async fn fetch(&self, id: &DocumentId) -> Result<Document, DocumentError> {
        self.backend.fetch_editable(id, EditorQuery::Latest).await
    }

    /// Fetch with any server-held draft merged in. Used when a session starts.
    pub async fn fetch_with_draft_applied(&self, id: &DocumentId) -> Result<Document, DocumentError> {
        self.backend
            .fetch_editable(id, EditorQuery::WithDraftApplied)
            .await
    }

    pub async fn fetch_version(
        &self,
        id: &DocumentId,
        version: u64,
    ) -> Result<Document, DocumentError> {
        self.backend
            .fetch_editable(id, EditorQuery::Version(version))
            .await
    }

    /// Commit `change_list` on top of `base_version`.
    ///
    /// Fails with `VersionConflict` if the document moved past
    /// `base_version`; the caller must refetch and re-apply.
    pub async fn update(
        &self,
        id: &DocumentId,
        base_version: u64,
        commit_message: &str,
        change_list: Vec<Change>,
    ) -> Result<Document, DocumentError> {
        if change_list.is_empty() {
            return Err(DocumentError::InvalidRequest(format!(
                "refusing to commit an empty change list to '{id}'"
            )));
        }

        let update = DocumentUpdate {
            version: base_version,
            commit_message: commit_message.to_string(),
            change_list,
        };

        match self.backend.update(id, &update).await {
            Ok(document) => {
                self.read_only_cache.invalidate(id);
                debug!(
                    document_id = %id,
                    from_version = base_version,
                    to_version = document.version,
                    "Committed document update"
                );
                Ok(document)
            }
            Err(e) => {
                warn!(document_id = %id, base_version, error = %e, "Document update rejected");
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<(), DocumentError> {
        self.backend.delete(id).await?;
        self.read_only_cache.invalidate(id);
        debug!(document_id = %id, "Deleted document");
        Ok(())
    }

    /// Record `change_list` as the user's server-side draft.
    pub async fn autosave_draft(
        &self,
        id: &DocumentId,
        version: u64,
        change_list: Vec<Change>,
    ) -> Result<AutosaveReceipt, DocumentError> {
        let autosave = DraftAutosave {
            version,
            change_list,
        };
        self.backend.autosave_draft(id, &autosave).await
    }

    pub async fn discard_draft(&self, id: &DocumentId) -> Result<(), DocumentError> {
        self.backend.discard_draft(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, change, doc_id, document, published};

    fn gateway(backend: &MockBackend) -> EditableDocumentGateway<MockBackend, MockBackend> {
        let cache = Arc::new(ReadOnlyDocumentCache::new(backend.clone()));
        EditableDocumentGateway::new(backend.clone(), cache)
    }

    #[tokio::test]
    async fn fetch_variants_use_matching_queries() {
        let backend = MockBackend::new().with_document(document("q1", 3, None));
        let gw = gateway(&backend);

        gw.fetch(&doc_id("q1")).await.unwrap();
        gw.fetch_with_draft_applied(&doc_id("q1")).await.unwrap();
        let old = gw.fetch_version(&doc_id("q1"), 1).await.unwrap();

        assert_eq!(old.version, 1);
        let queries: Vec<EditorQuery> =
            backend.lock().editable_fetches.iter().map(|(_, q)| *q).collect();
        assert_eq!(
            queries,
            vec![
                EditorQuery::Latest,
                EditorQuery::WithDraftApplied,
                EditorQuery::Version(1)
            ]
        );
    }

    #[tokio::test]
    async fn update_success_invalidates_read_only_cache() {
        let backend = MockBackend::new()
            .with_document(document("q1", 3, None))
            .with_published(published("q1", 3));
        let gw = gateway(&backend);

        gw.read_only_cache().load_latest(&doc_id("q1")).await.unwrap();
        assert!(gw.read_only_cache().is_cached(&doc_id("q1")));

        let updated = gw
            .update(&doc_id("q1"), 3, "Fix typo", vec![change("editA")])
            .await
            .unwrap();

        assert_eq!(updated.version, 4);
        assert!(!gw.read_only_cache().is_cached(&doc_id("q1")));
        let sent = backend.lock().updates[0].1.clone();
        assert_eq!(sent.version, 3);
        assert_eq!(sent.commit_message, "Fix typo");
    }

    #[tokio::test]
    async fn stale_update_is_version_conflict_and_keeps_cache() {
        let backend = MockBackend::new()
            .with_document(document("q1", 5, None))
            .with_published(published("q1", 5));
        let gw = gateway(&backend);
        gw.read_only_cache().load_latest(&doc_id("q1")).await.unwrap();

        let err = gw
            .update(&doc_id("q1"), 3, "stale", vec![change("editA")])
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentError::VersionConflict(_)));
        assert!(err.payload().unwrap()["error"].as_str().unwrap().contains("too old"));
        assert!(gw.read_only_cache().is_cached(&doc_id("q1")));
    }

    #[tokio::test]
    async fn empty_change_list_rejected_without_backend_call() {
        let backend = MockBackend::new().with_document(document("q1", 3, None));
        let gw = gateway(&backend);

        let err = gw.update(&doc_id("q1"), 3, "nothing", Vec::new()).await.unwrap_err();

        assert!(matches!(err, DocumentError::InvalidRequest(_)));
        assert!(backend.lock().updates.is_empty());
    }

    #[tokio::test]
    async fn delete_invalidates_read_only_cache() {
        let backend = MockBackend::new()
            .with_document(document("q1", 3, None))
            .with_published(published("q1", 3));
        let gw = gateway(&backend);
        gw.read_only_cache().load_latest(&doc_id("q1")).await.unwrap();

        gw.delete(&doc_id("q1")).await.unwrap();

        assert!(!gw.read_only_cache().is_cached(&doc_id("q1")));
        assert!(gw.fetch(&doc_id("q1")).await.is_err());
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_alone() {
        let backend = MockBackend::new().with_published(published("q1", 3));
        let gw = gateway(&backend);
        gw.read_only_cache().load_latest(&doc_id("q1")).await.unwrap();

        assert!(gw.delete(&doc_id("q1")).await.is_err());
        assert!(gw.read_only_cache().is_cached(&doc_id("q1")));
    }

    #[tokio::test]
    async fn autosave_returns_server_receipt() {
        let backend = MockBackend::new().with_document(document("q1", 3, Some(4)));
        let gw = gateway(&backend);

        let receipt = gw
            .autosave_draft(&doc_id("q1"), 3, vec![change("editA")])
            .await
            .unwrap();

        assert_eq!(receipt.draft_change_list_id, 5);
        assert_eq!(receipt.is_version_of_draft_valid, Some(true));
    }
}
