//! Editing session controller.
//!
//! Drives a document through `Idle -> Fetching -> Reconciling -> {Ready,
//! ConflictPending}` and owns the autosave/save/discard operations once the
//! session is ready.
//!
//! Reconciliation compares the local draft against the draft ID the server
//! reports:
//! - no local draft: the fetched document is used as-is.
//! - matching draft ID: the local changes are newer than anything the
//!   server has. They are autosaved, then the session reloads from the
//!   server instead of merging in place, so there is only ever one
//!   in-memory representation of the document.
//! - different draft ID: the local draft was superseded (for example by
//!   another tab). The changes are surfaced as a conflict and never merged;
//!   there is no merge algorithm for the change format.

use std::sync::Arc;

use tracing::{debug, warn};

use draftkeep_types::document::{AutosaveReceipt, ChangeList, Document, DocumentId};
use draftkeep_types::error::SessionError;
use draftkeep_types::session::{DraftConflict, SessionState};

use crate::document::gateway::EditableDocumentGateway;
use crate::repository::backend::{EditableBackend, ReadOnlyBackend};
use crate::session::observer::SessionObserver;
use crate::storage::draft_store::DraftStore;
use crate::storage::local_storage::LocalStorage;

/// Result of loading a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionLoad {
    /// No local draft; the fetched document is current.
    Ready(Document),
    /// A local draft was pushed to the server and the session reloaded.
    Reloaded(Document),
    /// The local draft is stale; the session waits for the user.
    Conflict(DraftConflict),
}

/// One editing session over one document at a time.
///
/// Single writer: every transition takes `&mut self`. Loads are not
/// cancellable; a second `load` simply replaces the session state when it
/// resolves.
pub struct DocumentSession<E, R, S, O>
where
    E: EditableBackend,
    R: ReadOnlyBackend,
    S: LocalStorage,
    O: SessionObserver,
{
    gateway: Arc<EditableDocumentGateway<E, R>>,
    draft_store: Arc<DraftStore<S>>,
    observer: O,
    state: SessionState,
    document_id: Option<DocumentId>,
    document: Option<Document>,
    conflict: Option<DraftConflict>,
}

impl<E, R, S, O> DocumentSession<E, R, S, O>
where
    E: EditableBackend,
    R: ReadOnlyBackend,
    S: LocalStorage,
    O: SessionObserver,
{
    pub fn new(
        gateway: Arc<EditableDocumentGateway<E, R>>,
        draft_store: Arc<DraftStore<S>>,
        observer: O,
    ) -> Self {
        Self {
            gateway,
            draft_store,
            observer,
            state: SessionState::Idle,
            document_id: None,
            document: None,
            conflict: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    /// The document as last fetched or committed.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The pending conflict, while in `ConflictPending`.
    pub fn conflict(&self) -> Option<&DraftConflict> {
        self.conflict.as_ref()
    }

    pub fn draft_store(&self) -> &Arc<DraftStore<S>> {
        &self.draft_store
    }

    /// Start a session on `document_id` and reconcile it with the local draft.
    pub async fn load(&mut self, document_id: &DocumentId) -> Result<SessionLoad, SessionError> {
        self.document_id = Some(document_id.clone());
        self.document = None;
        self.conflict = None;
        self.transition(SessionState::Fetching);

        let document = match self.gateway.fetch_with_draft_applied(document_id).await {
            Ok(document) => document,
            Err(e) => {
                self.reset();
                return Err(e.into());
            }
        };

        self.transition(SessionState::Reconciling);

        let Some(draft) = self.draft_store.load(document_id).await else {
            if document.has_server_draft() && document.is_version_of_draft_valid == Some(false) {
                warn!(
                    document_id = %document_id,
                    "Server draft was recorded against an older version and was not applied"
                );
            }
            return Ok(SessionLoad::Ready(self.become_ready(document)));
        };

        let server_draft_id = document.effective_draft_id();
        if !draft.is_valid(server_draft_id) {
            let conflict = DraftConflict {
                document_id: document_id.clone(),
                discarded_changes: draft.change_list,
                local_draft_id: draft.draft_id,
                server_draft_id,
            };
            self.observer.conflict(&conflict);
            self.document = Some(document);
            self.conflict = Some(conflict.clone());
            self.transition(SessionState::ConflictPending);
            return Ok(SessionLoad::Conflict(conflict));
        }

        debug!(
            document_id = %document_id,
            draft_id = draft.draft_id,
            changes = draft.change_list.len(),
            "Local draft is current, pushing it to the server"
        );
        self.document = Some(document);
        if let Err(e) = self.autosave_change_list(draft.change_list).await {
            self.reset();
            return Err(e);
        }

        self.observer.reload_requested(document_id);
        self.reload(document_id).await.map(SessionLoad::Reloaded)
    }

    /// Persist `change_list` locally, then push it as the server draft.
    ///
    /// The local copy is written first so a crash or network failure during
    /// the request still leaves a recoverable draft. It is removed only once
    /// the server has accepted the draft; on failure it stays for the next
    /// session load to retry.
    pub async fn autosave_change_list(
        &mut self,
        change_list: ChangeList,
    ) -> Result<AutosaveReceipt, SessionError> {
        self.require(&[SessionState::Ready, SessionState::Reconciling], "autosave")?;
        let (id, version, draft_id) = {
            let document = self.current_document("autosave")?;
            (
                document.document_id.clone(),
                document.version,
                document.effective_draft_id(),
            )
        };

        self.draft_store.save(&id, &change_list, draft_id).await;

        match self
            .gateway
            .autosave_draft(&id, version, change_list.clone())
            .await
        {
            Ok(receipt) => {
                self.draft_store.remove(&id).await;
                if let Some(document) = self.document.as_mut() {
                    document.draft_change_list_id = Some(receipt.draft_change_list_id);
                    document.draft_changes = Some(change_list);
                    document.is_version_of_draft_valid = receipt.is_version_of_draft_valid;
                }
                debug!(
                    document_id = %id,
                    draft_change_list_id = receipt.draft_change_list_id,
                    "Autosaved draft"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(document_id = %id, error = %e, "Autosave failed, keeping local draft");
                Err(e.into())
            }
        }
    }

    /// Commit `change_list` against the session's current version.
    pub async fn save(
        &mut self,
        commit_message: &str,
        change_list: ChangeList,
    ) -> Result<Document, SessionError> {
        self.require(&[SessionState::Ready], "save")?;
        let (id, version) = {
            let document = self.current_document("save")?;
            (document.document_id.clone(), document.version)
        };

        let updated = self
            .gateway
            .update(&id, version, commit_message, change_list)
            .await?;

        self.draft_store.remove(&id).await;
        self.document = Some(updated.clone());
        Ok(updated)
    }

    /// Clear the server-held and local drafts, then reload the session.
    ///
    /// Safe to call repeatedly. Also allowed from `Idle` after a failed
    /// load, so a draft the backend keeps rejecting can still be dropped.
    pub async fn discard_draft(&mut self) -> Result<Document, SessionError> {
        self.require(
            &[
                SessionState::Ready,
                SessionState::ConflictPending,
                SessionState::Idle,
            ],
            "discard draft",
        )?;
        let id = self.require_document_id("discard draft")?;

        self.gateway.discard_draft(&id).await?;
        self.draft_store.remove(&id).await;
        debug!(document_id = %id, "Discarded draft");

        self.observer.reload_requested(&id);
        self.reload(&id).await
    }

    /// Drop the stale local draft and continue with the fetched document.
    pub async fn acknowledge_conflict(&mut self) -> Result<Document, SessionError> {
        self.require(&[SessionState::ConflictPending], "acknowledge conflict")?;
        let id = self.require_document_id("acknowledge conflict")?;
        self.draft_store.remove(&id).await;

        let document = self
            .document
            .take()
            .ok_or(SessionError::InvalidState {
                operation: "acknowledge conflict",
                state: self.state,
            })?;
        Ok(self.become_ready(document))
    }

    async fn reload(&mut self, document_id: &DocumentId) -> Result<Document, SessionError> {
        self.transition(SessionState::Fetching);
        match self.gateway.fetch_with_draft_applied(document_id).await {
            Ok(document) => Ok(self.become_ready(document)),
            Err(e) => {
                self.reset();
                Err(e.into())
            }
        }
    }

    fn become_ready(&mut self, document: Document) -> Document {
        self.document = Some(document.clone());
        self.conflict = None;
        self.transition(SessionState::Ready);
        document
    }

    fn reset(&mut self) {
        self.document = None;
        self.conflict = None;
        self.transition(SessionState::Idle);
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    fn require(
        &self,
        allowed: &[SessionState],
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        match &self.conflict {
            Some(conflict) if self.state == SessionState::ConflictPending => {
                Err(SessionError::DraftStale {
                    document_id: conflict.document_id.clone(),
                    local_draft_id: conflict.local_draft_id,
                    server_draft_id: conflict.server_draft_id,
                })
            }
            _ => Err(SessionError::InvalidState {
                operation,
                state: self.state,
            }),
        }
    }

    fn current_document(&self, operation: &'static str) -> Result<&Document, SessionError> {
        self.document.as_ref().ok_or(SessionError::InvalidState {
            operation,
            state: self.state,
        })
    }

    fn require_document_id(&self, operation: &'static str) -> Result<DocumentId, SessionError> {
        self.document_id.clone().ok_or(SessionError::InvalidState {
            operation,
            state: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use draftkeep_types::error::DocumentError;

    use crate::document::read_only_cache::ReadOnlyDocumentCache;
    use crate::repository::backend::EditorQuery;
    use crate::session::observer::NoopObserver;
    use crate::storage::memory::MemoryLocalStorage;
    use crate::testing::{MockBackend, change, doc_id, document, published};

    #[derive(Default)]
    struct RecordingObserver {
        conflicts: Mutex<Vec<DraftConflict>>,
        reloads: Mutex<Vec<DocumentId>>,
    }

    impl SessionObserver for Arc<RecordingObserver> {
        fn conflict(&self, conflict: &DraftConflict) {
            self.conflicts.lock().unwrap().push(conflict.clone());
        }

        fn reload_requested(&self, document_id: &DocumentId) {
            self.reloads.lock().unwrap().push(document_id.clone());
        }
    }

    type TestSession =
        DocumentSession<MockBackend, MockBackend, MemoryLocalStorage, Arc<RecordingObserver>>;

    struct Harness {
        backend: MockBackend,
        storage: MemoryLocalStorage,
        observer: Arc<RecordingObserver>,
        session: TestSession,
    }

    async fn harness(backend: MockBackend) -> Harness {
        let storage = MemoryLocalStorage::new();
        let draft_store = Arc::new(DraftStore::init(storage.clone()).await);
        let cache = Arc::new(ReadOnlyDocumentCache::new(backend.clone()));
        let gateway = Arc::new(EditableDocumentGateway::new(backend.clone(), cache));
        let observer = Arc::new(RecordingObserver::default());
        let session = DocumentSession::new(gateway, draft_store, observer.clone());
        Harness {
            backend,
            storage,
            observer,
            session,
        }
    }

    #[tokio::test]
    async fn no_local_draft_goes_straight_to_ready() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(2)))).await;

        let outcome = h.session.load(&doc_id("q1")).await.unwrap();

        assert!(matches!(outcome, SessionLoad::Ready(ref d) if d.version == 3));
        assert_eq!(h.session.state(), SessionState::Ready);
        let state = h.backend.lock();
        assert_eq!(
            state.editable_fetches,
            vec![(doc_id("q1"), EditorQuery::WithDraftApplied)]
        );
        assert!(state.autosaves.is_empty());
        assert!(state.updates.is_empty());
        assert!(h.observer.reloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn matching_draft_autosaves_once_then_reloads_once() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(7)))).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 7)
            .await;

        let outcome = h.session.load(&doc_id("q1")).await.unwrap();

        {
            let state = h.backend.lock();
            assert_eq!(state.autosaves.len(), 1);
            let (id, autosave) = &state.autosaves[0];
            assert_eq!(id, &doc_id("q1"));
            assert_eq!(autosave.version, 3);
            assert_eq!(autosave.change_list, vec![change("editA")]);
            // Initial fetch plus exactly one reload.
            assert_eq!(state.editable_fetches.len(), 2);
        }
        assert_eq!(*h.observer.reloads.lock().unwrap(), vec![doc_id("q1")]);

        let SessionLoad::Reloaded(document) = outcome else {
            panic!("expected reload, got {outcome:?}");
        };
        assert_eq!(document.draft_change_list_id, Some(8));
        assert_eq!(document.draft_changes, Some(vec![change("editA")]));
        assert_eq!(h.session.state(), SessionState::Ready);
        assert!(h.session.draft_store().load(&doc_id("q1")).await.is_none());
    }

    #[tokio::test]
    async fn missing_server_draft_id_matches_local_draft_zero() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 1, None))).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 0)
            .await;

        let outcome = h.session.load(&doc_id("q1")).await.unwrap();

        assert!(matches!(outcome, SessionLoad::Reloaded(_)));
        assert_eq!(h.backend.lock().autosaves.len(), 1);
    }

    #[tokio::test]
    async fn superseded_draft_surfaces_conflict_without_autosave() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(9)))).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 7)
            .await;

        let outcome = h.session.load(&doc_id("q1")).await.unwrap();

        let expected = DraftConflict {
            document_id: doc_id("q1"),
            discarded_changes: vec![change("editA")],
            local_draft_id: 7,
            server_draft_id: 9,
        };
        assert_eq!(outcome, SessionLoad::Conflict(expected.clone()));
        assert_eq!(h.session.state(), SessionState::ConflictPending);
        assert_eq!(h.session.conflict(), Some(&expected));
        assert_eq!(*h.observer.conflicts.lock().unwrap(), vec![expected]);
        assert!(h.backend.lock().autosaves.is_empty());
        assert!(h.observer.reloads.lock().unwrap().is_empty());
        // Nothing is thrown away until the user acknowledges.
        assert!(h.session.draft_store().load(&doc_id("q1")).await.is_some());
    }

    #[tokio::test]
    async fn failed_reconciliation_autosave_keeps_draft_and_skips_reload() {
        let backend = MockBackend::new().with_document(document("q1", 3, Some(7)));
        backend.lock().fail_autosave = true;
        let mut h = harness(backend).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 7)
            .await;

        let err = h.session.load(&doc_id("q1")).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Document(DocumentError::BackendRequestFailed(_))
        ));
        assert_eq!(h.session.state(), SessionState::Idle);
        assert!(h.observer.reloads.lock().unwrap().is_empty());
        assert_eq!(h.backend.lock().editable_fetches.len(), 1);

        let draft = h.session.draft_store().load(&doc_id("q1")).await.unwrap();
        assert_eq!(draft.change_list, vec![change("editA")]);
        assert_eq!(draft.draft_id, 7);
    }

    #[tokio::test]
    async fn session_without_observer_still_reports_conflict() {
        let backend = MockBackend::new().with_document(document("q1", 3, Some(9)));
        let draft_store = Arc::new(DraftStore::init(MemoryLocalStorage::new()).await);
        let cache = Arc::new(ReadOnlyDocumentCache::new(backend.clone()));
        let gateway = Arc::new(EditableDocumentGateway::new(backend.clone(), cache));
        let mut session = DocumentSession::new(gateway, Arc::clone(&draft_store), NoopObserver);
        draft_store.save(&doc_id("q1"), &[change("editA")], 7).await;

        let outcome = session.load(&doc_id("q1")).await.unwrap();

        let SessionLoad::Conflict(conflict) = outcome else {
            panic!("expected conflict, got {outcome:?}");
        };
        assert_eq!(conflict.server_draft_id, 9);
        assert_eq!(session.state(), SessionState::ConflictPending);
        assert!(backend.lock().autosaves.is_empty());
    }

    #[tokio::test]
    async fn rejected_draft_can_be_discarded_after_failed_load() {
        let backend = MockBackend::new().with_document(document("q1", 3, Some(7)));
        backend.lock().fail_autosave = true;
        let mut h = harness(backend).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 7)
            .await;
        assert!(h.session.load(&doc_id("q1")).await.is_err());
        assert_eq!(h.session.state(), SessionState::Idle);

        let document = h.session.discard_draft().await.unwrap();

        assert_eq!(document.version, 3);
        assert_eq!(h.session.state(), SessionState::Ready);
        assert_eq!(h.backend.lock().discards, vec![doc_id("q1")]);
        assert!(h.storage.get_item("draft_q1").await.unwrap().is_none());

        let reloaded = h.session.load(&doc_id("q1")).await.unwrap();
        assert!(matches!(reloaded, SessionLoad::Ready(_)));
        // Only the rejected attempt from the first load.
        assert_eq!(h.backend.lock().autosaves.len(), 1);
    }

    #[tokio::test]
    async fn autosave_failure_leaves_local_draft_unchanged() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(2)))).await;
        h.session.load(&doc_id("q1")).await.unwrap();
        h.backend.lock().fail_autosave = true;

        let result = h.session.autosave_change_list(vec![change("editB")]).await;

        assert!(result.is_err());
        let draft = h.session.draft_store().load(&doc_id("q1")).await.unwrap();
        assert_eq!(draft.change_list, vec![change("editB")]);
        assert_eq!(draft.draft_id, 2);
        assert_eq!(h.session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn autosave_success_removes_local_draft_and_records_id() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(2)))).await;
        h.session.load(&doc_id("q1")).await.unwrap();

        let receipt = h
            .session
            .autosave_change_list(vec![change("editB")])
            .await
            .unwrap();

        assert_eq!(receipt.draft_change_list_id, 3);
        assert!(h.storage.get_item("draft_q1").await.unwrap().is_none());
        let document = h.session.document().unwrap();
        assert_eq!(document.draft_change_list_id, Some(3));
        assert_eq!(document.is_version_of_draft_valid, Some(true));
    }

    #[tokio::test]
    async fn save_commits_against_current_version() {
        let backend = MockBackend::new()
            .with_document(document("q1", 3, Some(2)))
            .with_published(published("q1", 3));
        let mut h = harness(backend).await;
        h.session.load(&doc_id("q1")).await.unwrap();
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 2)
            .await;

        let updated = h
            .session
            .save("Reword prompt", vec![change("editA")])
            .await
            .unwrap();

        assert_eq!(updated.version, 4);
        assert_eq!(h.session.document().unwrap().version, 4);
        assert_eq!(h.backend.lock().updates[0].1.version, 3);
        assert!(h.session.draft_store().load(&doc_id("q1")).await.is_none());
    }

    #[tokio::test]
    async fn save_on_stale_version_passes_conflict_through() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, None))).await;
        h.session.load(&doc_id("q1")).await.unwrap();
        // Someone else commits in the meantime.
        h.backend
            .lock()
            .documents
            .get_mut(&doc_id("q1"))
            .unwrap()
            .version = 5;

        let err = h
            .session
            .save("late", vec![change("editA")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Document(DocumentError::VersionConflict(_))
        ));
        assert_eq!(h.session.state(), SessionState::Ready);
        assert_eq!(h.session.document().unwrap().version, 3);
    }

    #[tokio::test]
    async fn edits_blocked_while_conflict_pending() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(9)))).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 7)
            .await;
        h.session.load(&doc_id("q1")).await.unwrap();

        let err = h
            .session
            .save("blocked", vec![change("editB")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::DraftStale {
                local_draft_id: 7,
                server_draft_id: 9,
                ..
            }
        ));
        assert!(h.backend.lock().updates.is_empty());
    }

    #[tokio::test]
    async fn acknowledge_conflict_drops_draft_and_becomes_ready() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(9)))).await;
        h.session
            .draft_store()
            .save(&doc_id("q1"), &[change("editA")], 7)
            .await;
        h.session.load(&doc_id("q1")).await.unwrap();

        let document = h.session.acknowledge_conflict().await.unwrap();

        assert_eq!(document.version, 3);
        assert_eq!(h.session.state(), SessionState::Ready);
        assert!(h.session.conflict().is_none());
        assert!(h.session.draft_store().load(&doc_id("q1")).await.is_none());
    }

    #[tokio::test]
    async fn discard_draft_is_idempotent_and_reloads() {
        let mut h = harness(MockBackend::new().with_document(document("q1", 3, Some(2)))).await;
        h.session.load(&doc_id("q1")).await.unwrap();
        h.session
            .autosave_change_list(vec![change("editA")])
            .await
            .unwrap();

        let document = h.session.discard_draft().await.unwrap();
        assert!(document.draft_changes.is_none());
        h.session.discard_draft().await.unwrap();

        assert_eq!(h.backend.lock().discards.len(), 2);
        assert_eq!(h.observer.reloads.lock().unwrap().len(), 2);
        assert_eq!(h.session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn fetch_failure_returns_to_idle() {
        let backend = MockBackend::new().with_document(document("q1", 3, None));
        backend.lock().fail_fetch = true;
        let mut h = harness(backend).await;

        let err = h.session.load(&doc_id("q1")).await.unwrap_err();

        assert!(err.to_string().contains("503"));
        assert_eq!(h.session.state(), SessionState::Idle);
        assert!(h.session.document().is_none());
    }

    #[tokio::test]
    async fn operations_before_load_are_rejected() {
        let mut h = harness(MockBackend::new()).await;

        let err = h
            .session
            .autosave_change_list(vec![change("editA")])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SessionError::InvalidState {
                operation: "autosave",
                state: SessionState::Idle,
            }
        );
        assert!(h.session.discard_draft().await.is_err());
        assert!(h.storage.keys().await.unwrap().is_empty());
    }
}
