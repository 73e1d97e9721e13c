//! Sinks for session events the user has to see.

use tracing::{info, warn};

use draftkeep_types::document::DocumentId;
use draftkeep_types::session::DraftConflict;

/// Receives events the editing session cannot resolve on its own.
///
/// A UI shows the conflict to the user; a reload request tells the host to
/// rebuild its view from the freshly reconciled document.
pub trait SessionObserver: Send + Sync {
    /// A local draft was superseded by a newer server draft.
    fn conflict(&self, conflict: &DraftConflict);

    /// The local draft was pushed to the server and the session is reloading.
    fn reload_requested(&self, document_id: &DocumentId);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn conflict(&self, _conflict: &DraftConflict) {}

    fn reload_requested(&self, _document_id: &DocumentId) {}
}

/// Observer that reports events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn conflict(&self, conflict: &DraftConflict) {
        warn!(
            document_id = %conflict.document_id,
            local_draft_id = conflict.local_draft_id,
            server_draft_id = conflict.server_draft_id,
            discarded = conflict.discarded_changes.len(),
            "Local draft superseded by a newer server draft"
        );
    }

    fn reload_requested(&self, document_id: &DocumentId) {
        info!(document_id = %document_id, "Local draft restored, reloading session");
    }
}
