//! Authoring backend traits.
//!
//! The backend serves two representations of a document: the editor shape
//! (with the user's draft state) and the published reader shape. They are
//! split into two traits so the read-only cache can be wired to a backend
//! without edit rights.

use draftkeep_types::document::{
    AutosaveReceipt, Document, DocumentId, DocumentUpdate, DraftAutosave, PublishedDocument,
};
use draftkeep_types::error::DocumentError;

/// Which editor representation to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorQuery {
    /// Latest committed version.
    #[default]
    Latest,
    /// Latest committed version with the server-held draft merged in.
    WithDraftApplied,
    /// A specific historical version.
    Version(u64),
}

/// Reader-facing document endpoint.
pub trait ReadOnlyBackend: Send + Sync {
    /// Fetch the published document, at `version` or the latest one.
    fn fetch_published(
        &self,
        id: &DocumentId,
        version: Option<u64>,
    ) -> impl std::future::Future<Output = Result<PublishedDocument, DocumentError>> + Send;
}

/// Editor-facing document endpoints.
///
/// Implementations pass backend error payloads through unchanged and never
/// retry.
pub trait EditableBackend: Send + Sync {
    /// Fetch the editor representation.
    fn fetch_editable(
        &self,
        id: &DocumentId,
        query: EditorQuery,
    ) -> impl std::future::Future<Output = Result<Document, DocumentError>> + Send;

    /// Commit a change list. Fails with `VersionConflict` when
    /// `update.version` is older than the stored version.
    fn update(
        &self,
        id: &DocumentId,
        update: &DocumentUpdate,
    ) -> impl std::future::Future<Output = Result<Document, DocumentError>> + Send;

    /// Delete a document.
    fn delete(
        &self,
        id: &DocumentId,
    ) -> impl std::future::Future<Output = Result<(), DocumentError>> + Send;

    /// Record a server-side draft for the current user.
    fn autosave_draft(
        &self,
        id: &DocumentId,
        autosave: &DraftAutosave,
    ) -> impl std::future::Future<Output = Result<AutosaveReceipt, DocumentError>> + Send;

    /// Clear the server-side draft for the current user. Idempotent.
    fn discard_draft(
        &self,
        id: &DocumentId,
    ) -> impl std::future::Future<Output = Result<(), DocumentError>> + Send;
}
