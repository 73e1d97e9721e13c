//! In-memory cache of published documents.
//!
//! `ReadOnlyDocumentCache` holds at most one published snapshot per document
//! ID, backed by `DashMap`. It is constructed explicitly and shared by `Arc`
//! for the lifetime of the process; there is no global instance. Concurrent
//! loads for the same ID are not coalesced: each one hits the backend and
//! the last to resolve wins the cache slot.

use dashmap::DashMap;
use tracing::debug;

use draftkeep_types::document::{DocumentId, PublishedDocument};
use draftkeep_types::error::DocumentError;

use crate::repository::backend::ReadOnlyBackend;

pub struct ReadOnlyDocumentCache<R: ReadOnlyBackend> {
    backend: R,
    entries: DashMap<DocumentId, PublishedDocument>,
}

impl<R: ReadOnlyBackend> ReadOnlyDocumentCache<R> {
    pub fn new(backend: R) -> Self {
        Self {
            backend,
            entries: DashMap::new(),
        }
    }

    /// Fetch from the backend, bypassing (and not updating) the cache.
    pub async fn fetch(
        &self,
        id: &DocumentId,
        version: Option<u64>,
    ) -> Result<PublishedDocument, DocumentError> {
        self.backend.fetch_published(id, version).await
    }

    /// Return the cached latest snapshot, fetching and caching it on a miss.
    pub async fn load_latest(&self, id: &DocumentId) -> Result<PublishedDocument, DocumentError> {
        // Clone out immediately; never hold a DashMap guard across `.await`.
        if let Some(cached) = self.entries.get(id).map(|r| r.value().clone()) {
            debug!(document_id = %id, "Read-only cache hit");
            return Ok(cached);
        }

        debug!(document_id = %id, "Read-only cache miss");
        let document = self.backend.fetch_published(id, None).await?;
        self.entries.insert(id.clone(), document.clone());
        Ok(document)
    }

    pub fn is_cached(&self, id: &DocumentId) -> bool {
        self.entries.contains_key(id)
    }

    /// Overwrite the cache entry with a document obtained elsewhere.
    pub fn cache_put(&self, id: &DocumentId, document: PublishedDocument) {
        self.entries.insert(id.clone(), document);
    }

    pub fn invalidate(&self, id: &DocumentId) {
        if self.entries.remove(id).is_some() {
            debug!(document_id = %id, "Invalidated read-only cache entry");
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
