//! Application state wiring the session services together.
//!
//! Services are generic over backend/storage/observer traits; AppState pins
//! them to the HTTP backend, the SQLite draft store and the tracing observer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use draftkeep_core::document::gateway::EditableDocumentGateway;
use draftkeep_core::document::read_only_cache::ReadOnlyDocumentCache;
use draftkeep_core::session::controller::DocumentSession;
use draftkeep_core::session::observer::TracingObserver;
use draftkeep_core::storage::draft_store::DraftStore;
use draftkeep_infra::config::{load_client_config, resolve_data_dir};
use draftkeep_infra::http::backend::HttpDocumentBackend;
use draftkeep_infra::sqlite::local_storage::SqliteLocalStorage;
use draftkeep_infra::sqlite::pool::{DatabasePool, database_url};
use draftkeep_types::config::ClientConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteCache = ReadOnlyDocumentCache<HttpDocumentBackend>;

pub type ConcreteGateway = EditableDocumentGateway<HttpDocumentBackend, HttpDocumentBackend>;

pub type ConcreteDraftStore = DraftStore<SqliteLocalStorage>;

pub type ConcreteSession =
    DocumentSession<HttpDocumentBackend, HttpDocumentBackend, SqliteLocalStorage, TracingObserver>;

/// Shared application state for CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub gateway: Arc<ConcreteGateway>,
    pub draft_store: Arc<ConcreteDraftStore>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load config, open the draft database and wire the services.
    ///
    /// `backend_override` replaces the configured backend URL.
    pub async fn init(backend_override: Option<String>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let mut config = load_client_config(&data_dir).await;
        if let Some(url) = backend_override {
            config.backend_url = url;
        }

        let db_url = database_url(&data_dir, &config.draft_database);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("Failed to open draft database")?;
        let draft_store = DraftStore::init(SqliteLocalStorage::new(db_pool)).await;

        let backend = HttpDocumentBackend::new(&config).context("Failed to build HTTP client")?;
        let cache = Arc::new(ReadOnlyDocumentCache::new(backend.clone()));
        let gateway = EditableDocumentGateway::new(backend, cache);

        tracing::debug!(
            backend_url = %config.backend_url,
            data_dir = %data_dir.display(),
            drafts_available = draft_store.is_available(),
            "Application state initialized"
        );

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            draft_store: Arc::new(draft_store),
            data_dir,
        })
    }

    /// A fresh editing session sharing this state's gateway and draft store.
    pub fn session(&self) -> ConcreteSession {
        DocumentSession::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.draft_store),
            TracingObserver,
        )
    }

    pub fn cache(&self) -> &Arc<ConcreteCache> {
        self.gateway.read_only_cache()
    }
}
