//! reqwest client for the authoring backend.
//!
//! Implements both `EditableBackend` and `ReadOnlyBackend` from
//! `draftkeep-core`. Responses are decoded into the typed schemas from
//! `draftkeep-types`; error bodies are passed through as JSON without
//! interpretation, except that a stale-version rejection on the update
//! endpoint is reported as `VersionConflict`.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use draftkeep_core::repository::backend::{EditableBackend, EditorQuery, ReadOnlyBackend};
use draftkeep_types::config::ClientConfig;
use draftkeep_types::document::{
    AutosaveReceipt, Document, DocumentId, DocumentUpdate, DraftAutosave, PublishedDocument,
};
use draftkeep_types::error::{BackendError, DocumentError};

// ---------------------------------------------------------------------------
// Endpoint paths
// ---------------------------------------------------------------------------

const EDITOR_DATA_PATH: &str = "createhandler/data";
const AUTOSAVE_DRAFT_PATH: &str = "createhandler/autosave_draft";
const PUBLISHED_PATH: &str = "explorehandler/init";

/// Header carrying the CSRF token on mutating requests.
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Fragment of the backend's stale-version error message.
const STALE_VERSION_MARKER: &str = "too old";

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Backend client over HTTP. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpDocumentBackend {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    csrf_token: Option<String>,
}

impl HttpDocumentBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, DocumentError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DocumentError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    fn url(&self, path: &str, id: &DocumentId) -> String {
        format!("{}/{path}/{id}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn mutating(&self, request: RequestBuilder) -> RequestBuilder {
        let request = self.authorize(request);
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DocumentError> {
        let response = request
            .send()
            .await
            .map_err(|e| DocumentError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Backend response");
        if status.is_success() {
            Ok(response)
        } else {
            Err(DocumentError::BackendRequestFailed(
                backend_error(status, response).await,
            ))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DocumentError> {
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| DocumentError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| DocumentError::InvalidResponse(e.to_string()))
    }
}

/// Build a `BackendError` from a non-success response, keeping the body as
/// JSON when it parses and as a JSON string otherwise.
async fn backend_error(status: StatusCode, response: Response) -> BackendError {
    let text = response.text().await.unwrap_or_default();
    let payload = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    BackendError::new(Some(status.as_u16()), payload)
}

/// Reclassify an update failure caused by a stale base version.
fn classify_update_error(error: DocumentError) -> DocumentError {
    match error {
        DocumentError::BackendRequestFailed(e) if is_stale_version(&e) => {
            DocumentError::VersionConflict(e)
        }
        other => other,
    }
}

fn is_stale_version(error: &BackendError) -> bool {
    match error.status {
        Some(409) => true,
        Some(400) => error
            .payload
            .get("error")
            .and_then(Value::as_str)
            .is_some_and(|msg| msg.contains(STALE_VERSION_MARKER)),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Port implementations
// ---------------------------------------------------------------------------

impl ReadOnlyBackend for HttpDocumentBackend {
    async fn fetch_published(
        &self,
        id: &DocumentId,
        version: Option<u64>,
    ) -> Result<PublishedDocument, DocumentError> {
        let mut request = self.authorize(self.http.get(self.url(PUBLISHED_PATH, id)));
        if let Some(v) = version {
            request = request.query(&[("v", v)]);
        }
        self.send_json(request).await
    }
}

impl EditableBackend for HttpDocumentBackend {
    async fn fetch_editable(
        &self,
        id: &DocumentId,
        query: EditorQuery,
    ) -> Result<Document, DocumentError> {
        let request = self.authorize(self.http.get(self.url(EDITOR_DATA_PATH, id)));
        let request = match query {
            EditorQuery::Latest => request,
            EditorQuery::WithDraftApplied => request.query(&[("apply_draft", "true")]),
            EditorQuery::Version(v) => request.query(&[("v", v)]),
        };
        self.send_json(request).await
    }

    async fn update(
        &self,
        id: &DocumentId,
        update: &DocumentUpdate,
    ) -> Result<Document, DocumentError> {
        let request = self.mutating(self.http.put(self.url(EDITOR_DATA_PATH, id)).json(update));
        self.send_json(request).await.map_err(classify_update_error)
    }

    async fn delete(&self, id: &DocumentId) -> Result<(), DocumentError> {
        let request = self.mutating(self.http.delete(self.url(EDITOR_DATA_PATH, id)));
        self.send(request).await.map(|_| ())
    }

    async fn autosave_draft(
        &self,
        id: &DocumentId,
        autosave: &DraftAutosave,
    ) -> Result<AutosaveReceipt, DocumentError> {
        let request = self.mutating(
            self.http
                .put(self.url(AUTOSAVE_DRAFT_PATH, id))
                .json(autosave),
        );
        self.send_json(request).await
    }

    async fn discard_draft(&self, id: &DocumentId) -> Result<(), DocumentError> {
        let request = self.mutating(self.http.post(self.url(AUTOSAVE_DRAFT_PATH, id)));
        self.send(request).await.map(|_| ())
    }
}
