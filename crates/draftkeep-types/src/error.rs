use serde_json::Value;
use thiserror::Error;

use std::fmt;

use crate::document::DocumentId;
use crate::session::SessionState;

/// Errors from local storage media (used by trait definitions in draftkeep-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("query error: {0}")]
    Query(String),
}

/// A failed backend call, with the response body passed through unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct BackendError {
    /// HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Response body as JSON (a JSON string when the body was not JSON).
    pub payload: Value,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "backend returned {status}: {}", self.payload),
            None => write!(f, "backend unreachable: {}", self.payload),
        }
    }
}

impl BackendError {
    pub fn new(status: Option<u16>, payload: Value) -> Self {
        Self { status, payload }
    }
}

/// Errors from document fetch/update operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("backend request failed: {0}")]
    BackendRequestFailed(BackendError),

    /// The update was based on a version older than the stored one.
    /// The caller must refetch and re-apply its changes.
    #[error("version conflict: {0}")]
    VersionConflict(BackendError),

    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl DocumentError {
    /// Backend payload carried by this error, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            DocumentError::BackendRequestFailed(e) | DocumentError::VersionConflict(e) => {
                Some(&e.payload)
            }
            _ => None,
        }
    }
}

/// Errors from the editing session controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(
        "local draft {local_draft_id} for '{document_id}' is stale (server draft is {server_draft_id})"
    )]
    DraftStale {
        document_id: DocumentId,
        local_draft_id: u64,
        server_draft_id: u64,
    },

    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}
