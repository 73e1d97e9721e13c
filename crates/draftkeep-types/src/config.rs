//! Client configuration types for draftkeep.
//!
//! `ClientConfig` represents `config.toml` in the data directory and controls
//! which backend the session talks to and where drafts are kept.

use serde::{Deserialize, Serialize};

/// Top-level client configuration.
///
/// Loaded from `~/.draftkeep/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the authoring backend (no trailing slash needed).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bearer token sent with every request, if set.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// CSRF token sent as `X-CSRF-Token` on mutating requests, if set.
    #[serde(default)]
    pub csrf_token: Option<String>,

    /// SQLite file (relative to the data directory) holding local drafts.
    #[serde(default = "default_draft_database")]
    pub draft_database: String,
}

fn default_backend_url() -> String {
    "http://localhost:8181".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "draftkeep/0.1".to_string()
}

fn default_draft_database() -> String {
    "drafts.db".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            auth_token: None,
            csrf_token: None,
            draft_database: default_draft_database(),
        }
    }
}
