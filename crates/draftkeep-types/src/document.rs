use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::fmt;
use std::str::FromStr;

/// Identifier of an authored document (a question).
///
/// IDs are server-assigned strings restricted to `[A-Za-z0-9_-]` so they can
/// be embedded in URL paths and storage keys without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap a raw document ID.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.is_empty() {
            return Err("document id cannot be empty".to_string());
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(format!("invalid character '{bad}' in document id '{id}'"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl FromStr for DocumentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A single edit command.
///
/// Changes are opaque to this layer: they are produced by the editor,
/// persisted, and forwarded to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Change(pub Value);

impl From<Value> for Change {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Ordered sequence of edits made since the last commit.
pub type ChangeList = Vec<Change>;

/// Editor representation of a document, as returned by the create handler.
///
/// Carries the server's view of the user's pending draft alongside the
/// document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(alias = "question_id")]
    pub document_id: DocumentId,
    /// Monotonic per-document version, bumped on every commit.
    pub version: u64,
    /// ID of the most recent draft the server has recorded for this user.
    #[serde(default)]
    pub draft_change_list_id: Option<u64>,
    /// Changes held in the server-side draft, if any.
    #[serde(default)]
    pub draft_changes: Option<ChangeList>,
    /// Whether the server-side draft was recorded against the current version.
    #[serde(default)]
    pub is_version_of_draft_valid: Option<bool>,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default, alias = "states")]
    pub content: Value,
}

impl Document {
    /// Draft ID to compare a local draft against.
    ///
    /// The server reports no ID for users who never autosaved; that is the
    /// same state as draft ID 0.
    pub fn effective_draft_id(&self) -> u64 {
        self.draft_change_list_id.unwrap_or(0)
    }

    /// Whether the server holds draft changes for this document.
    pub fn has_server_draft(&self) -> bool {
        self.draft_changes.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// Reader representation of a document, as served to learners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedDocument {
    #[serde(alias = "question_id")]
    pub document_id: DocumentId,
    pub version: u64,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default, alias = "states")]
    pub content: Value,
}

fn default_language_code() -> String {
    "en".to_string()
}

/// Body of an optimistic-concurrency update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// Version the change list was authored against.
    pub version: u64,
    pub commit_message: String,
    pub change_list: ChangeList,
}

/// Body of a draft autosave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftAutosave {
    pub version: u64,
    pub change_list: ChangeList,
}

/// Server acknowledgement of an autosaved draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveReceipt {
    /// ID the server assigned to the draft it just recorded.
    pub draft_change_list_id: u64,
    #[serde(default)]
    pub is_version_of_draft_valid: Option<bool>,
}
