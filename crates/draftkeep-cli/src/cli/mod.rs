//! CLI command definitions for the `dkeep` binary.
//!
//! Uses clap derive macros for argument parsing. Each command runs one step
//! of an editing session against the configured backend; local drafts live
//! in the SQLite draft database between invocations.

pub mod document;
pub mod drafts;
pub mod session;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use draftkeep_types::document::{Change, ChangeList, DocumentId};

/// Edit questions with local drafts and server autosave.
#[derive(Parser)]
#[command(name = "dkeep", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend base URL (overrides config.toml and DRAFTKEEP_BACKEND_URL).
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an editing session and reconcile the local draft.
    Open {
        /// Document ID.
        id: DocumentId,

        /// Drop a stale local draft instead of stopping at the conflict.
        #[arg(long)]
        acknowledge: bool,
    },

    /// Show a document.
    Show {
        /// Document ID.
        id: DocumentId,

        /// Fetch a historical version.
        #[arg(id = "at_version", long = "at-version", value_name = "VERSION")]
        version: Option<u64>,

        /// Show the published (reader) representation.
        #[arg(long)]
        published: bool,
    },

    /// Autosave a change list as the document's draft.
    Autosave {
        /// Document ID.
        id: DocumentId,

        /// Changes as JSON: one change object or an array of them.
        changes: String,

        /// Keep the draft locally only, without contacting the backend.
        #[arg(long)]
        local: bool,
    },

    /// Commit a change list as a new version.
    Save {
        /// Document ID.
        id: DocumentId,

        /// Commit message.
        #[arg(short, long)]
        message: String,

        /// Changes as JSON: one change object or an array of them.
        changes: String,
    },

    /// Discard the server and local drafts for a document.
    Discard {
        /// Document ID.
        id: DocumentId,
    },

    /// Delete a document on the backend.
    #[command(alias = "rm")]
    Delete {
        /// Document ID.
        id: DocumentId,

        /// Confirm the deletion.
        #[arg(long)]
        force: bool,
    },

    /// List local drafts.
    #[command(alias = "ls")]
    Drafts,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Parse a change list argument.
///
/// Accepts a JSON array of changes or a single change object.
pub fn parse_changes(raw: &str) -> Result<ChangeList> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("Changes must be valid JSON")?;

    let changes: ChangeList = match value {
        serde_json::Value::Array(items) => items.into_iter().map(Change::from).collect(),
        serde_json::Value::Object(_) => vec![Change::from(value)],
        other => bail!("Changes must be a JSON object or array, got {other}"),
    };

    if changes.is_empty() {
        bail!("Change list is empty");
    }
    Ok(changes)
}
