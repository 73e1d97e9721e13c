//! Session commands: open, autosave, save, discard.
//!
//! Each command loads a session first so the local draft is reconciled
//! before anything else touches the document.

use anyhow::{Result, bail};
use console::style;

use draftkeep_core::session::controller::SessionLoad;
use draftkeep_types::document::{ChangeList, Document, DocumentId};
use draftkeep_types::error::{DocumentError, SessionError};
use draftkeep_types::session::DraftConflict;

use crate::state::{AppState, ConcreteSession};

/// Load a session, optionally dropping a stale local draft.
pub async fn open(state: &AppState, id: &DocumentId, acknowledge: bool, json: bool) -> Result<()> {
    let mut session = state.session();
    let outcome = session.load(id).await?;

    let outcome = match outcome {
        SessionLoad::Conflict(conflict) if acknowledge => {
            let document = session.acknowledge_conflict().await?;
            if !json {
                println!();
                println!(
                    "  {} Dropped {} stale local change(s)",
                    style("!").yellow().bold(),
                    conflict.discarded_changes.len()
                );
            }
            SessionLoad::Ready(document)
        }
        other => other,
    };

    if json {
        let result = match &outcome {
            SessionLoad::Ready(document) => serde_json::json!({
                "state": session.state(),
                "restored_draft": false,
                "document": document,
            }),
            SessionLoad::Reloaded(document) => serde_json::json!({
                "state": session.state(),
                "restored_draft": true,
                "document": document,
            }),
            SessionLoad::Conflict(conflict) => serde_json::json!({
                "state": session.state(),
                "conflict": conflict,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match outcome {
        SessionLoad::Ready(document) => print_ready(&document, false),
        SessionLoad::Reloaded(document) => print_ready(&document, true),
        SessionLoad::Conflict(conflict) => print_conflict(&conflict),
    }
    Ok(())
}

/// Autosave `changes` as the draft, or keep them locally only.
pub async fn autosave(
    state: &AppState,
    id: &DocumentId,
    changes: ChangeList,
    local: bool,
    json: bool,
) -> Result<()> {
    if local {
        let document = state.gateway.fetch_with_draft_applied(id).await?;
        if !state.draft_store.is_available() {
            bail!("Local draft storage is unavailable");
        }
        let draft_id = document.effective_draft_id();
        state.draft_store.save(id, &changes, draft_id).await;

        if json {
            let result = serde_json::json!({
                "document_id": id,
                "draft_id": draft_id,
                "change_count": changes.len(),
                "local": true,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!();
            println!(
                "  {} Kept {} change(s) locally for '{}' (draft {})",
                style("ok").green(),
                changes.len(),
                style(id).cyan(),
                draft_id
            );
            println!();
        }
        return Ok(());
    }

    let mut session = ready_session(state, id).await?;
    let receipt = session.autosave_change_list(changes).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        println!();
        println!(
            "  {} Autosaved draft {} for '{}'",
            style("ok").green(),
            receipt.draft_change_list_id,
            style(id).cyan()
        );
        if receipt.is_version_of_draft_valid == Some(false) {
            println!(
                "  {} The draft was recorded against an older version",
                style("!").yellow().bold()
            );
        }
        println!();
    }
    Ok(())
}

/// Commit `changes` against the current version.
pub async fn save(
    state: &AppState,
    id: &DocumentId,
    message: &str,
    changes: ChangeList,
    json: bool,
) -> Result<()> {
    let mut session = ready_session(state, id).await?;
    let base_version = session.document().map(|d| d.version).unwrap_or_default();

    let document = match session.save(message, changes).await {
        Ok(document) => document,
        Err(SessionError::Document(DocumentError::VersionConflict(e))) => {
            bail!(
                "Version {base_version} of '{id}' is out of date ({e}); run `dkeep open {id}` and retry"
            );
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!();
        println!(
            "  {} Saved '{}' as version {}",
            style("ok").green(),
            style(id).cyan(),
            style(document.version).bold()
        );
        println!();
    }
    Ok(())
}

/// Discard the server and local drafts, even when they conflict.
pub async fn discard(state: &AppState, id: &DocumentId, json: bool) -> Result<()> {
    let mut session = state.session();
    if let Err(e) = session.load(id).await {
        tracing::warn!(document_id = %id, error = %e, "Load failed, discarding anyway");
    }
    let document = session.discard_draft().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!();
        println!(
            "  {} Discarded draft for '{}' (version {})",
            style("ok").green(),
            style(id).cyan(),
            document.version
        );
        println!();
    }
    Ok(())
}

/// Load a session and require it to reach `Ready`.
async fn ready_session(state: &AppState, id: &DocumentId) -> Result<ConcreteSession> {
    let mut session = state.session();
    if let SessionLoad::Conflict(conflict) = session.load(id).await? {
        print_conflict(&conflict);
        bail!("Resolve the draft conflict for '{id}' first");
    }
    Ok(session)
}

fn print_ready(document: &Document, restored: bool) {
    println!();
    if restored {
        println!(
            "  {} Restored local draft for '{}' and reloaded",
            style("ok").green(),
            style(&document.document_id).cyan()
        );
    } else {
        println!(
            "  {} Opened '{}'",
            style("ok").green(),
            style(&document.document_id).cyan()
        );
    }
    println!("  Version:      {}", document.version);
    match document.draft_change_list_id {
        Some(draft_id) => println!(
            "  Server draft: {} ({} change(s))",
            draft_id,
            document.draft_changes.as_ref().map_or(0, Vec::len)
        ),
        None => println!("  Server draft: {}", style("none").dim()),
    }
    println!();
}

fn print_conflict(conflict: &DraftConflict) {
    eprintln!();
    eprintln!(
        "  {} Local draft for '{}' is out of date (local draft {}, server draft {})",
        style("!").yellow().bold(),
        style(&conflict.document_id).cyan(),
        conflict.local_draft_id,
        conflict.server_draft_id
    );
    eprintln!(
        "     {} unsaved change(s) cannot be applied and will be lost.",
        conflict.discarded_changes.len()
    );
    eprintln!(
        "     Drop them with: dkeep open {} --acknowledge",
        conflict.document_id
    );
    eprintln!();
}
