//! Document commands: show, delete.

use anyhow::{Result, bail};
use console::style;

use draftkeep_types::document::DocumentId;

use crate::state::AppState;

/// Show a document in its editor or published representation.
pub async fn show(
    state: &AppState,
    id: &DocumentId,
    version: Option<u64>,
    published: bool,
    json: bool,
) -> Result<()> {
    let (value, version, draft) = if published {
        let document = match version {
            Some(_) => state.cache().fetch(id, version).await?,
            None => state.cache().load_latest(id).await?,
        };
        (serde_json::to_value(&document)?, document.version, None)
    } else {
        let document = match version {
            Some(v) => state.gateway.fetch_version(id, v).await?,
            None => state.gateway.fetch(id).await?,
        };
        let draft = document.draft_change_list_id;
        (serde_json::to_value(&document)?, document.version, draft)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style(id).cyan().bold(),
        style(if published { "(published)" } else { "(editor)" }).dim()
    );
    println!("  Version: {version}");
    if let Some(draft_id) = draft {
        println!("  Draft:   {draft_id}");
    }
    if let Some(local) = state.draft_store.load(id).await {
        println!(
            "  Local:   {} change(s), draft {}, saved {}",
            local.change_list.len(),
            local.draft_id,
            local.saved_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(value.get("content").unwrap_or(&serde_json::Value::Null))?
    );
    println!();
    Ok(())
}

/// Delete a document on the backend and drop its local draft.
pub async fn delete(state: &AppState, id: &DocumentId, force: bool, json: bool) -> Result<()> {
    if !force {
        bail!("Deleting '{id}' cannot be undone; pass --force to confirm");
    }

    state.gateway.delete(id).await?;
    state.draft_store.remove(id).await;

    if json {
        let result = serde_json::json!({ "deleted": id });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!();
        println!("  {} Deleted '{}'", style("ok").green(), style(id).cyan());
        println!();
    }
    Ok(())
}
