//! Local draft listing.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use draftkeep_types::draft::DraftSummary;

use crate::state::AppState;

/// List drafts kept in local storage, newest first.
pub async fn list_drafts(state: &AppState, json: bool) -> Result<()> {
    let drafts = state.draft_store.list().await;

    if json {
        let result = drafts_json(
            &drafts,
            state.draft_store.is_available(),
            &state.config.backend_url,
        );
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !state.draft_store.is_available() {
        println!();
        println!(
            "  {} Local draft storage is unavailable ({}).",
            style("!").yellow().bold(),
            state.data_dir.display()
        );
        println!();
        return Ok(());
    }

    if drafts.is_empty() {
        println!();
        println!("  {} No local drafts.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    println!();
    println!(
        "  Local drafts ({} entries, backend {})",
        drafts.len(),
        style(&state.config.backend_url).dim()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Document").fg(Color::White),
        Cell::new("Draft").fg(Color::White),
        Cell::new("Changes").fg(Color::White),
        Cell::new("Saved").fg(Color::White),
    ]);

    for draft in &drafts {
        table.add_row(vec![
            Cell::new(&draft.document_id).fg(Color::Cyan),
            Cell::new(draft.draft_id),
            Cell::new(draft.change_count),
            Cell::new(draft.saved_at.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}

fn drafts_json(drafts: &[DraftSummary], available: bool, backend_url: &str) -> serde_json::Value {
    serde_json::json!({
        "available": available,
        "backend_url": backend_url,
        "drafts": drafts,
        "count": drafts.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use draftkeep_types::document::DocumentId;

    #[test]
    fn drafts_json_reports_backend_and_entries() {
        let drafts = vec![DraftSummary {
            document_id: DocumentId::new("q1").unwrap(),
            draft_id: 7,
            change_count: 2,
            saved_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }];

        let value = drafts_json(&drafts, true, "http://authoring.test");

        assert_eq!(value["backend_url"], "http://authoring.test");
        assert_eq!(value["count"], 1);
        assert_eq!(value["drafts"][0]["document_id"], "q1");
        assert_eq!(value["drafts"][0]["draft_id"], 7);
    }
}
