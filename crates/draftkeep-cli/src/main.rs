//! draftkeep command-line entry point.
//!
//! Binary name: `dkeep`
//!
//! Parses CLI arguments, sets up tracing, wires the session services, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,draftkeep=debug",
        _ => "trace",
    };

    draftkeep_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    draftkeep_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "dkeep", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.backend.clone()).await?;

    match cli.command {
        Commands::Open { id, acknowledge } => {
            cli::session::open(&state, &id, acknowledge, cli.json).await?;
        }

        Commands::Show {
            id,
            version,
            published,
        } => {
            cli::document::show(&state, &id, version, published, cli.json).await?;
        }

        Commands::Autosave { id, changes, local } => {
            let changes = cli::parse_changes(&changes)?;
            cli::session::autosave(&state, &id, changes, local, cli.json).await?;
        }

        Commands::Save {
            id,
            message,
            changes,
        } => {
            let changes = cli::parse_changes(&changes)?;
            cli::session::save(&state, &id, &message, changes, cli.json).await?;
        }

        Commands::Discard { id } => {
            cli::session::discard(&state, &id, cli.json).await?;
        }

        Commands::Delete { id, force } => {
            cli::document::delete(&state, &id, force, cli.json).await?;
        }

        Commands::Drafts => {
            cli::drafts::list_drafts(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
