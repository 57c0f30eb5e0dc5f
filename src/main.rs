//! Entry point: parse CLI and dispatch to command handlers.

use anyhow::Context;
use clap::Parser;
use league_manager::{
    cli::{Commands, LeagueManager},
    commands::{
        cups::handle_cup,
        events::handle_event,
        groups::handle_group_cup,
        seasons::handle_season,
        teams::{handle_league, handle_player, handle_team, handle_transfer},
        CommandContext,
    },
};

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Run the CLI.
fn main() -> anyhow::Result<()> {
    let app = LeagueManager::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(app.verbose)))
        .init();

    let mut ctx =
        CommandContext::open(app.db, app.json).context("failed to open the league database")?;

    match app.command {
        Commands::League { cmd } => handle_league(&mut ctx, cmd)?,
        Commands::Team { cmd } => handle_team(&mut ctx, cmd)?,
        Commands::Player { cmd } => handle_player(&mut ctx, cmd)?,
        Commands::Transfer { cmd } => handle_transfer(&mut ctx, cmd)?,
        Commands::Season { cmd } => handle_season(&mut ctx, cmd)?,
        Commands::Cup { cmd } => handle_cup(&mut ctx, cmd)?,
        Commands::Groups { cmd } => handle_group_cup(&mut ctx, cmd)?,
        Commands::Event { cmd } => handle_event(&mut ctx, cmd)?,
    }

    Ok(())
}
