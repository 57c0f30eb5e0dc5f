//! Leagues, teams, players and transfers

use chrono::NaiveDate;
use log::info;

use super::common::{team_label, CommandContext};
use crate::{
    cli::{LeagueCmd, PlayerCmd, TeamCmd, TransferCmd},
    storage::{LeagueDatabase, Transfer},
    PlayerId, Result, TeamId, TransferId,
};

/// Record a transfer; `from` defaults to the player's current team.
pub fn record_transfer(
    db: &mut LeagueDatabase,
    player_id: PlayerId,
    from: Option<TeamId>,
    to: TeamId,
    date: NaiveDate,
) -> Result<Transfer> {
    let transfer = db.record_transfer(player_id, from, to, date)?;
    info!(
        "transfer {}: player {} to team {} on {}",
        transfer.id, player_id, to, date
    );
    Ok(transfer)
}

pub fn update_transfer(
    db: &mut LeagueDatabase,
    id: TransferId,
    from: Option<TeamId>,
    to: TeamId,
    date: NaiveDate,
) -> Result<Transfer> {
    db.update_transfer(id, from, to, date)
}

pub fn delete_transfer(db: &mut LeagueDatabase, id: TransferId) -> Result<()> {
    db.delete_transfer(id)
}

/// Handle the league commands
pub fn handle_league(ctx: &mut CommandContext, cmd: LeagueCmd) -> Result<()> {
    match cmd {
        LeagueCmd::Add { name } => {
            let league = ctx.db.create_league(&name)?;
            ctx.emit(&league, |l| format!("✓ Created league {} ({})", l.name, l.id))
        }
        LeagueCmd::List => {
            let leagues = ctx.db.list_leagues()?;
            ctx.emit(&leagues, |ls| {
                ls.iter()
                    .map(|l| format!("{:>4}  {}", l.id, l.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        LeagueCmd::Delete { id } => {
            ctx.db.delete_league(id)?;
            println!("✓ Deleted league {}", id);
            Ok(())
        }
    }
}

/// Handle the team commands
pub fn handle_team(ctx: &mut CommandContext, cmd: TeamCmd) -> Result<()> {
    match cmd {
        TeamCmd::Add { name } => {
            let team = ctx.db.create_team(&name)?;
            ctx.emit(&team, |t| format!("✓ Created team {} ({})", t.name, t.id))
        }
        TeamCmd::List => {
            let teams = ctx.db.list_teams()?;
            let names = ctx.team_names()?;
            ctx.emit(&teams, |ts| {
                ts.iter()
                    .map(|t| match t.rival_id {
                        Some(_) => format!(
                            "{:>4}  {} (rival: {})",
                            t.id,
                            t.name,
                            team_label(&names, t.rival_id)
                        ),
                        None => format!("{:>4}  {}", t.id, t.name),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        TeamCmd::Rename { id, name } => {
            let team = ctx.db.rename_team(id, &name)?;
            ctx.emit(&team, |t| format!("✓ Team {} is now {}", t.id, t.name))
        }
        TeamCmd::Delete { id } => {
            ctx.db.delete_team(id)?;
            println!("✓ Deleted team {}", id);
            Ok(())
        }
        TeamCmd::Rival { team, rival } => {
            ctx.db.set_rival(team, rival)?;
            println!("✓ Teams {} and {} are now rivals", team, rival);
            Ok(())
        }
        TeamCmd::ClearRival { team } => {
            ctx.db.clear_rival(team)?;
            println!("✓ Team {} has no rival", team);
            Ok(())
        }
    }
}

/// Handle the player commands
pub fn handle_player(ctx: &mut CommandContext, cmd: PlayerCmd) -> Result<()> {
    match cmd {
        PlayerCmd::Add {
            name,
            position,
            team,
        } => {
            let player = ctx.db.create_player(&name, position.as_deref(), team)?;
            ctx.emit(&player, |p| format!("✓ Created player {} ({})", p.name, p.id))
        }
        PlayerCmd::List { team } => {
            let players = ctx.db.list_players(team)?;
            let names = ctx.team_names()?;
            ctx.emit(&players, |ps| {
                ps.iter()
                    .map(|p| {
                        format!(
                            "{:>4}  {:<24} {:<4} {}",
                            p.id,
                            p.name,
                            p.position.as_deref().unwrap_or("-"),
                            p.current_team_id
                                .map(|t| team_label(&names, Some(t)))
                                .unwrap_or_else(|| "free agent".to_string())
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        PlayerCmd::Update { id, name, position } => {
            let player = ctx.db.update_player(id, &name, position.as_deref())?;
            ctx.emit(&player, |p| format!("✓ Updated player {} ({})", p.name, p.id))
        }
        PlayerCmd::Delete { id } => {
            ctx.db.delete_player(id)?;
            println!("✓ Deleted player {}", id);
            Ok(())
        }
    }
}

/// Handle the transfer commands
pub fn handle_transfer(ctx: &mut CommandContext, cmd: TransferCmd) -> Result<()> {
    match cmd {
        TransferCmd::Add {
            player,
            to,
            from,
            date,
        } => {
            let transfer = record_transfer(&mut ctx.db, player, from, to, date)?;
            ctx.emit(&transfer, |t| format!("✓ Recorded transfer {}", t.id))
        }
        TransferCmd::List { player } => {
            let transfers = ctx.db.list_transfers(player)?;
            let names = ctx.team_names()?;
            ctx.emit(&transfers, |ts| {
                ts.iter()
                    .map(|t| {
                        format!(
                            "{:>4}  {}  {} → {}",
                            t.id,
                            t.date,
                            team_label(&names, t.from_team_id),
                            team_label(&names, Some(t.to_team_id))
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        TransferCmd::Update { id, to, from, date } => {
            let transfer = update_transfer(&mut ctx.db, id, from, to, date)?;
            ctx.emit(&transfer, |t| format!("✓ Updated transfer {}", t.id))
        }
        TransferCmd::Delete { id } => {
            delete_transfer(&mut ctx.db, id)?;
            println!("✓ Deleted transfer {}", id);
            Ok(())
        }
    }
}
