//! League seasons: schedule generation, results and tables

use log::info;
use rand::{seq::SliceRandom, Rng};

use super::common::{format_score, named, render_standings, team_label, CommandContext};
use crate::{
    cli::SeasonCmd,
    storage::{LeagueDatabase, Match, Matchday},
    tournament::{
        schedule::double_round_robin,
        standings::{compute_standings, top_scorers, ScorerTally, StandingRow},
    },
    types::score::Score,
    MatchId, Result, SeasonId, TeamId,
};

/// Draw a double round robin for the season's teams and store it over any existing schedule.
///
/// With `shuffle` the teams are shuffled first, otherwise they are taken in seed order.
pub fn generate_schedule<R: Rng + ?Sized>(
    db: &mut LeagueDatabase,
    season_id: SeasonId,
    shuffle: bool,
    rng: &mut R,
) -> Result<Vec<Matchday>> {
    let mut teams: Vec<TeamId> = db.season_teams(season_id)?.iter().map(|t| t.id).collect();
    if shuffle {
        teams.shuffle(rng);
    }
    let plans = double_round_robin(&teams, rng)?;
    let matchdays = db.replace_schedule(season_id, &plans)?;
    info!(
        "season {}: {} matchdays for {} teams",
        season_id,
        matchdays.len(),
        teams.len()
    );
    Ok(matchdays)
}

pub fn record_league_result(
    db: &mut LeagueDatabase,
    match_id: MatchId,
    score: Score,
    terminated: bool,
) -> Result<Match> {
    db.set_match_result(match_id, Some(score), terminated)
}

/// The season table, from terminated matches only.
pub fn season_standings(db: &LeagueDatabase, season_id: SeasonId) -> Result<Vec<StandingRow>> {
    let teams = db.season_teams(season_id)?;
    let results = db.season_results(season_id)?;
    Ok(compute_standings(&named(&teams), &results))
}

pub fn season_top_scorers(db: &LeagueDatabase, season_id: SeasonId) -> Result<Vec<ScorerTally>> {
    Ok(top_scorers(&db.season_scorer_entries(season_id)?))
}

/// Handle the season commands
pub fn handle_season(ctx: &mut CommandContext, cmd: SeasonCmd) -> Result<()> {
    match cmd {
        SeasonCmd::Add { league, name } => {
            let season = ctx.db.create_season(league, &name)?;
            ctx.emit(&season, |s| format!("✓ Opened season {} ({})", s.name, s.id))
        }
        SeasonCmd::List { league } => {
            let seasons = ctx.db.list_seasons(league)?;
            ctx.emit(&seasons, |ss| {
                ss.iter()
                    .map(|s| format!("{:>4}  {:<16} {}", s.id, s.name, s.status))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        SeasonCmd::Finish { id } => {
            let season = ctx.db.finish_season(id)?;
            ctx.emit(&season, |s| format!("✓ Season {} is {}", s.id, s.status))
        }
        SeasonCmd::Reopen { id } => {
            let season = ctx.db.reopen_season(id)?;
            ctx.emit(&season, |s| format!("✓ Season {} is {}", s.id, s.status))
        }
        SeasonCmd::Delete { id } => {
            ctx.db.delete_season(id)?;
            println!("✓ Deleted season {}", id);
            Ok(())
        }
        SeasonCmd::Teams { season, teams } => {
            ctx.db.set_season_teams(season, &teams)?;
            println!("✓ Season {} has {} teams", season, teams.len());
            Ok(())
        }
        SeasonCmd::Schedule { season, shuffle } => {
            let matchdays =
                generate_schedule(&mut ctx.db, season, shuffle, &mut rand::thread_rng())?;
            ctx.emit(&matchdays, |mds| {
                format!("✓ Generated {} matchdays for season {}", mds.len(), season)
            })
        }
        SeasonCmd::Fixtures { season } => {
            let names = ctx.team_names()?;
            let mut fixtures = Vec::new();
            for matchday in ctx.db.matchdays(season)? {
                let matches = ctx.db.matches_for_matchday(matchday.id)?;
                fixtures.push((matchday, matches));
            }
            ctx.emit(&fixtures, |fs| {
                let mut lines = Vec::new();
                for (matchday, matches) in fs {
                    lines.push(format!("Matchday {}", matchday.number));
                    lines.extend(matches.iter().map(|m| {
                        format!(
                            "  [{}] {} {} {}{}",
                            m.id,
                            team_label(&names, Some(m.home_team_id)),
                            format_score(m.home_score, m.away_score),
                            team_label(&names, Some(m.away_team_id)),
                            if m.terminated { " FT" } else { "" }
                        )
                    }));
                }
                lines.join("\n")
            })
        }
        SeasonCmd::Result { id, score, pending } => {
            let m = record_league_result(&mut ctx.db, id, score, !pending)?;
            ctx.emit(&m, |m| {
                format!(
                    "✓ Match {}: {}",
                    m.id,
                    format_score(m.home_score, m.away_score)
                )
            })
        }
        SeasonCmd::Keeper {
            id,
            side,
            player,
            saves,
        } => {
            let m = ctx.db.set_goalkeeping(id, side, player, saves)?;
            ctx.emit(&m, |m| format!("✓ Updated goalkeeping for match {}", m.id))
        }
        SeasonCmd::Standings { season } => {
            let rows = season_standings(&ctx.db, season)?;
            ctx.emit(&rows, |rows| render_standings(rows))
        }
        SeasonCmd::Scorers { season } => {
            let tallies = season_top_scorers(&ctx.db, season)?;
            ctx.emit(&tallies, |ts| {
                ts.iter()
                    .map(|t| format!("{:>3}  {}", t.goals, t.player_name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
