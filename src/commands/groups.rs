//! Group stages and their transition into a knockout cup

use std::collections::HashMap;

use log::info;
use rand::Rng;
use serde::Serialize;

use super::common::{
    format_score, named, render_bracket, render_standings, team_label, CommandContext,
};
use crate::{
    cli::GroupCupCmd,
    error::LeagueError,
    storage::{Cup, Group, GroupMatch, LeagueDatabase, NewGroupCup},
    tournament::{
        groups::{plan_group_stage, plan_knockout, validate_qualification},
        progression::Bracket,
        standings::{compute_standings, StandingRow},
        ProgressionReport,
    },
    types::score::Score,
    GroupCupId, GroupId, GroupMatchId, Result, TeamId,
};

/// A group with its table and fixtures, as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub group: Group,
    pub standings: Vec<StandingRow>,
    pub matches: Vec<GroupMatch>,
}

/// Split the entrants into groups, schedule each group and store the result over any
/// existing groups.
pub fn generate_groups<R: Rng + ?Sized>(
    db: &mut LeagueDatabase,
    id: GroupCupId,
    rng: &mut R,
) -> Result<Vec<Group>> {
    let group_cup = db.get_group_cup(id)?;
    let teams: Vec<TeamId> = db.group_cup_teams(id)?.iter().map(|t| t.id).collect();
    if teams.len() != group_cup.team_count as usize {
        return Err(LeagueError::validation(format!(
            "group cup {} needs {} entrants, has {}",
            id,
            group_cup.team_count,
            teams.len()
        )));
    }

    let scheduled = plan_group_stage(
        &teams,
        group_cup.group_count as usize,
        group_cup.legs,
        group_cup.randomized,
        rng,
    )?;
    db.replace_groups(id, &scheduled)
}

pub fn record_group_result(
    db: &mut LeagueDatabase,
    match_id: GroupMatchId,
    score: Score,
    terminated: bool,
) -> Result<GroupMatch> {
    db.set_group_match_result(match_id, Some(score), terminated)
}

/// A group's table, from its terminated matches only.
pub fn group_standings(db: &LeagueDatabase, group_id: GroupId) -> Result<Vec<StandingRow>> {
    let teams = db.group_teams(group_id)?;
    let results = db.group_results(group_id)?;
    Ok(compute_standings(&named(&teams), &results))
}

/// Rank every group, draw the cross-group knockout ties and create the knockout cup.
///
/// Round 1 is played over two legs; later rounds use the group cup's knockout format.
/// Fails with a conflict if the group stage was finalized before.
pub fn finalize_group_stage<R: Rng + ?Sized>(
    db: &mut LeagueDatabase,
    id: GroupCupId,
    rng: &mut R,
) -> Result<(Cup, Bracket, ProgressionReport)> {
    let group_cup = db.get_group_cup(id)?;
    if group_cup.finalized {
        return Err(LeagueError::conflict(format!(
            "group cup {} is already finalized",
            id
        )));
    }

    let groups = db.groups(id)?;
    if groups.is_empty() {
        return Err(LeagueError::validation(format!(
            "group cup {} has no groups drawn yet",
            id
        )));
    }
    let q = group_cup.qualifiers_per_group as usize;
    let teams_per_group = group_cup.team_count as usize / groups.len();
    validate_qualification(teams_per_group, groups.len(), q)?;

    let mut rankings = Vec::with_capacity(groups.len());
    for group in &groups {
        let table = group_standings(db, group.id)?;
        rankings.push(table.iter().map(|row| row.team_id).collect::<Vec<_>>());
    }

    let draw = plan_knockout(&rankings, q, group_cup.knockout_format()?, rng)?;
    info!(
        "group cup {}: {} qualifiers drawn into {} ties",
        id,
        q * groups.len(),
        draw.pairs.len()
    );
    db.finalize_group_cup(id, &draw)
}

fn group_views(db: &LeagueDatabase, id: GroupCupId) -> Result<Vec<GroupView>> {
    db.groups(id)?
        .into_iter()
        .map(|group| {
            Ok(GroupView {
                standings: group_standings(db, group.id)?,
                matches: db.group_matches(group.id)?,
                group,
            })
        })
        .collect()
}

/// Handle the group cup commands
pub fn handle_group_cup(ctx: &mut CommandContext, cmd: GroupCupCmd) -> Result<()> {
    match cmd {
        GroupCupCmd::Add {
            name,
            teams,
            groups,
            qualifiers,
            random,
            legs,
            matches_per_tie,
            victory_only,
        } => {
            let group_cup = ctx.db.create_group_cup(&NewGroupCup {
                name,
                team_count: teams,
                group_count: groups,
                qualifiers_per_group: qualifiers,
                randomized: random,
                legs,
                matches_per_tie,
                victory_only,
            })?;
            ctx.emit(&group_cup, |g| {
                format!("✓ Created group cup {} ({})", g.name, g.id)
            })
        }
        GroupCupCmd::List => {
            let group_cups = ctx.db.list_group_cups()?;
            ctx.emit(&group_cups, |gs| {
                gs.iter()
                    .map(|g| {
                        format!(
                            "{:>4}  {:<32} {} teams, {} groups, {} qualify{}",
                            g.id,
                            g.name,
                            g.team_count,
                            g.group_count,
                            g.qualifiers_per_group,
                            if g.finalized { ", finalized" } else { "" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        GroupCupCmd::Delete { id } => {
            ctx.db.delete_group_cup(id)?;
            println!("✓ Deleted group cup {}", id);
            Ok(())
        }
        GroupCupCmd::Teams { id, teams } => {
            ctx.db.set_group_cup_teams(id, &teams)?;
            println!("✓ Group cup {} has {} entrants", id, teams.len());
            Ok(())
        }
        GroupCupCmd::Draw { id } => {
            generate_groups(&mut ctx.db, id, &mut rand::thread_rng())?;
            let views = group_views(&ctx.db, id)?;
            let names = ctx.team_names()?;
            ctx.emit(&views, |vs| render_groups(&names, vs))
        }
        GroupCupCmd::Show { id } => {
            let views = group_views(&ctx.db, id)?;
            let names = ctx.team_names()?;
            ctx.emit(&views, |vs| render_groups(&names, vs))
        }
        GroupCupCmd::Result { id, score, pending } => {
            let m = record_group_result(&mut ctx.db, id, score, !pending)?;
            ctx.emit(&m, |m| {
                format!(
                    "✓ Group match {}: {}",
                    m.id,
                    format_score(m.home_score, m.away_score)
                )
            })
        }
        GroupCupCmd::Finalize { id } => {
            let (cup, bracket, _) = finalize_group_stage(&mut ctx.db, id, &mut rand::thread_rng())?;
            let names = ctx.team_names()?;
            ctx.emit(&(cup, bracket), |(cup, bracket)| {
                format!(
                    "✓ Created knockout cup {} ({})\n{}",
                    cup.name,
                    cup.id,
                    render_bracket(&names, bracket)
                )
            })
        }
    }
}

fn render_groups(names: &HashMap<TeamId, String>, views: &[GroupView]) -> String {
    let mut blocks = Vec::with_capacity(views.len());
    for view in views {
        let mut block = format!("Group {}\n{}", view.group.name, render_standings(&view.standings));
        for m in &view.matches {
            block.push_str(&format!(
                "\n  [{}] day {}: {} {} {}{}",
                m.id,
                m.matchday,
                team_label(names, Some(m.home_team_id)),
                format_score(m.home_score, m.away_score),
                team_label(names, Some(m.away_team_id)),
                if m.terminated { " FT" } else { "" }
            ));
        }
        blocks.push(block);
    }
    blocks.join("\n\n")
}
