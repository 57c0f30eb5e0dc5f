//! Goals and cards

use std::collections::HashMap;

use log::info;
use serde::Serialize;

use super::common::{team_label, CommandContext};
use crate::{
    cli::EventCmd,
    storage::{Card, CardColor, Goal, LeagueDatabase, NewCard, NewGoal},
    PlayerId, Result,
};

#[derive(Debug, Clone, Serialize)]
struct FixtureEvents {
    goals: Vec<Goal>,
    cards: Vec<Card>,
}

/// Record a goal; the fixture's score is recounted and cup fixtures re-run progression.
pub fn record_goal(db: &mut LeagueDatabase, goal: &NewGoal) -> Result<Goal> {
    let stored = db.record_goal(goal)?;
    info!("goal {} recorded in {}", stored.id, stored.fixture);
    Ok(stored)
}

/// Record a card; a second yellow in the same fixture comes back as a red.
pub fn record_card(db: &mut LeagueDatabase, card: &NewCard) -> Result<Card> {
    db.record_card(card)
}

/// Handle the event commands
pub fn handle_event(ctx: &mut CommandContext, cmd: EventCmd) -> Result<()> {
    match cmd {
        EventCmd::Goal {
            fixture,
            team,
            scorer,
            assist,
            minute,
            own_goal,
        } => {
            let goal = record_goal(
                &mut ctx.db,
                &NewGoal {
                    fixture,
                    team_id: team,
                    scorer_id: scorer,
                    assist_id: assist,
                    minute,
                    own_goal,
                },
            )?;
            ctx.emit(&goal, |g| format!("✓ Goal {} recorded in {}", g.id, g.fixture))
        }
        EventCmd::Card {
            fixture,
            team,
            player,
            color,
            minute,
        } => {
            let card = record_card(
                &mut ctx.db,
                &NewCard {
                    fixture,
                    team_id: team,
                    player_id: player,
                    color,
                    minute,
                },
            )?;
            ctx.emit(&card, |c| {
                if c.second_yellow {
                    format!("✓ Card {}: second yellow, sent off", c.id)
                } else {
                    format!("✓ Card {}: {}", c.id, c.color)
                }
            })
        }
        EventCmd::List { fixture } => {
            let events = FixtureEvents {
                goals: ctx.db.goals_for(fixture)?,
                cards: ctx.db.cards_for(fixture)?,
            };
            let names = ctx.team_names()?;
            let players: HashMap<PlayerId, String> = ctx
                .db
                .list_players(None)?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect();
            let player_label = |id: Option<PlayerId>| {
                id.and_then(|id| players.get(&id).cloned())
                    .unwrap_or_else(|| "unknown".to_string())
            };
            ctx.emit(&events, |ev| {
                let mut lines = Vec::new();
                for g in &ev.goals {
                    lines.push(format!(
                        "{:>4}' goal  {:<20} {}{}",
                        g.minute.map(|m| m.to_string()).unwrap_or_default(),
                        team_label(&names, Some(g.team_id)),
                        player_label(g.scorer_id),
                        if g.own_goal { " (og)" } else { "" }
                    ));
                }
                for c in &ev.cards {
                    let kind = match (c.color, c.second_yellow) {
                        (CardColor::Red, true) => "2nd yellow",
                        (CardColor::Red, false) => "red",
                        (CardColor::Yellow, _) => "yellow",
                    };
                    lines.push(format!(
                        "{:>4}' {:<10} {:<20} {}",
                        c.minute.map(|m| m.to_string()).unwrap_or_default(),
                        kind,
                        team_label(&names, Some(c.team_id)),
                        player_label(Some(c.player_id))
                    ));
                }
                lines.join("\n")
            })
        }
        EventCmd::DeleteGoal { id } => {
            ctx.db.delete_goal(id)?;
            println!("✓ Deleted goal {}", id);
            Ok(())
        }
        EventCmd::DeleteCard { id } => {
            ctx.db.delete_card(id)?;
            println!("✓ Deleted card {}", id);
            Ok(())
        }
    }
}
