//! Knockout cups: bracket draw, results and progression

use log::info;
use rand::{seq::SliceRandom, Rng};

use super::common::{format_score, render_bracket, render_report, CommandContext};
use crate::{
    cli::CupCmd,
    storage::{KnockoutMatch, LeagueDatabase, NewCup},
    tournament::{
        bracket::plan_bracket,
        progression::Bracket,
        standings::{top_scorers, ScorerTally},
        ProgressionReport,
    },
    types::score::Score,
    CupId, KnockoutMatchId, Result, TeamId,
};

/// Draw the cup's bracket from its entrants and store it over any existing one.
///
/// Randomized cups shuffle the entrants; others keep seed order. Round-1 byes are resolved
/// before returning.
pub fn generate_bracket<R: Rng + ?Sized>(
    db: &mut LeagueDatabase,
    cup_id: CupId,
    rng: &mut R,
) -> Result<(Bracket, ProgressionReport)> {
    let cup = db.get_cup(cup_id)?;
    let format = cup.format()?;
    let mut seeds: Vec<TeamId> = db.cup_teams(cup_id)?.iter().map(|t| t.id).collect();
    if cup.randomized {
        seeds.shuffle(rng);
    }

    let plan = plan_bracket(&seeds, format, None)?;
    info!(
        "cup {}: drawing {} teams into {} rounds ({} byes)",
        cup_id,
        seeds.len(),
        plan.rounds.len(),
        plan.byes
    );
    db.replace_bracket(cup_id, &plan)
}

/// Record a result and push winners through the bracket.
pub fn record_cup_result(
    db: &mut LeagueDatabase,
    match_id: KnockoutMatchId,
    score: Score,
    shootout: Option<Score>,
    terminated: bool,
) -> Result<(KnockoutMatch, ProgressionReport)> {
    db.record_knockout_result(match_id, Some(score), shootout, terminated)
}

/// Re-derive every tie of the cup. Safe to run any number of times.
pub fn recalculate_winners(db: &mut LeagueDatabase, cup_id: CupId) -> Result<ProgressionReport> {
    db.recalculate_cup(cup_id)
}

pub fn cup_top_scorers(db: &LeagueDatabase, cup_id: CupId) -> Result<Vec<ScorerTally>> {
    Ok(top_scorers(&db.cup_scorer_entries(cup_id)?))
}

/// Handle the cup commands
pub fn handle_cup(ctx: &mut CommandContext, cmd: CupCmd) -> Result<()> {
    match cmd {
        CupCmd::AddModel { name, logo } => {
            let model = ctx.db.create_cup_model(&name, logo.as_deref())?;
            ctx.emit(&model, |m| format!("✓ Created cup model {} ({})", m.name, m.id))
        }
        CupCmd::Models => {
            let models = ctx.db.list_cup_models()?;
            ctx.emit(&models, |ms| {
                ms.iter()
                    .map(|m| format!("{:>4}  {}", m.id, m.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        CupCmd::Add {
            name,
            model,
            matches_per_tie,
            victory_only,
            random,
        } => {
            let cup = ctx.db.create_cup(&NewCup {
                name,
                model_id: model,
                matches_per_tie,
                victory_only,
                randomized: random,
            })?;
            ctx.emit(&cup, |c| format!("✓ Created cup {} ({})", c.name, c.id))
        }
        CupCmd::List => {
            let cups = ctx.db.list_cups()?;
            ctx.emit(&cups, |cs| {
                cs.iter()
                    .map(|c| {
                        format!(
                            "{:>4}  {:<32} {} per tie{}",
                            c.id,
                            c.name,
                            c.matches_per_tie,
                            if c.victory_only { ", victories only" } else { "" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        CupCmd::Delete { id } => {
            ctx.db.delete_cup(id)?;
            println!("✓ Deleted cup {}", id);
            Ok(())
        }
        CupCmd::Teams { cup, teams } => {
            ctx.db.set_cup_teams(cup, &teams)?;
            println!("✓ Cup {} has {} entrants", cup, teams.len());
            Ok(())
        }
        CupCmd::Draw { cup } => {
            let (bracket, _) = generate_bracket(&mut ctx.db, cup, &mut rand::thread_rng())?;
            let names = ctx.team_names()?;
            ctx.emit(&bracket, |b| render_bracket(&names, b))
        }
        CupCmd::Show { cup } => {
            let bracket = ctx.db.load_bracket(cup)?;
            let names = ctx.team_names()?;
            ctx.emit(&bracket, |b| render_bracket(&names, b))
        }
        CupCmd::Result {
            id,
            score,
            pens,
            pending,
        } => {
            let (m, report) = record_cup_result(&mut ctx.db, id, score, pens, !pending)?;
            let names = ctx.team_names()?;
            ctx.emit(&(m, report), |(m, report)| {
                let mut text = format!(
                    "✓ Cup match {}: {}",
                    m.id,
                    format_score(m.home_score, m.away_score)
                );
                let progress = render_report(&names, report);
                if !progress.is_empty() {
                    text.push('\n');
                    text.push_str(&progress);
                }
                text
            })
        }
        CupCmd::Recalculate { cup } => {
            let report = recalculate_winners(&mut ctx.db, cup)?;
            let names = ctx.team_names()?;
            ctx.emit(&report, |r| render_report(&names, r))
        }
        CupCmd::Scorers { cup } => {
            let tallies = cup_top_scorers(&ctx.db, cup)?;
            ctx.emit(&tallies, |ts| {
                ts.iter()
                    .map(|t| format!("{:>3}  {}", t.goals, t.player_name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
