//! Common utilities and helper functions shared across commands.
//!
//! This module contains shared functionality that would otherwise be duplicated
//! across different command implementations.

use std::collections::HashMap;
use std::path::PathBuf;

use log::debug;
use serde::Serialize;

use crate::{
    config::resolve_db_path,
    storage::{KnockoutMatch, LeagueDatabase, Team},
    tournament::{progression::Bracket, standings::StandingRow, ProgressionReport},
    Result, TeamId,
};

/// Context containing common resources needed by every command
pub struct CommandContext {
    pub db: LeagueDatabase,
    pub as_json: bool,
}

impl CommandContext {
    /// Open the database at the resolved location
    pub fn open(db_path: Option<PathBuf>, as_json: bool) -> Result<Self> {
        let path = resolve_db_path(db_path);
        debug!("opening database at {}", path.display());
        let db = LeagueDatabase::new(&path)?;
        Ok(Self { db, as_json })
    }

    pub fn in_memory(as_json: bool) -> Result<Self> {
        Ok(Self {
            db: LeagueDatabase::new_in_memory()?,
            as_json,
        })
    }

    /// Print `value` as pretty JSON, or as the text `render` produces.
    pub fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        render: impl FnOnce(&T) -> String,
    ) -> Result<()> {
        if self.as_json {
            println!("{}", serde_json::to_string_pretty(value)?); // tarpaulin::skip
        } else {
            println!("{}", render(value)); // tarpaulin::skip
        }
        Ok(())
    }

    /// Names of every team, for rendering ids.
    pub fn team_names(&self) -> Result<HashMap<TeamId, String>> {
        Ok(self
            .db
            .list_teams()?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect())
    }
}

/// Id and name pairs, the shape the standings table takes.
pub fn named(teams: &[Team]) -> Vec<(TeamId, String)> {
    teams.iter().map(|t| (t.id, t.name.clone())).collect()
}

pub fn team_label(names: &HashMap<TeamId, String>, id: Option<TeamId>) -> String {
    match id {
        Some(id) => names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", id)),
        None => "?".to_string(),
    }
}

pub fn format_score(home: Option<u32>, away: Option<u32>) -> String {
    match (home, away) {
        (Some(h), Some(a)) => format!("{}-{}", h, a),
        _ => "-".to_string(),
    }
}

pub fn render_standings(rows: &[StandingRow]) -> String {
    let mut out = format!(
        "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}",
        "#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "\n{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}",
            i + 1,
            row.team_name,
            row.played,
            row.won,
            row.drawn,
            row.lost,
            row.goals_for,
            row.goals_against,
            row.goal_difference(),
            row.points
        ));
    }
    out
}

fn render_knockout_match(names: &HashMap<TeamId, String>, m: &KnockoutMatch) -> String {
    let mut line = format!(
        "  [{}] {} {} {}",
        m.id,
        team_label(names, m.home_team_id),
        format_score(m.home_score, m.away_score),
        team_label(names, m.away_team_id)
    );
    if let Some(n) = m.series_number {
        line.push_str(&format!(" (match {})", n));
    }
    if m.home_penalties.is_some() {
        line.push_str(&format!(
            " pens {}",
            format_score(m.home_penalties, m.away_penalties)
        ));
    }
    if m.home_aggregate.is_some() {
        line.push_str(&format!(
            " agg {}",
            format_score(m.home_aggregate, m.away_aggregate)
        ));
    }
    if m.is_fake {
        line.push_str(" walkover");
    } else if m.terminated {
        line.push_str(" FT");
    }
    line
}

pub fn render_bracket(names: &HashMap<TeamId, String>, bracket: &Bracket) -> String {
    let mut lines = Vec::new();
    for round in &bracket.rounds {
        lines.push(format!(
            "{} (round {}, {} per tie)",
            round.round.label, round.round.number, round.round.matches_per_tie
        ));
        lines.extend(
            round
                .matches
                .iter()
                .map(|m| render_knockout_match(names, m)),
        );
    }
    if let Some(champion) = bracket.champion() {
        lines.push(format!("Champion: {}", team_label(names, Some(champion))));
    }
    lines.join("\n")
}

pub fn render_report(names: &HashMap<TeamId, String>, report: &ProgressionReport) -> String {
    let mut lines: Vec<String> = report
        .advanced
        .iter()
        .map(|a| {
            format!(
                "✓ {} through from round {} tie {}{}",
                team_label(names, Some(a.team_id)),
                a.round,
                a.tie_index + 1,
                if a.walkover { " (walkover)" } else { "" }
            )
        })
        .collect();
    if report.undecided > 0 {
        lines.push(format!("{} tie(s) still undecided", report.undecided));
    }
    for skipped in &report.skipped {
        lines.push(format!("⚠ skipped: {}", skipped));
    }
    if let Some(champion) = report.champion {
        lines.push(format!("Champion: {}", team_label(names, Some(champion))));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::progression::Advancement;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(2), Some(1)), "2-1");
        assert_eq!(format_score(Some(2), None), "-");
        assert_eq!(format_score(None, None), "-");
    }

    #[test]
    fn test_team_label() {
        let names = HashMap::from([(TeamId::new(1), "Lens".to_string())]);
        assert_eq!(team_label(&names, Some(TeamId::new(1))), "Lens");
        assert_eq!(team_label(&names, Some(TeamId::new(7))), "#7");
        assert_eq!(team_label(&names, None), "?");
    }

    #[test]
    fn test_render_standings_rows() {
        let rows = vec![StandingRow {
            team_id: TeamId::new(1),
            team_name: "Nantes".to_string(),
            played: 2,
            won: 1,
            drawn: 1,
            lost: 0,
            goals_for: 3,
            goals_against: 1,
            points: 4,
        }];
        let text = render_standings(&rows);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().contains("Nantes"));
    }

    #[test]
    fn test_render_report() {
        let names = HashMap::from([(TeamId::new(3), "Nice".to_string())]);
        let report = ProgressionReport {
            advanced: vec![Advancement {
                round: 1,
                tie_index: 1,
                team_id: TeamId::new(3),
                walkover: true,
            }],
            undecided: 2,
            skipped: vec![],
            champion: None,
        };
        let text = render_report(&names, &report);
        assert!(text.contains("Nice through from round 1 tie 2 (walkover)"));
        assert!(text.contains("2 tie(s) still undecided"));
    }

    #[test]
    fn test_in_memory_context() {
        let ctx = CommandContext::in_memory(true).unwrap();
        assert!(ctx.as_json);
        assert!(ctx.team_names().unwrap().is_empty());
    }
}
