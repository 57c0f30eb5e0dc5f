//! League and group tables, and top-scorer tallies.

use crate::{types::score::Score, PlayerId, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[cfg(test)]
mod tests;

pub const POINTS_FOR_WIN: u32 = 3;
pub const POINTS_FOR_DRAW: u32 = 1;

/// A terminated match between two teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub home: TeamId,
    pub away: TeamId,
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl StandingRow {
    fn new(team_id: TeamId, team_name: &str) -> Self {
        Self {
            team_id,
            team_name: team_name.to_string(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.won += 1;
                self.points += POINTS_FOR_WIN;
            }
            Ordering::Equal => {
                self.drawn += 1;
                self.points += POINTS_FOR_DRAW;
            }
            Ordering::Less => self.lost += 1,
        }
    }
}

/// Table order: points, goal difference, goals scored (all descending), then team name.
/// The id settles teams sharing a name so the order is total.
fn table_order(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.goals_for.cmp(&a.goals_for))
        .then_with(|| a.team_name.cmp(&b.team_name))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Build a ranked table for `teams` from the given results.
///
/// Every listed team gets a row, even without a match played. Results involving a team not in
/// the list are ignored.
pub fn compute_standings(teams: &[(TeamId, String)], results: &[MatchOutcome]) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = teams
        .iter()
        .map(|(id, name)| StandingRow::new(*id, name))
        .collect();
    let index: HashMap<TeamId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.team_id, i))
        .collect();

    for result in results {
        let (Some(&h), Some(&a)) = (index.get(&result.home), index.get(&result.away)) else {
            continue;
        };
        rows[h].record(result.score.home, result.score.away);
        rows[a].record(result.score.away, result.score.home);
    }

    rows.sort_by(table_order);
    rows
}

/// One goal, as needed for the scorer tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub own_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerTally {
    pub player_id: PlayerId,
    pub player_name: String,
    pub goals: u32,
}

/// Goals per player, most first. Own goals do not count.
pub fn top_scorers(goals: &[ScorerEntry]) -> Vec<ScorerTally> {
    let mut tallies: HashMap<PlayerId, ScorerTally> = HashMap::new();
    for goal in goals.iter().filter(|g| !g.own_goal) {
        tallies
            .entry(goal.player_id)
            .or_insert_with(|| ScorerTally {
                player_id: goal.player_id,
                player_name: goal.player_name.clone(),
                goals: 0,
            })
            .goals += 1;
    }

    let mut ranked: Vec<ScorerTally> = tallies.into_values().collect();
    ranked.sort_by(|a, b| {
        b.goals
            .cmp(&a.goals)
            .then_with(|| a.player_name.cmp(&b.player_name))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    ranked
}
