//! Round-robin fixture generation (circle method).
//!
//! Teams sit on a circle; position 0 stays fixed while every other slot rotates by one after
//! each round. With an odd number of teams an empty slot is added, and whoever faces it sits
//! the round out. The return leg replays the same rounds with every fixture reversed.

use crate::{
    error::{LeagueError, Result},
    TeamId,
};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[cfg(test)]
mod tests;

/// Which half of a double round robin a matchday belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    First,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    pub home: TeamId,
    pub away: TeamId,
}

/// One generated matchday: its sequence number and the fixtures played on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchdayPlan {
    pub number: u32,
    pub leg: Leg,
    pub pairings: Vec<Pairing>,
}

/// One round of the circle: slot pairs, `None` being the bye slot.
pub type CircleRound = Vec<(Option<TeamId>, Option<TeamId>)>;

/// Rotate the circle one step: the last slot moves to index 1, index 0 never moves.
fn rotate(slots: &mut Vec<Option<TeamId>>) {
    if slots.len() > 2 {
        if let Some(last) = slots.pop() {
            slots.insert(1, last);
        }
    }
}

/// Raw circle-method rounds for `teams`, padded with a bye slot when the count is odd.
///
/// Returns `N - 1` rounds for even `N` and `N` rounds for odd `N`, each with every slot
/// appearing exactly once. Works on a local copy; `teams` is never reordered.
pub fn circle_rounds(teams: &[TeamId]) -> Vec<CircleRound> {
    let mut slots: Vec<Option<TeamId>> = teams.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }

    let n = slots.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let round = (0..n / 2).map(|i| (slots[i], slots[n - 1 - i])).collect();
        rounds.push(round);
        rotate(&mut slots);
    }
    rounds
}

fn validate_teams(teams: &[TeamId]) -> Result<()> {
    if teams.len() < 2 {
        return Err(LeagueError::validation(format!(
            "a schedule needs at least 2 teams, got {}",
            teams.len()
        )));
    }

    let mut seen = HashSet::with_capacity(teams.len());
    for team in teams {
        if !seen.insert(*team) {
            return Err(LeagueError::validation(format!(
                "team {} appears more than once",
                team
            )));
        }
    }
    Ok(())
}

/// Canonical key for an unordered pair of teams.
fn pair_key(a: TeamId, b: TeamId) -> (TeamId, TeamId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// First-leg matchdays with a coin flip per fixture deciding who plays at home.
///
/// The chosen orientation is recorded in `orientation` (pair key -> home team) so the return
/// leg can mirror it.
fn first_leg<R: Rng + ?Sized>(
    rounds: &[CircleRound],
    rng: &mut R,
    orientation: &mut HashMap<(TeamId, TeamId), TeamId>,
) -> Vec<MatchdayPlan> {
    rounds
        .iter()
        .enumerate()
        .map(|(r, round)| {
            let pairings = round
                .iter()
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .map(|(a, b)| {
                    let (home, away) = if rng.gen_bool(0.5) { (a, b) } else { (b, a) };
                    orientation.insert(pair_key(a, b), home);
                    Pairing { home, away }
                })
                .collect();

            MatchdayPlan {
                number: r as u32 + 1,
                leg: Leg::First,
                pairings,
            }
        })
        .collect()
}

/// Generate a single round robin: every team meets every other team once.
pub fn single_round_robin<R: Rng + ?Sized>(
    teams: &[TeamId],
    rng: &mut R,
) -> Result<Vec<MatchdayPlan>> {
    validate_teams(teams)?;

    let rounds = circle_rounds(teams);
    let mut orientation = HashMap::new();
    Ok(first_leg(&rounds, rng, &mut orientation))
}

/// Generate a double round robin ("aller-retour") for `teams`.
///
/// Matchdays `1..=R` form the first leg and `R+1..=2R` the return leg, where `R` is the
/// number of circle rounds. Shuffle `teams` beforehand for a random draw.
pub fn double_round_robin<R: Rng + ?Sized>(
    teams: &[TeamId],
    rng: &mut R,
) -> Result<Vec<MatchdayPlan>> {
    validate_teams(teams)?;

    let rounds = circle_rounds(teams);
    let mut orientation = HashMap::new();
    let mut matchdays = first_leg(&rounds, rng, &mut orientation);

    // Same rotation from the original order, orientation inverted.
    let offset = rounds.len() as u32;
    for (r, round) in circle_rounds(teams).iter().enumerate() {
        let pairings = round
            .iter()
            .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
            .map(|(a, b)| {
                let first_home = orientation.get(&pair_key(a, b)).copied().unwrap_or(a);
                let (home, away) = if first_home == a { (b, a) } else { (a, b) };
                Pairing { home, away }
            })
            .collect();

        matchdays.push(MatchdayPlan {
            number: offset + r as u32 + 1,
            leg: Leg::Return,
            pairings,
        });
    }

    debug!(
        "generated {} matchdays for {} teams",
        matchdays.len(),
        teams.len()
    );
    Ok(matchdays)
}
