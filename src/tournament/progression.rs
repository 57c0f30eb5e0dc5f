//! Knockout progression: decide ties and move winners into the next round.
//!
//! Works on an in-memory snapshot of a cup (its rounds and their matches in creation order)
//! and rewrites every derived field from scratch, so running it twice on the same results
//! changes nothing. The caller persists the snapshot afterwards.
//!
//! Tie `t` of a round feeds tie `t / 2` of the next round, into side A when `t` is even and
//! side B when it is odd. A slot that can never be filled (a bye in round 1, or a slot fed by
//! a tie with no entrants at all) turns the tie into a walkover for the team that is present.

use super::tie::{self, Side, TieFormat, TieOutcome};
use crate::{
    storage::models::{KnockoutMatch, Round},
    CupId, KnockoutMatchId, TeamId,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRound {
    pub round: Round,
    /// Ordered by creation.
    pub matches: Vec<KnockoutMatch>,
}

/// A cup's knockout rounds, ordered by round number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub cup_id: CupId,
    pub victory_only: bool,
    pub rounds: Vec<BracketRound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advancement {
    pub round: u32,
    pub tie_index: usize,
    pub team_id: TeamId,
    pub walkover: bool,
}

/// What a recalculation pass found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionReport {
    pub advanced: Vec<Advancement>,
    /// Ties with both entrants known but no winner yet.
    pub undecided: usize,
    /// Steps skipped because the bracket structure was inconsistent.
    pub skipped: Vec<String>,
    pub champion: Option<TeamId>,
}

impl Bracket {
    pub fn find_match(&self, id: KnockoutMatchId) -> Option<&KnockoutMatch> {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .find(|m| m.id == id)
    }

    pub fn find_match_mut(&mut self, id: KnockoutMatchId) -> Option<&mut KnockoutMatch> {
        self.rounds
            .iter_mut()
            .flat_map(|r| r.matches.iter_mut())
            .find(|m| m.id == id)
    }

    /// All matches of every round, in round then creation order.
    pub fn matches(&self) -> impl Iterator<Item = &KnockoutMatch> {
        self.rounds.iter().flat_map(|r| r.matches.iter())
    }

    /// Winner of the final, if it has been decided.
    pub fn champion(&self) -> Option<TeamId> {
        let last = self.rounds.last()?;
        let format = last.round.format().ok()?;
        let ties = tie_indices(last, format).ok()?;
        let final_tie = ties.first()?;
        match decide(last, format, final_tie, self.victory_only) {
            TieOutcome::Decided(side) => {
                let first = &last.matches[final_tie[0]];
                side.of(first.home_team_id, first.away_team_id)
            }
            TieOutcome::Undecided => None,
        }
    }
}

/// Group a round's matches into ties (indices into `round.matches`).
///
/// Single matches are ties on their own; a two-leg tie is a first leg plus its linked return
/// match; a series is a run of matches numbered 1..=n.
pub fn tie_indices(round: &BracketRound, format: TieFormat) -> Result<Vec<Vec<usize>>, String> {
    let matches = &round.matches;
    match format {
        TieFormat::Single => Ok((0..matches.len()).map(|i| vec![i]).collect()),
        TieFormat::TwoLeg => matches
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_first_leg)
            .map(|(i, m)| {
                let return_id = m.return_match_id.ok_or_else(|| {
                    format!("first leg {} in round {} has no return match", m.id, round.round.number)
                })?;
                let j = matches
                    .iter()
                    .position(|r| r.id == return_id)
                    .ok_or_else(|| {
                        format!(
                            "return match {} of {} is not in round {}",
                            return_id, m.id, round.round.number
                        )
                    })?;
                Ok(vec![i, j])
            })
            .collect(),
        TieFormat::Series(n) => {
            let mut ties: Vec<Vec<usize>> = Vec::new();
            for (i, m) in matches.iter().enumerate() {
                let starts_series = match ties.last() {
                    Some(current) => m.series_number == Some(1) || current.len() >= n as usize,
                    None => true,
                };
                if starts_series {
                    ties.push(vec![i]);
                } else if let Some(current) = ties.last_mut() {
                    current.push(i);
                }
            }
            if let Some(bad) = ties.iter().find(|t| t.len() != n as usize) {
                return Err(format!(
                    "round {} has a series of {} matches starting at match {}, expected {}",
                    round.round.number,
                    bad.len(),
                    matches[bad[0]].id,
                    n
                ));
            }
            Ok(ties)
        }
    }
}

fn decide(round: &BracketRound, format: TieFormat, tie: &[usize], victory_only: bool) -> TieOutcome {
    let legs: Vec<_> = tie.iter().map(|&i| round.matches[i].leg_result()).collect();
    tie::resolve(format, &legs, victory_only)
}

/// Put `team` into side `side` of a tie, on every match of it.
fn write_slot(round: &mut BracketRound, tie: &[usize], side: Side, team: Option<TeamId>) {
    for (k, &i) in tie.iter().enumerate() {
        let m = &mut round.matches[i];
        let a_home = TieFormat::side_a_at_home(k);
        match (side, a_home) {
            (Side::A, true) | (Side::B, false) => m.home_team_id = team,
            _ => m.away_team_id = team,
        }
    }
}

fn mark_fake(round: &mut BracketRound, tie: &[usize], fake: bool) {
    for &i in tie {
        let m = &mut round.matches[i];
        if fake {
            m.is_fake = true;
            m.terminated = true;
        } else if m.is_fake {
            m.is_fake = false;
            m.terminated = false;
        }
    }
}

fn write_aggregates(round: &mut BracketRound, format: TieFormat, tie: &[usize]) {
    if format != TieFormat::TwoLeg {
        return;
    }
    let legs: Vec<_> = tie.iter().map(|&i| round.matches[i].leg_result()).collect();
    let total = tie::aggregate(&legs);
    for (k, &i) in tie.iter().enumerate() {
        let m = &mut round.matches[i];
        let seen = total.map(|t| if TieFormat::side_a_at_home(k) { t } else { t.swapped() });
        m.home_aggregate = seen.map(|s| s.home);
        m.away_aggregate = seen.map(|s| s.away);
    }
}

/// Recompute every tie of the bracket and propagate winners round by round.
///
/// Structural problems (a missing return leg, a short series, a missing next-round tie) are
/// logged and that step is skipped; the rest of the bracket is still processed.
pub fn recalculate(bracket: &mut Bracket) -> ProgressionReport {
    let mut report = ProgressionReport::default();
    let victory_only = bracket.victory_only;

    let structure: Vec<Option<(TieFormat, Vec<Vec<usize>>)>> = bracket
        .rounds
        .iter()
        .map(|round| {
            let format = match round.round.format() {
                Ok(f) => f,
                Err(e) => {
                    report.skipped.push(format!("round {}: {}", round.round.number, e));
                    return None;
                }
            };
            match tie_indices(round, format) {
                Ok(ties) => Some((format, ties)),
                Err(msg) => {
                    report.skipped.push(msg);
                    None
                }
            }
        })
        .collect();
    for msg in &report.skipped {
        warn!("cup {}: {}", bracket.cup_id, msg);
    }

    // Ties of the previous round with no entrant and none to come.
    let mut dead_prev: Vec<bool> = Vec::new();

    for r in 0..bracket.rounds.len() {
        let Some((format, ties)) = structure[r].as_ref() else {
            dead_prev.clear();
            continue;
        };
        let round_number = bracket.rounds[r].round.number;
        let mut dead_here = vec![false; ties.len()];

        for (t, tie) in ties.iter().enumerate() {
            let round = &mut bracket.rounds[r];
            let first = &round.matches[tie[0]];
            let (a, b) = (first.home_team_id, first.away_team_id);

            let slot_closed =
                |slot: usize| r == 0 || dead_prev.get(2 * t + slot).copied().unwrap_or(false);
            let a_gone = a.is_none() && slot_closed(0);
            let b_gone = b.is_none() && slot_closed(1);

            let (winner, walkover) = match (a, b) {
                _ if a_gone && b_gone => {
                    dead_here[t] = true;
                    mark_fake(round, tie, true);
                    (None, false)
                }
                (Some(team), None) if b_gone => (Some(team), true),
                (None, Some(team)) if a_gone => (Some(team), true),
                (Some(_), Some(_)) => {
                    mark_fake(round, tie, false);
                    write_aggregates(round, *format, tie);
                    match decide(round, *format, tie, victory_only) {
                        TieOutcome::Decided(side) => (side.of(a, b), false),
                        TieOutcome::Undecided => {
                            report.undecided += 1;
                            (None, false)
                        }
                    }
                }
                _ => {
                    mark_fake(round, tie, false);
                    (None, false)
                }
            };

            if walkover {
                mark_fake(round, tie, true);
                info!(
                    "cup {} round {} tie {}: walkover for team {:?}",
                    bracket.cup_id, round_number, t, winner
                );
            }

            if let Some(team_id) = winner {
                report.advanced.push(Advancement {
                    round: round_number,
                    tie_index: t,
                    team_id,
                    walkover,
                });
            }

            if r + 1 == bracket.rounds.len() {
                report.champion = winner;
                continue;
            }

            let Some((_, next_ties)) = structure[r + 1].as_ref() else {
                continue;
            };
            let Some(target) = next_ties.get(t / 2) else {
                let msg = format!(
                    "round {} tie {} has no target tie {} in the next round",
                    round_number,
                    t,
                    t / 2
                );
                warn!("cup {}: {}", bracket.cup_id, msg);
                report.skipped.push(msg);
                continue;
            };

            let side = if t % 2 == 0 { Side::A } else { Side::B };
            write_slot(&mut bracket.rounds[r + 1], target, side, winner);
            if let Some(team_id) = winner {
                debug!(
                    "cup {}: team {} into round {} tie {} side {:?}",
                    bracket.cup_id,
                    team_id,
                    round_number + 1,
                    t / 2,
                    side
                );
            }
        }

        dead_prev = dead_here;
    }

    report
}
