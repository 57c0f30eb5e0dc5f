//! Tie formats and tie resolution.
//!
//! A tie is every match deciding one bracket slot. Its two entrants are called side A and
//! side B; side A is the home team of the first match. Within a tie the sides alternate
//! venues, so side A plays at home in every even-indexed match (0-based creation order).

use crate::{
    error::{LeagueError, Result},
    types::score::Score,
    TeamId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many matches decide a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TieFormat {
    /// One match; penalties break a draw.
    Single,
    /// Home and away legs decided on aggregate, then on the return leg's shootout.
    TwoLeg,
    /// Best-of-N series (3, 5 or 7 matches).
    Series(u8),
}

impl TieFormat {
    /// Map the configured matches-per-tie count to a format.
    pub fn from_matches_per_tie(matches: u8) -> Result<Self> {
        match matches {
            1 => Ok(TieFormat::Single),
            2 => Ok(TieFormat::TwoLeg),
            3 | 5 | 7 => Ok(TieFormat::Series(matches)),
            other => Err(LeagueError::validation(format!(
                "matches per tie must be one of 1, 2, 3, 5, 7 (got {})",
                other
            ))),
        }
    }

    pub fn matches_per_tie(&self) -> u8 {
        match self {
            TieFormat::Single => 1,
            TieFormat::TwoLeg => 2,
            TieFormat::Series(n) => *n,
        }
    }

    /// The format used for a final: a two-leg tie collapses to one match, a series stays.
    pub fn final_round(self) -> Self {
        match self {
            TieFormat::TwoLeg => TieFormat::Single,
            other => other,
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, TieFormat::Series(_))
    }

    /// Whether side A is the home team in the match at `index` (0-based) of a tie.
    pub fn side_a_at_home(index: usize) -> bool {
        index % 2 == 0
    }
}

impl fmt::Display for TieFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieFormat::Single => write!(f, "single match"),
            TieFormat::TwoLeg => write!(f, "two legs"),
            TieFormat::Series(n) => write!(f, "best of {}", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Pick the team on this side.
    pub fn of(self, a: Option<TeamId>, b: Option<TeamId>) -> Option<TeamId> {
        match self {
            Side::A => a,
            Side::B => b,
        }
    }
}

/// Result of a tie, or the lack of one. Unresolved ties are a normal state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieOutcome {
    Decided(Side),
    Undecided,
}

/// What the resolver needs to know about one match of a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegResult {
    pub score: Option<Score>,
    pub shootout: Option<Score>,
    pub terminated: bool,
    pub is_fake: bool,
}

impl LegResult {
    fn played(&self) -> Option<Score> {
        if self.terminated && !self.is_fake {
            self.score
        } else {
            None
        }
    }
}

/// Express a home/away score from side A's point of view.
fn for_sides(index: usize, score: Score) -> Score {
    if TieFormat::side_a_at_home(index) {
        score
    } else {
        score.swapped()
    }
}

fn compare(score: Score) -> Option<Side> {
    match score.home.cmp(&score.away) {
        std::cmp::Ordering::Greater => Some(Side::A),
        std::cmp::Ordering::Less => Some(Side::B),
        std::cmp::Ordering::Equal => None,
    }
}

/// Shootout of the match at `index`, from side A's point of view.
fn shootout_winner(legs: &[LegResult], index: usize) -> Option<Side> {
    legs.get(index)
        .and_then(|leg| leg.shootout)
        .and_then(|pens| compare(for_sides(index, pens)))
}

/// Goals per side summed over every played match of the tie, `None` if nothing was played.
pub fn aggregate(legs: &[LegResult]) -> Option<Score> {
    let mut total: Option<Score> = None;
    for (i, leg) in legs.iter().enumerate() {
        if let Some(score) = leg.played() {
            let s = for_sides(i, score);
            let t = total.get_or_insert_with(Score::default);
            t.home += s.home;
            t.away += s.away;
        }
    }
    total
}

/// Decide a tie from its matches, given in creation order.
pub fn resolve(format: TieFormat, legs: &[LegResult], victory_only: bool) -> TieOutcome {
    let decided = match format {
        TieFormat::Single => resolve_single(legs),
        TieFormat::TwoLeg => resolve_two_leg(legs),
        TieFormat::Series(n) => resolve_series(n, legs, victory_only),
    };
    decided.map_or(TieOutcome::Undecided, TieOutcome::Decided)
}

fn resolve_single(legs: &[LegResult]) -> Option<Side> {
    let score = legs.first()?.played()?;
    compare(score).or_else(|| shootout_winner(legs, 0))
}

fn resolve_two_leg(legs: &[LegResult]) -> Option<Side> {
    if legs.len() < 2 || legs[..2].iter().any(|leg| leg.played().is_none()) {
        return None;
    }
    let total = aggregate(&legs[..2])?;
    compare(total).or_else(|| shootout_winner(legs, 1))
}

fn resolve_series(n: u8, legs: &[LegResult], victory_only: bool) -> Option<Side> {
    let played: Vec<(usize, Score)> = legs
        .iter()
        .enumerate()
        .filter_map(|(i, leg)| leg.played().map(|s| (i, for_sides(i, s))))
        .collect();
    let last_index = played.last().map(|(i, _)| *i)?;
    let complete = played.len() >= n as usize;

    if victory_only {
        let wins_a = played.iter().filter(|(_, s)| s.home > s.away).count();
        let wins_b = played.iter().filter(|(_, s)| s.away > s.home).count();
        let needed = n as usize / 2 + 1;

        if wins_a >= needed {
            return Some(Side::A);
        }
        if wins_b >= needed {
            return Some(Side::B);
        }
        if !complete {
            return None;
        }
        return compare(Score::new(wins_a as u32, wins_b as u32))
            .or_else(|| shootout_winner(legs, last_index));
    }

    if !complete {
        return None;
    }
    let total = played.iter().fold(Score::default(), |acc, (_, s)| {
        Score::new(acc.home + s.home, acc.away + s.away)
    });
    compare(total).or_else(|| shootout_winner(legs, last_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(home: u32, away: u32) -> LegResult {
        LegResult {
            score: Some(Score::new(home, away)),
            shootout: None,
            terminated: true,
            is_fake: false,
        }
    }

    fn with_pens(mut leg: LegResult, home: u32, away: u32) -> LegResult {
        leg.shootout = Some(Score::new(home, away));
        leg
    }

    #[test]
    fn test_from_matches_per_tie() {
        assert_eq!(TieFormat::from_matches_per_tie(1).unwrap(), TieFormat::Single);
        assert_eq!(TieFormat::from_matches_per_tie(2).unwrap(), TieFormat::TwoLeg);
        assert_eq!(
            TieFormat::from_matches_per_tie(5).unwrap(),
            TieFormat::Series(5)
        );
        for bad in [0, 4, 6, 8] {
            assert!(TieFormat::from_matches_per_tie(bad).is_err());
        }
    }

    #[test]
    fn test_final_round_format() {
        assert_eq!(TieFormat::TwoLeg.final_round(), TieFormat::Single);
        assert_eq!(TieFormat::Single.final_round(), TieFormat::Single);
        assert_eq!(TieFormat::Series(3).final_round(), TieFormat::Series(3));
    }

    #[test]
    fn test_single_match_winner_and_draw() {
        assert_eq!(
            resolve(TieFormat::Single, &[played(2, 1)], false),
            TieOutcome::Decided(Side::A)
        );
        assert_eq!(
            resolve(TieFormat::Single, &[played(0, 3)], false),
            TieOutcome::Decided(Side::B)
        );
        assert_eq!(
            resolve(TieFormat::Single, &[played(1, 1)], false),
            TieOutcome::Undecided
        );
        assert_eq!(
            resolve(TieFormat::Single, &[with_pens(played(1, 1), 3, 4)], false),
            TieOutcome::Decided(Side::B)
        );
    }

    #[test]
    fn test_unterminated_match_is_undecided() {
        let mut leg = played(3, 0);
        leg.terminated = false;
        assert_eq!(
            resolve(TieFormat::Single, &[leg], false),
            TieOutcome::Undecided
        );
    }

    #[test]
    fn test_two_leg_aggregate_accounts_for_swap() {
        // A wins 2-0 at home, loses 1-2 away: aggregate 3-2 for A.
        let legs = [played(2, 0), played(2, 1)];
        assert_eq!(aggregate(&legs), Some(Score::new(3, 2)));
        assert_eq!(
            resolve(TieFormat::TwoLeg, &legs, false),
            TieOutcome::Decided(Side::A)
        );
    }

    #[test]
    fn test_two_leg_needs_both_legs() {
        let legs = [played(5, 0), LegResult::default()];
        assert_eq!(
            resolve(TieFormat::TwoLeg, &legs, false),
            TieOutcome::Undecided
        );
    }

    #[test]
    fn test_two_leg_level_aggregate_uses_return_leg_shootout() {
        // 1-0 then 0-1: level at 1-1. B hosts the return leg and wins the shootout 5-4.
        let legs = [played(1, 0), with_pens(played(1, 0), 5, 4)];
        assert_eq!(
            resolve(TieFormat::TwoLeg, &legs, false),
            TieOutcome::Decided(Side::B)
        );

        let no_pens = [played(1, 0), played(1, 0)];
        assert_eq!(
            resolve(TieFormat::TwoLeg, &no_pens, false),
            TieOutcome::Undecided
        );
    }

    #[test]
    fn test_series_victory_only_counts_wins_not_goals() {
        // A: wins 2-0 at home, loses 0-1 away (B home 1-0), wins 1-0 at home.
        let legs = [played(2, 0), played(1, 0), played(1, 0)];
        assert_eq!(
            resolve(TieFormat::Series(3), &legs, true),
            TieOutcome::Decided(Side::A)
        );
    }

    #[test]
    fn test_series_victory_only_clinches_early() {
        let legs = [played(1, 0), played(0, 2), LegResult::default()];
        assert_eq!(
            resolve(TieFormat::Series(3), &legs, true),
            TieOutcome::Decided(Side::A)
        );

        let open = [played(1, 0), played(2, 0), LegResult::default()];
        assert_eq!(
            resolve(TieFormat::Series(3), &open, true),
            TieOutcome::Undecided
        );
    }

    #[test]
    fn test_series_victory_only_draws_score_nothing() {
        let legs = [played(1, 1), played(0, 0), with_pens(played(2, 2), 4, 2)];
        assert_eq!(
            resolve(TieFormat::Series(3), &legs, true),
            TieOutcome::Decided(Side::A)
        );
    }

    #[test]
    fn test_series_goals_aggregate() {
        // A loses 0-1 at home, wins 4-0 away (B home 0-4), loses 1-2 at home: A 5-3.
        let legs = [played(0, 1), played(0, 4), played(1, 2)];
        assert_eq!(
            resolve(TieFormat::Series(3), &legs, false),
            TieOutcome::Decided(Side::A)
        );
        assert_eq!(
            resolve(TieFormat::Series(3), &legs, true),
            TieOutcome::Decided(Side::B)
        );
    }

    #[test]
    fn test_series_ignores_fake_matches() {
        let mut fake = played(9, 0);
        fake.is_fake = true;
        let legs = [fake, played(1, 0), played(1, 0)];
        assert_eq!(
            resolve(TieFormat::Series(3), &legs, true),
            TieOutcome::Undecided
        );
    }

    #[test]
    fn test_side_a_alternates_venue() {
        assert!(TieFormat::side_a_at_home(0));
        assert!(!TieFormat::side_a_at_home(1));
        assert!(TieFormat::side_a_at_home(2));
    }
}
