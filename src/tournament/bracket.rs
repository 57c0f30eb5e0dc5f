//! Single-elimination bracket planning.
//!
//! The seed list is padded with empty slots up to the next power of two and paired off
//! in order: seeds 0 and 1 meet, then 2 and 3, and so on. Later rounds start empty and are
//! filled by the progression engine as ties are decided.

use super::tie::TieFormat;
use crate::{
    error::{LeagueError, Result},
    TeamId,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;


/// The two entrants of a tie; `None` is either a bye or a slot still to be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TiePlan {
    pub side_a: Option<TeamId>,
    pub side_b: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPlan {
    pub number: u32,
    pub label: String,
    pub format: TieFormat,
    pub ties: Vec<TiePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPlan {
    /// Seeds after padding (a power of two).
    pub size: usize,
    pub byes: usize,
    pub rounds: Vec<RoundPlan>,
}

impl BracketPlan {
    pub fn tie_count(&self) -> usize {
        self.rounds.iter().map(|r| r.ties.len()).sum()
    }
}

/// One fixture to create for a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPlan {
    pub home: Option<TeamId>,
    pub away: Option<TeamId>,
    /// False only for the return leg of a two-leg tie.
    pub is_first_leg: bool,
    /// 1-based position inside a best-of-N series.
    pub series_number: Option<u8>,
}

/// Display name for a round given how many teams enter it.
pub fn round_label(teams_in_round: usize, round_number: u32) -> String {
    match teams_in_round {
        2 => "Finale".to_string(),
        4 => "Demi-finales".to_string(),
        8 => "Quarts de finale".to_string(),
        16 => "Huitièmes de finale".to_string(),
        32 => "Seizièmes de finale".to_string(),
        _ => format!("Tour {}", round_number),
    }
}

/// Fixtures making up one tie in the given format.
///
/// Side A hosts the odd-numbered matches, side B the even-numbered ones.
pub fn tie_matches(format: TieFormat, tie: &TiePlan) -> Vec<MatchPlan> {
    (0..format.matches_per_tie() as usize)
        .map(|k| {
            let (home, away) = if TieFormat::side_a_at_home(k) {
                (tie.side_a, tie.side_b)
            } else {
                (tie.side_b, tie.side_a)
            };
            MatchPlan {
                home,
                away,
                is_first_leg: !(format == TieFormat::TwoLeg && k == 1),
                series_number: format.is_series().then_some(k as u8 + 1),
            }
        })
        .collect()
}

/// Flatten cross-group pairings into a seed list, keeping each pair adjacent.
pub fn pairs_to_seeds(pairs: &[(TeamId, TeamId)]) -> Vec<TeamId> {
    pairs.iter().flat_map(|(a, b)| [*a, *b]).collect()
}

/// Plan a single-elimination bracket.
///
/// `seeds` is taken in order (shuffle beforehand for a random draw). `format` applies to every
/// round except the final, which uses [`TieFormat::final_round`]. `first_round` overrides the
/// opening round's format, final or not.
pub fn plan_bracket(
    seeds: &[TeamId],
    format: TieFormat,
    first_round: Option<TieFormat>,
) -> Result<BracketPlan> {
    if seeds.len() < 2 {
        return Err(LeagueError::validation(format!(
            "a bracket needs at least 2 teams, got {}",
            seeds.len()
        )));
    }
    let mut seen = HashSet::with_capacity(seeds.len());
    if let Some(dup) = seeds.iter().find(|t| !seen.insert(**t)) {
        return Err(LeagueError::validation(format!(
            "team {} is seeded more than once",
            dup
        )));
    }

    let size = seeds.len().next_power_of_two();
    let byes = size - seeds.len();
    let round_count = size.trailing_zeros();

    let mut slots: Vec<Option<TeamId>> = seeds.iter().copied().map(Some).collect();
    slots.resize(size, None);

    let mut rounds = Vec::with_capacity(round_count as usize);
    for number in 1..=round_count {
        let teams_in_round = size >> (number - 1);
        let mut round_format = if number == round_count {
            format.final_round()
        } else {
            format
        };
        if number == 1 {
            round_format = first_round.unwrap_or(round_format);
        }

        let ties = if number == 1 {
            slots
                .chunks(2)
                .map(|pair| TiePlan {
                    side_a: pair[0],
                    side_b: pair[1],
                })
                .collect()
        } else {
            vec![TiePlan::default(); teams_in_round / 2]
        };

        rounds.push(RoundPlan {
            number,
            label: round_label(teams_in_round, number),
            format: round_format,
            ties,
        });
    }

    debug!(
        "planned bracket: {} teams, {} byes, {} rounds",
        seeds.len(),
        byes,
        round_count
    );

    Ok(BracketPlan { size, byes, rounds })
}
