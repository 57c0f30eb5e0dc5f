//! Group stage: partition teams into groups, schedule each group, and seed the knockout phase
//! from the final group rankings.

use super::{
    bracket::{pairs_to_seeds, plan_bracket, BracketPlan},
    schedule::{double_round_robin, single_round_robin, MatchdayPlan},
    tie::TieFormat,
};
use crate::{
    error::{LeagueError, Result},
    TeamId,
};
use log::debug;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub name: String,
    pub teams: Vec<TeamId>,
}

/// A group with its round-robin fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGroup {
    pub group: GroupPlan,
    pub matchdays: Vec<MatchdayPlan>,
}

/// The knockout phase built from group rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockoutDraw {
    /// Round-one pairings in bracket order.
    pub pairs: Vec<(TeamId, TeamId)>,
    pub bracket: BracketPlan,
}

/// Letter for the group at `index`: A..Z, then AA, AB, ...
pub fn group_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Check that `team_count` teams split evenly into `group_count` groups of at least two.
pub fn validate_partition(team_count: usize, group_count: usize) -> Result<()> {
    if group_count == 0 {
        return Err(LeagueError::validation("group count must be at least 1"));
    }
    if team_count < group_count * 2 {
        return Err(LeagueError::validation(format!(
            "{} groups need at least {} teams, got {}",
            group_count,
            group_count * 2,
            team_count
        )));
    }
    if team_count % group_count != 0 {
        return Err(LeagueError::validation(format!(
            "{} teams cannot be split evenly into {} groups",
            team_count, group_count
        )));
    }
    Ok(())
}

/// Check the qualification settings against the group layout.
pub fn validate_qualification(
    teams_per_group: usize,
    group_count: usize,
    qualifiers_per_group: usize,
) -> Result<()> {
    if qualifiers_per_group < 1 {
        return Err(LeagueError::validation(
            "at least one team per group must qualify",
        ));
    }
    if qualifiers_per_group >= teams_per_group {
        return Err(LeagueError::validation(format!(
            "{} qualifiers per group leaves nobody eliminated from groups of {}",
            qualifiers_per_group, teams_per_group
        )));
    }
    if group_count % 2 != 0 {
        return Err(LeagueError::validation(format!(
            "groups are paired for the knockout draw, so the group count must be even (got {})",
            group_count
        )));
    }
    Ok(())
}

/// Full check of a group cup configuration.
pub fn validate_group_config(
    team_count: usize,
    group_count: usize,
    qualifiers_per_group: usize,
) -> Result<()> {
    validate_partition(team_count, group_count)?;
    validate_qualification(team_count / group_count, group_count, qualifiers_per_group)
}

/// Split `teams` into `group_count` contiguous groups labelled A, B, C, ...
pub fn partition_groups(teams: &[TeamId], group_count: usize) -> Result<Vec<GroupPlan>> {
    validate_partition(teams.len(), group_count)?;
    let mut seen = HashSet::with_capacity(teams.len());
    if let Some(dup) = teams.iter().find(|t| !seen.insert(**t)) {
        return Err(LeagueError::validation(format!(
            "team {} appears more than once",
            dup
        )));
    }

    let size = teams.len() / group_count;
    Ok(teams
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| GroupPlan {
            name: group_label(i),
            teams: chunk.to_vec(),
        })
        .collect())
}

/// Partition (after an optional shuffle) and schedule every group.
///
/// `legs` is 1 for a single round robin or 2 for home and away.
pub fn plan_group_stage<R: Rng + ?Sized>(
    teams: &[TeamId],
    group_count: usize,
    legs: u8,
    randomized: bool,
    rng: &mut R,
) -> Result<Vec<ScheduledGroup>> {
    if legs != 1 && legs != 2 {
        return Err(LeagueError::validation(format!(
            "groups are played over 1 or 2 legs, got {}",
            legs
        )));
    }
    let mut order = teams.to_vec();
    if randomized {
        order.shuffle(rng);
    }

    partition_groups(&order, group_count)?
        .into_iter()
        .map(|group| {
            let matchdays = if legs == 2 {
                double_round_robin(&group.teams, rng)?
            } else {
                single_round_robin(&group.teams, rng)?
            };
            debug!(
                "group {}: {} teams, {} matchdays",
                group.name,
                group.teams.len(),
                matchdays.len()
            );
            Ok(ScheduledGroup { group, matchdays })
        })
        .collect()
}

/// Teams holding each rank 1..=q, across all groups in group order.
pub fn qualifiers_by_rank(rankings: &[Vec<TeamId>], q: usize) -> Vec<Vec<TeamId>> {
    (0..q)
        .map(|rank| {
            rankings
                .iter()
                .filter_map(|group| group.get(rank).copied())
                .collect()
        })
        .collect()
}

/// Cross-group pairings for the first knockout round.
///
/// Groups are paired consecutively (A with B, C with D, ...). Within a pair, rank k of the first
/// group meets rank q+1-k of the second, and the better-ranked team is listed first:
/// q = 1 gives 1A-1B; q = 2 gives 1A-2B and 1B-2A; q = 3 gives 1A-3B, 2A-2B and 1B-3A.
pub fn cross_pairings(rankings: &[Vec<TeamId>], q: usize) -> Result<Vec<(TeamId, TeamId)>> {
    if q < 1 {
        return Err(LeagueError::validation(
            "at least one team per group must qualify",
        ));
    }
    if rankings.len() % 2 != 0 {
        return Err(LeagueError::validation(format!(
            "cannot pair an odd number of groups ({})",
            rankings.len()
        )));
    }
    if let Some((i, short)) = rankings.iter().enumerate().find(|(_, r)| r.len() < q) {
        return Err(LeagueError::validation(format!(
            "group {} ranks {} teams, {} must qualify",
            group_label(i),
            short.len(),
            q
        )));
    }

    let mut pairs = Vec::with_capacity(rankings.len() * q / 2);
    for duo in rankings.chunks(2) {
        let (a, b) = (&duo[0], &duo[1]);
        for k in 0..q {
            let opposite = q - 1 - k;
            if k <= opposite {
                pairs.push((a[k], b[opposite]));
            } else {
                pairs.push((b[opposite], a[k]));
            }
        }
    }
    Ok(pairs)
}

/// Build the knockout bracket from final group rankings.
///
/// The pairings are drawn in random order; the first round is always two-legged and later
/// rounds use `format`.
pub fn plan_knockout<R: Rng + ?Sized>(
    rankings: &[Vec<TeamId>],
    q: usize,
    format: TieFormat,
    rng: &mut R,
) -> Result<KnockoutDraw> {
    let mut pairs = cross_pairings(rankings, q)?;
    pairs.shuffle(rng);
    let bracket = plan_bracket(&pairs_to_seeds(&pairs), format, Some(TieFormat::TwoLeg))?;
    Ok(KnockoutDraw { pairs, bracket })
}
