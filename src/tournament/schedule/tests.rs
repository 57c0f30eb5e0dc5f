//! Unit tests for round-robin generation

use super::*;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;

fn teams(n: i64) -> Vec<TeamId> {
    (1..=n).map(TeamId::new).collect()
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

#[test]
fn test_circle_rounds_rotation_keeps_first_slot() {
    let rounds = circle_rounds(&teams(4));
    let t = TeamId::new;

    assert_eq!(rounds.len(), 3);
    assert_eq!(
        rounds[0],
        vec![(Some(t(1)), Some(t(4))), (Some(t(2)), Some(t(3)))]
    );
    assert_eq!(
        rounds[1],
        vec![(Some(t(1)), Some(t(3))), (Some(t(4)), Some(t(2)))]
    );
    assert_eq!(
        rounds[2],
        vec![(Some(t(1)), Some(t(2))), (Some(t(3)), Some(t(4)))]
    );
}

#[test]
fn test_circle_rounds_odd_count_adds_bye_slot() {
    let rounds = circle_rounds(&teams(5));
    assert_eq!(rounds.len(), 5);
    for round in &rounds {
        assert_eq!(round.len(), 3);
        let byes = round
            .iter()
            .filter(|(a, b)| a.is_none() || b.is_none())
            .count();
        assert_eq!(byes, 1);
    }
}

#[test]
fn test_fewer_than_two_teams_rejected() {
    for n in 0..2 {
        let result = double_round_robin(&teams(n), &mut rng());
        assert!(matches!(result, Err(LeagueError::Validation { .. })));
    }
}

#[test]
fn test_duplicate_team_rejected() {
    let t = TeamId::new;
    let result = double_round_robin(&[t(1), t(2), t(1)], &mut rng());
    assert!(matches!(result, Err(LeagueError::Validation { .. })));
}

#[test]
fn test_even_team_count_matchday_shape() {
    for n in [2, 4, 6, 8, 10] {
        let matchdays = double_round_robin(&teams(n), &mut rng()).unwrap();
        let rounds = (n - 1) as usize;

        assert_eq!(matchdays.len(), 2 * rounds, "N = {n}");
        for (i, day) in matchdays.iter().enumerate() {
            assert_eq!(day.number, i as u32 + 1);
            assert_eq!(day.pairings.len(), (n / 2) as usize);
            let expected_leg = if i < rounds { Leg::First } else { Leg::Return };
            assert_eq!(day.leg, expected_leg);
        }
    }
}

#[test]
fn test_return_leg_inverts_first_leg() {
    let matchdays = double_round_robin(&teams(6), &mut rng()).unwrap();
    let (first, second) = matchdays.split_at(5);

    for (a, b) in first.iter().zip(second) {
        assert_eq!(b.number, a.number + 5);
        for (p, q) in a.pairings.iter().zip(&b.pairings) {
            assert_eq!(p.home, q.away);
            assert_eq!(p.away, q.home);
        }
    }
}

#[test]
fn test_odd_team_count_every_pair_meets_home_and_away() {
    let n = 7;
    let matchdays = double_round_robin(&teams(n), &mut rng()).unwrap();
    assert_eq!(matchdays.len(), 2 * n as usize);

    let mut fixtures: HashMap<(TeamId, TeamId), u32> = HashMap::new();
    let mut byes: HashMap<TeamId, u32> = HashMap::new();
    for day in &matchdays {
        assert_eq!(day.pairings.len(), (n / 2) as usize);
        let playing: Vec<TeamId> = day
            .pairings
            .iter()
            .flat_map(|p| [p.home, p.away])
            .collect();
        for team in teams(n) {
            if !playing.contains(&team) {
                *byes.entry(team).or_default() += 1;
            }
        }
        for p in &day.pairings {
            *fixtures.entry((p.home, p.away)).or_default() += 1;
        }
    }

    for a in teams(n) {
        assert_eq!(byes[&a], 2, "one bye per leg for {a}");
        for b in teams(n) {
            if a != b {
                assert_eq!(fixtures.get(&(a, b)), Some(&1), "{a} hosts {b} once");
            }
        }
    }
}

#[test]
fn test_no_team_plays_twice_on_a_matchday() {
    let matchdays = double_round_robin(&teams(9), &mut rng()).unwrap();
    for day in &matchdays {
        let mut seen = std::collections::HashSet::new();
        for p in &day.pairings {
            assert!(seen.insert(p.home));
            assert!(seen.insert(p.away));
        }
    }
}

#[test]
fn test_single_round_robin_is_first_leg_only() {
    let matchdays = single_round_robin(&teams(4), &mut rng()).unwrap();
    assert_eq!(matchdays.len(), 3);
    assert!(matchdays.iter().all(|d| d.leg == Leg::First));

    let total: usize = matchdays.iter().map(|d| d.pairings.len()).sum();
    assert_eq!(total, 6);
}

#[test]
fn test_input_order_is_not_mutated() {
    let original = teams(5);
    let copy = original.clone();
    let _ = double_round_robin(&copy, &mut rng()).unwrap();
    assert_eq!(copy, original);
}
