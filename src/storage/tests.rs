//! Unit tests for storage functionality

use super::*;
use crate::{
    tournament::{
        bracket::plan_bracket,
        groups::{plan_group_stage, plan_knockout},
        schedule::double_round_robin,
        tie::TieFormat,
    },
    types::score::Score,
    CupId, LeagueError, PlayerId, TeamId,
};
use chrono::NaiveDate;
use rand::{rngs::StdRng, SeedableRng};

fn create_test_db() -> LeagueDatabase {
    LeagueDatabase::new_in_memory().unwrap()
}

fn create_teams(db: &mut LeagueDatabase, n: usize) -> Vec<TeamId> {
    (0..n)
        .map(|i| db.create_team(&format!("Team {}", i + 1)).unwrap().id)
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_cup(db: &mut LeagueDatabase, matches_per_tie: u8, victory_only: bool) -> Cup {
    db.create_cup(&NewCup {
        name: "Coupe".to_string(),
        model_id: None,
        matches_per_tie,
        victory_only,
        randomized: false,
    })
    .unwrap()
}

#[test]
fn test_database_creation() {
    let db = create_test_db();
    assert!(db.list_teams().unwrap().is_empty());
}

#[test]
fn test_file_database_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("league.db");

    {
        let mut db = LeagueDatabase::new(&path).unwrap();
        db.create_team("Persisted").unwrap();
    }
    let db = LeagueDatabase::new(&path).unwrap();
    assert_eq!(db.list_teams().unwrap()[0].name, "Persisted");
}

#[test]
fn test_team_crud() {
    let mut db = create_test_db();
    let team = db.create_team("Bordeaux").unwrap();

    assert_eq!(db.get_team(team.id).unwrap().name, "Bordeaux");
    assert_eq!(db.rename_team(team.id, "Girondins").unwrap().name, "Girondins");

    db.delete_team(team.id).unwrap();
    match db.get_team(team.id) {
        Err(LeagueError::NotFound { entity, .. }) => assert_eq!(entity, "team"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_rivals_are_bidirectional() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 3);

    db.set_rival(t[0], t[1]).unwrap();
    assert_eq!(db.get_team(t[0]).unwrap().rival_id, Some(t[1]));
    assert_eq!(db.get_team(t[1]).unwrap().rival_id, Some(t[0]));

    // Re-pairing t[0] releases t[1].
    db.set_rival(t[0], t[2]).unwrap();
    assert_eq!(db.get_team(t[0]).unwrap().rival_id, Some(t[2]));
    assert_eq!(db.get_team(t[2]).unwrap().rival_id, Some(t[0]));
    assert_eq!(db.get_team(t[1]).unwrap().rival_id, None);

    db.clear_rival(t[2]).unwrap();
    assert_eq!(db.get_team(t[0]).unwrap().rival_id, None);
    assert_eq!(db.get_team(t[2]).unwrap().rival_id, None);
}

#[test]
fn test_team_cannot_be_its_own_rival() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 1);
    assert!(matches!(
        db.set_rival(t[0], t[0]),
        Err(LeagueError::Validation { .. })
    ));
}

#[test]
fn test_transfer_updates_current_team() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 3);
    let player = db.create_player("Zidane", Some("MF"), Some(t[0])).unwrap();

    let first = db
        .record_transfer(player.id, None, t[1], date(2020, 7, 1))
        .unwrap();
    assert_eq!(first.from_team_id, Some(t[0]));
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[1]));

    // A backdated transfer is recorded but does not move the player.
    db.record_transfer(player.id, Some(t[0]), t[2], date(2019, 1, 1))
        .unwrap();
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[1]));
    assert_eq!(db.list_transfers(player.id).unwrap().len(), 2);
}

#[test]
fn test_transfer_to_same_team_rejected() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 1);
    let player = db.create_player("Pires", None, Some(t[0])).unwrap();
    assert!(matches!(
        db.record_transfer(player.id, None, t[0], date(2021, 1, 1)),
        Err(LeagueError::Validation { .. })
    ));
}

#[test]
fn test_editing_older_transfer_leaves_current_team() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 4);
    let player = db.create_player("Henry", None, Some(t[0])).unwrap();
    let old = db
        .record_transfer(player.id, None, t[1], date(2018, 1, 1))
        .unwrap();
    db.record_transfer(player.id, None, t[2], date(2019, 1, 1))
        .unwrap();

    db.update_transfer(old.id, Some(t[0]), t[3], date(2018, 2, 1))
        .unwrap();
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[2]));

    // Moving the old transfer past the latest makes it the latest.
    db.update_transfer(old.id, Some(t[0]), t[3], date(2020, 1, 1))
        .unwrap();
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[3]));
}

#[test]
fn test_deleting_latest_transfer_moves_player_back() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 3);
    let player = db.create_player("Vieira", None, Some(t[0])).unwrap();
    let first = db
        .record_transfer(player.id, None, t[1], date(2018, 1, 1))
        .unwrap();
    let second = db
        .record_transfer(player.id, None, t[2], date(2019, 1, 1))
        .unwrap();

    db.delete_transfer(second.id).unwrap();
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[1]));

    db.delete_transfer(first.id).unwrap();
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[0]));
}

#[test]
fn test_deleting_older_transfer_keeps_current_team() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 3);
    let player = db.create_player("Makelele", None, None).unwrap();
    let first = db
        .record_transfer(player.id, None, t[1], date(2018, 1, 1))
        .unwrap();
    db.record_transfer(player.id, None, t[2], date(2019, 1, 1))
        .unwrap();

    db.delete_transfer(first.id).unwrap();
    assert_eq!(db.get_player(player.id).unwrap().current_team_id, Some(t[2]));
}

#[test]
fn test_one_season_in_progress_per_league() {
    let mut db = create_test_db();
    let league = db.create_league("Ligue 1").unwrap();
    let first = db.create_season(league.id, "2023-2024").unwrap();

    match db.create_season(league.id, "2024-2025") {
        Err(LeagueError::Conflict { .. }) => (),
        other => panic!("Expected Conflict, got {:?}", other),
    }

    db.finish_season(first.id).unwrap();
    let second = db.create_season(league.id, "2024-2025").unwrap();
    assert_eq!(second.status, SeasonStatus::InProgress);

    assert!(matches!(
        db.reopen_season(first.id),
        Err(LeagueError::Conflict { .. })
    ));
    assert_eq!(
        db.get_season(first.id).unwrap().status,
        SeasonStatus::Finished
    );

    // Another league is unaffected.
    let other = db.create_league("Ligue 2").unwrap();
    assert!(db.create_season(other.id, "2024-2025").is_ok());
}

#[test]
fn test_replace_schedule_regenerates_wholesale() {
    let mut db = create_test_db();
    let league = db.create_league("Ligue 1").unwrap();
    let season = db.create_season(league.id, "2024").unwrap();
    let t = create_teams(&mut db, 4);
    db.set_season_teams(season.id, &t).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let plans = double_round_robin(&t, &mut rng).unwrap();
    let matchdays = db.replace_schedule(season.id, &plans).unwrap();
    assert_eq!(matchdays.len(), 6);
    assert_eq!(db.season_matches(season.id).unwrap().len(), 12);

    // Record a goal, then regenerate: the goal goes with the old matches.
    let m = db.season_matches(season.id).unwrap()[0].clone();
    db.record_goal(&NewGoal {
        fixture: FixtureRef::League(m.id),
        team_id: m.home_team_id,
        scorer_id: None,
        assist_id: None,
        minute: Some(10),
        own_goal: false,
    })
    .unwrap();

    let plans = double_round_robin(&t, &mut rng).unwrap();
    db.replace_schedule(season.id, &plans).unwrap();
    assert_eq!(db.season_matches(season.id).unwrap().len(), 12);
    assert!(db.goals_for(FixtureRef::League(m.id)).unwrap().is_empty());
    assert_eq!(db.matchdays(season.id).unwrap()[0].number, 1);
}

#[test]
fn test_season_results_only_terminated() {
    let mut db = create_test_db();
    let league = db.create_league("Ligue 1").unwrap();
    let season = db.create_season(league.id, "2024").unwrap();
    let t = create_teams(&mut db, 2);
    let mut rng = StdRng::seed_from_u64(1);
    db.replace_schedule(season.id, &double_round_robin(&t, &mut rng).unwrap())
        .unwrap();

    let matches = db.season_matches(season.id).unwrap();
    db.set_match_result(matches[0].id, Some(Score::new(2, 1)), true)
        .unwrap();
    db.set_match_result(matches[1].id, Some(Score::new(0, 0)), false)
        .unwrap();

    let results = db.season_results(season.id).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].score, Score::new(2, 1));
}

#[test]
fn test_goalkeeping_stats() {
    let mut db = create_test_db();
    let league = db.create_league("L").unwrap();
    let season = db.create_season(league.id, "S").unwrap();
    let t = create_teams(&mut db, 2);
    let keeper = db.create_player("Lloris", Some("GK"), Some(t[0])).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    db.replace_schedule(season.id, &double_round_robin(&t, &mut rng).unwrap())
        .unwrap();
    let m = db.season_matches(season.id).unwrap()[0].clone();

    let updated = db
        .set_goalkeeping(m.id, Venue::Away, Some(keeper.id), Some(4))
        .unwrap();
    assert_eq!(updated.away_goalkeeper_id, Some(keeper.id));
    assert_eq!(updated.away_saves, Some(4));
    assert_eq!(updated.home_goalkeeper_id, None);
}

#[test]
fn test_replace_bracket_links_legs_and_resolves_byes() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 3);
    let cup = create_cup(&mut db, 2, false);
    db.set_cup_teams(cup.id, &t).unwrap();

    let plan = plan_bracket(&t, TieFormat::TwoLeg, None).unwrap();
    let (bracket, report) = db.replace_bracket(cup.id, &plan).unwrap();

    assert_eq!(bracket.rounds.len(), 2);
    let first = &bracket.rounds[0].matches;
    assert_eq!(first.len(), 4);
    assert_eq!(first[0].return_match_id, Some(first[1].id));
    assert_eq!(first[1].return_match_id, Some(first[0].id));
    assert!(!first[1].is_first_leg);

    // Team 3 drew the bye and sits in the final already.
    assert!(first[2].is_fake && first[3].is_fake);
    assert_eq!(bracket.rounds[1].matches[0].away_team_id, Some(t[2]));
    assert_eq!(report.advanced.len(), 1);
    assert_eq!(db.cup_teams(cup.id).unwrap().len(), 3);
}

#[test]
fn test_record_knockout_result_propagates() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 4);
    let cup = create_cup(&mut db, 1, false);
    let plan = plan_bracket(&t, TieFormat::Single, None).unwrap();
    let (bracket, _) = db.replace_bracket(cup.id, &plan).unwrap();

    let semi = bracket.rounds[0].matches[1].id;
    let (m, report) = db
        .record_knockout_result(semi, Some(Score::new(1, 1)), Some(Score::new(3, 5)), true)
        .unwrap();
    assert!(m.terminated);
    assert_eq!(report.advanced[0].team_id, t[3]);

    let reloaded = db.load_bracket(cup.id).unwrap();
    assert_eq!(reloaded.rounds[1].matches[0].away_team_id, Some(t[3]));

    // The final cannot take a result before both finalists are known.
    let final_id = reloaded.rounds[1].matches[0].id;
    assert!(matches!(
        db.record_knockout_result(final_id, Some(Score::new(1, 0)), None, true),
        Err(LeagueError::Validation { .. })
    ));
}

#[test]
fn test_recalculate_cup_is_idempotent() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 6);
    let cup = create_cup(&mut db, 2, false);
    let plan = plan_bracket(&t, TieFormat::TwoLeg, None).unwrap();
    let (bracket, _) = db.replace_bracket(cup.id, &plan).unwrap();

    let legs = &bracket.rounds[0].matches;
    db.record_knockout_result(legs[0].id, Some(Score::new(2, 0)), None, true)
        .unwrap();
    db.record_knockout_result(legs[1].id, Some(Score::new(1, 0)), None, true)
        .unwrap();

    let before = db.load_bracket(cup.id).unwrap();
    db.recalculate_cup(cup.id).unwrap();
    db.recalculate_cup(cup.id).unwrap();
    assert_eq!(db.load_bracket(cup.id).unwrap(), before);

    let first_leg = db.get_knockout_match(legs[0].id).unwrap();
    assert_eq!(first_leg.home_aggregate, Some(2));
    assert_eq!(first_leg.away_aggregate, Some(1));
}

#[test]
fn test_recalculate_cup_without_bracket() {
    let mut db = create_test_db();
    let cup = create_cup(&mut db, 1, false);
    assert!(matches!(
        db.recalculate_cup(cup.id),
        Err(LeagueError::Invariant { .. })
    ));
    assert!(matches!(
        db.recalculate_cup(CupId::new(999)),
        Err(LeagueError::NotFound { .. })
    ));
}

#[test]
fn test_create_cup_rejects_bad_format() {
    let mut db = create_test_db();
    let result = db.create_cup(&NewCup {
        name: "Bad".to_string(),
        model_id: None,
        matches_per_tie: 4,
        victory_only: false,
        randomized: false,
    });
    assert!(matches!(result, Err(LeagueError::Validation { .. })));
}

#[test]
fn test_knockout_goal_updates_score_and_bracket() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 2);
    let scorer = db.create_player("Griezmann", None, Some(t[1])).unwrap();
    let cup = create_cup(&mut db, 1, false);
    let (bracket, _) = db
        .replace_bracket(cup.id, &plan_bracket(&t, TieFormat::Single, None).unwrap())
        .unwrap();
    let final_id = bracket.rounds[0].matches[0].id;

    db.record_knockout_result(final_id, Some(Score::new(0, 0)), None, true)
        .unwrap();
    db.record_goal(&NewGoal {
        fixture: FixtureRef::Knockout(final_id),
        team_id: t[1],
        scorer_id: Some(scorer.id),
        assist_id: None,
        minute: Some(90),
        own_goal: false,
    })
    .unwrap();

    let m = db.get_knockout_match(final_id).unwrap();
    assert_eq!(m.score(), Some(Score::new(0, 1)));
    assert_eq!(db.load_bracket(cup.id).unwrap().champion(), Some(t[1]));

    let scorers = db.cup_scorer_entries(cup.id).unwrap();
    assert_eq!(scorers.len(), 1);
    assert_eq!(scorers[0].player_id, scorer.id);
}

#[test]
fn test_goal_for_team_not_playing_rejected() {
    let mut db = create_test_db();
    let league = db.create_league("L").unwrap();
    let season = db.create_season(league.id, "S").unwrap();
    let t = create_teams(&mut db, 3);
    let mut rng = StdRng::seed_from_u64(2);
    db.replace_schedule(season.id, &double_round_robin(&t[..2], &mut rng).unwrap())
        .unwrap();
    let m = db.season_matches(season.id).unwrap()[0].clone();

    let result = db.record_goal(&NewGoal {
        fixture: FixtureRef::League(m.id),
        team_id: t[2],
        scorer_id: None,
        assist_id: None,
        minute: None,
        own_goal: false,
    });
    assert!(matches!(result, Err(LeagueError::Validation { .. })));
}

#[test]
fn test_goals_derive_league_score() {
    let mut db = create_test_db();
    let league = db.create_league("L").unwrap();
    let season = db.create_season(league.id, "S").unwrap();
    let t = create_teams(&mut db, 2);
    let mut rng = StdRng::seed_from_u64(3);
    db.replace_schedule(season.id, &double_round_robin(&t, &mut rng).unwrap())
        .unwrap();
    let m = db.season_matches(season.id).unwrap()[0].clone();
    let fixture = FixtureRef::League(m.id);

    let goal = |team_id: TeamId, own_goal: bool| NewGoal {
        fixture,
        team_id,
        scorer_id: None,
        assist_id: None,
        minute: None,
        own_goal,
    };
    db.record_goal(&goal(m.home_team_id, false)).unwrap();
    db.record_goal(&goal(m.home_team_id, true)).unwrap();
    let away = db.record_goal(&goal(m.away_team_id, false)).unwrap();

    assert_eq!(db.get_match(m.id).unwrap().score(), Some(Score::new(2, 1)));

    db.delete_goal(away.id).unwrap();
    assert_eq!(db.get_match(m.id).unwrap().score(), Some(Score::new(2, 0)));
    assert_eq!(db.goals_for(fixture).unwrap().len(), 2);
}

#[test]
fn test_second_yellow_becomes_red() {
    let mut db = create_test_db();
    let league = db.create_league("L").unwrap();
    let season = db.create_season(league.id, "S").unwrap();
    let t = create_teams(&mut db, 2);
    let mut rng = StdRng::seed_from_u64(4);
    db.replace_schedule(season.id, &double_round_robin(&t, &mut rng).unwrap())
        .unwrap();
    let matches = db.season_matches(season.id).unwrap();
    let player = db.create_player("Evra", None, Some(matches[0].home_team_id)).unwrap();

    let card = |fixture| NewCard {
        fixture,
        team_id: matches[0].home_team_id,
        player_id: player.id,
        color: CardColor::Yellow,
        minute: Some(30),
    };
    let first = db.record_card(&card(FixtureRef::League(matches[0].id))).unwrap();
    assert_eq!(first.color, CardColor::Yellow);

    let second = db.record_card(&card(FixtureRef::League(matches[0].id))).unwrap();
    assert_eq!(second.color, CardColor::Red);
    assert!(second.second_yellow);

    // A yellow in the return fixture starts over.
    let other = db.record_card(&card(FixtureRef::League(matches[1].id))).unwrap();
    assert_eq!(other.color, CardColor::Yellow);
    assert!(!other.second_yellow);
    assert_eq!(db.cards_for(FixtureRef::League(matches[0].id)).unwrap().len(), 2);
}

fn create_group_cup(db: &mut LeagueDatabase) -> GroupCup {
    db.create_group_cup(&NewGroupCup {
        name: "Coupe des poules".to_string(),
        team_count: 8,
        group_count: 2,
        qualifiers_per_group: 2,
        randomized: false,
        legs: 1,
        matches_per_tie: 1,
        victory_only: false,
    })
    .unwrap()
}

#[test]
fn test_create_group_cup_validates_layout() {
    let mut db = create_test_db();
    let result = db.create_group_cup(&NewGroupCup {
        name: "Bad".to_string(),
        team_count: 9,
        group_count: 2,
        qualifiers_per_group: 1,
        randomized: false,
        legs: 1,
        matches_per_tie: 1,
        victory_only: false,
    });
    assert!(matches!(result, Err(LeagueError::Validation { .. })));
}

#[test]
fn test_group_stage_store_and_finalize() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 8);
    let group_cup = create_group_cup(&mut db);
    db.set_group_cup_teams(group_cup.id, &t).unwrap();
    let mut rng = StdRng::seed_from_u64(9);

    let stage = plan_group_stage(&t, 2, 1, false, &mut rng).unwrap();
    let groups = db.replace_groups(group_cup.id, &stage).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "A");
    assert_eq!(db.group_teams(groups[0].id).unwrap().len(), 4);
    assert_eq!(db.group_matches(groups[1].id).unwrap().len(), 6);

    let rankings = vec![t[..4].to_vec(), t[4..].to_vec()];
    let draw = plan_knockout(&rankings, 2, TieFormat::Single, &mut rng).unwrap();
    let (cup, bracket, _) = db.finalize_group_cup(group_cup.id, &draw).unwrap();

    assert_eq!(cup.group_cup_id, Some(group_cup.id));
    assert_eq!(bracket.rounds[0].matches.len(), 4);
    assert_eq!(bracket.rounds[0].round.matches_per_tie, 2);

    let stored = db.get_group_cup(group_cup.id).unwrap();
    assert!(stored.finalized);
    assert_eq!(stored.knockout_cup_id, Some(cup.id));

    match db.finalize_group_cup(group_cup.id, &draw) {
        Err(LeagueError::Conflict { .. }) => (),
        other => panic!("Expected Conflict, got {:?}", other),
    }
    assert!(matches!(
        db.replace_groups(group_cup.id, &stage),
        Err(LeagueError::Conflict { .. })
    ));
    assert_eq!(db.list_cups().unwrap().len(), 1);
}

#[test]
fn test_group_results() {
    let mut db = create_test_db();
    let t = create_teams(&mut db, 8);
    let group_cup = create_group_cup(&mut db);
    let mut rng = StdRng::seed_from_u64(2);
    let stage = plan_group_stage(&t, 2, 1, false, &mut rng).unwrap();
    let groups = db.replace_groups(group_cup.id, &stage).unwrap();

    let m = db.group_matches(groups[0].id).unwrap()[0].clone();
    db.set_group_match_result(m.id, Some(Score::new(3, 2)), true)
        .unwrap();

    let results = db.group_results(groups[0].id).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].home, m.home_team_id);
    assert!(db.group_results(groups[1].id).unwrap().is_empty());
}

#[test]
fn test_deleting_player_keeps_goal() {
    let mut db = create_test_db();
    let league = db.create_league("L").unwrap();
    let season = db.create_season(league.id, "S").unwrap();
    let t = create_teams(&mut db, 2);
    let mut rng = StdRng::seed_from_u64(6);
    db.replace_schedule(season.id, &double_round_robin(&t, &mut rng).unwrap())
        .unwrap();
    let m = db.season_matches(season.id).unwrap()[0].clone();
    let player = db.create_player("Cantona", None, Some(m.home_team_id)).unwrap();
    db.record_goal(&NewGoal {
        fixture: FixtureRef::League(m.id),
        team_id: m.home_team_id,
        scorer_id: Some(player.id),
        assist_id: None,
        minute: Some(12),
        own_goal: false,
    })
    .unwrap();
    assert_eq!(db.season_scorer_entries(season.id).unwrap().len(), 1);

    db.delete_player(player.id).unwrap();
    let goals = db.goals_for(FixtureRef::League(m.id)).unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].scorer_id, None::<PlayerId>);
    assert!(db.season_scorer_entries(season.id).unwrap().is_empty());
}
