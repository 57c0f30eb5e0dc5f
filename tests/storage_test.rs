//! Integration tests for storage functionality

use chrono::NaiveDate;
use league_manager::{
    storage::*,
    tournament::{bracket::plan_bracket, schedule::double_round_robin, TieFormat},
    LeagueError, Score, TeamId,
};
use rand::{rngs::StdRng, SeedableRng};

fn create_test_db() -> LeagueDatabase {
    LeagueDatabase::new_in_memory().unwrap()
}

fn create_teams(db: &mut LeagueDatabase, names: &[&str]) -> Vec<TeamId> {
    names
        .iter()
        .map(|name| db.create_team(name).unwrap().id)
        .collect()
}

#[test]
fn test_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("league.db");

    let (season_id, match_id) = {
        let mut db = LeagueDatabase::new(&path).unwrap();
        let league = db.create_league("National").unwrap();
        let season = db.create_season(league.id, "2023").unwrap();
        let teams = create_teams(&mut db, &["Sedan", "Reims"]);
        let mut rng = StdRng::seed_from_u64(11);
        db.replace_schedule(season.id, &double_round_robin(&teams, &mut rng).unwrap())
            .unwrap();
        let m = db.season_matches(season.id).unwrap()[0].clone();
        db.set_match_result(m.id, Some(Score::new(2, 2)), true)
            .unwrap();
        (season.id, m.id)
    };

    let db = LeagueDatabase::new(&path).unwrap();
    assert_eq!(db.season_matches(season_id).unwrap().len(), 2);
    let m = db.get_match(match_id).unwrap();
    assert_eq!(m.score(), Some(Score::new(2, 2)));
    assert!(m.terminated);
}

#[test]
fn test_deleting_league_removes_seasons() {
    let mut db = create_test_db();
    let league = db.create_league("Ligue 2").unwrap();
    let season = db.create_season(league.id, "2024").unwrap();

    db.delete_league(league.id).unwrap();
    assert!(matches!(
        db.get_season(season.id),
        Err(LeagueError::NotFound { .. })
    ));
    assert!(db.list_leagues().unwrap().is_empty());
}

#[test]
fn test_deleting_cup_removes_bracket() {
    let mut db = create_test_db();
    let teams = create_teams(&mut db, &["Brest", "Lorient", "Vannes", "Guingamp"]);
    let cup = db
        .create_cup(&NewCup {
            name: "Coupe de Bretagne".to_string(),
            model_id: None,
            matches_per_tie: 1,
            victory_only: false,
            randomized: false,
        })
        .unwrap();
    let (bracket, _) = db
        .replace_bracket(cup.id, &plan_bracket(&teams, TieFormat::Single, None).unwrap())
        .unwrap();
    let match_id = bracket.rounds[0].matches[0].id;

    db.delete_cup(cup.id).unwrap();
    assert!(matches!(
        db.get_knockout_match(match_id),
        Err(LeagueError::NotFound { .. })
    ));
}

#[test]
fn test_cup_models() {
    let mut db = create_test_db();
    let model = db
        .create_cup_model("Coupe Gambardella", Some("gambardella.png"))
        .unwrap();
    let cup = db
        .create_cup(&NewCup {
            name: "Gambardella 2024".to_string(),
            model_id: Some(model.id),
            matches_per_tie: 1,
            victory_only: false,
            randomized: true,
        })
        .unwrap();

    assert_eq!(db.get_cup(cup.id).unwrap().model_id, Some(model.id));
    assert_eq!(db.list_cup_models().unwrap().len(), 1);

    // The cup survives its model.
    db.delete_cup_model(model.id).unwrap();
    assert_eq!(db.get_cup(cup.id).unwrap().model_id, None);
}

#[test]
fn test_players_by_team() {
    let mut db = create_test_db();
    let teams = create_teams(&mut db, &["Monaco", "Nice"]);
    db.create_player("Ben Yedder", Some("FW"), Some(teams[0]))
        .unwrap();
    db.create_player("Golovin", Some("MF"), Some(teams[0]))
        .unwrap();
    let free = db.create_player("Free Agent", None, None).unwrap();

    assert_eq!(db.list_players(Some(teams[0])).unwrap().len(), 2);
    assert!(db.list_players(Some(teams[1])).unwrap().is_empty());
    assert_eq!(db.list_players(None).unwrap().len(), 3);

    let date = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    db.record_transfer(free.id, None, teams[1], date).unwrap();
    assert_eq!(db.list_players(Some(teams[1])).unwrap().len(), 1);
    assert_eq!(db.list_transfers(free.id).unwrap()[0].from_team_id, None);
}

#[test]
fn test_rival_cleared_when_team_deleted() {
    let mut db = create_test_db();
    let teams = create_teams(&mut db, &["Saint-Étienne", "Lyon"]);
    db.set_rival(teams[0], teams[1]).unwrap();

    db.delete_team(teams[1]).unwrap();
    assert_eq!(db.get_team(teams[0]).unwrap().rival_id, None);
}

#[test]
fn test_group_match_events() {
    let mut db = create_test_db();
    let teams = create_teams(&mut db, &["Ajaccio", "Bastia", "Nîmes", "Sète"]);
    let group_cup = db
        .create_group_cup(&NewGroupCup {
            name: "Coupe du Sud".to_string(),
            team_count: 4,
            group_count: 2,
            qualifiers_per_group: 1,
            randomized: false,
            legs: 2,
            matches_per_tie: 1,
            victory_only: false,
        })
        .unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let stage =
        league_manager::tournament::plan_group_stage(&teams, 2, 2, false, &mut rng).unwrap();
    let groups = db.replace_groups(group_cup.id, &stage).unwrap();

    let matches = db.group_matches(groups[0].id).unwrap();
    assert_eq!(matches.len(), 2);
    let fixture = FixtureRef::Group(matches[0].id);
    db.record_goal(&NewGoal {
        fixture,
        team_id: matches[0].away_team_id,
        scorer_id: None,
        assist_id: None,
        minute: Some(88),
        own_goal: false,
    })
    .unwrap();

    let m = db.get_group_match(matches[0].id).unwrap();
    assert_eq!(m.score(), Some(Score::new(0, 1)));
    assert!(!m.terminated);
}
