//! Unit tests for standings and scorer tallies

use super::*;

fn team(id: i64, name: &str) -> (TeamId, String) {
    (TeamId::new(id), name.to_string())
}

fn result(home: i64, away: i64, h: u32, a: u32) -> MatchOutcome {
    MatchOutcome {
        home: TeamId::new(home),
        away: TeamId::new(away),
        score: Score::new(h, a),
    }
}

fn goal(player: i64, name: &str, own_goal: bool) -> ScorerEntry {
    ScorerEntry {
        player_id: PlayerId::new(player),
        player_name: name.to_string(),
        own_goal,
    }
}

#[test]
fn test_points_and_counts() {
    let teams = vec![team(1, "Lyon"), team(2, "Nantes")];
    let rows = compute_standings(&teams, &[result(1, 2, 3, 1), result(2, 1, 2, 2)]);

    let lyon = &rows[0];
    assert_eq!(lyon.team_name, "Lyon");
    assert_eq!((lyon.played, lyon.won, lyon.drawn, lyon.lost), (2, 1, 1, 0));
    assert_eq!((lyon.goals_for, lyon.goals_against), (5, 3));
    assert_eq!(lyon.goal_difference(), 2);
    assert_eq!(lyon.points, 4);

    let nantes = &rows[1];
    assert_eq!(nantes.points, 1);
    assert_eq!(nantes.goal_difference(), -2);
}

#[test]
fn test_cyclic_results_fall_back_to_name() {
    // Each team wins once 1-0 and loses once 0-1: identical points, difference and goals.
    let teams = vec![team(1, "Rennes"), team(2, "Angers"), team(3, "Metz")];
    let results = [result(1, 2, 1, 0), result(2, 3, 1, 0), result(3, 1, 1, 0)];
    let rows = compute_standings(&teams, &results);

    let names: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
    assert_eq!(names, vec!["Angers", "Metz", "Rennes"]);
    assert!(rows.iter().all(|r| r.points == 3));
}

#[test]
fn test_tiebreak_order() {
    let teams = vec![team(1, "A"), team(2, "B"), team(3, "C"), team(4, "D")];
    let results = [
        result(2, 1, 1, 0),
        result(3, 4, 3, 0),
        result(1, 4, 4, 2),
        result(4, 2, 3, 1),
        result(1, 3, 3, 3),
    ];
    let rows = compute_standings(&teams, &results);
    let order: Vec<i64> = rows.iter().map(|r| r.team_id.as_i64()).collect();

    // C 4 pts (+3), A 4 pts (+1), B 3 pts (-1), D 3 pts (-3)
    assert_eq!(order, vec![3, 1, 2, 4]);

    // Same points and difference: more goals scored wins.
    let teams = vec![team(1, "A"), team(2, "B"), team(3, "C")];
    let results = [result(1, 3, 3, 2), result(2, 3, 1, 0)];
    let rows = compute_standings(&teams, &results);
    assert_eq!(rows[0].team_id, TeamId::new(1));
    assert_eq!(rows[1].team_id, TeamId::new(2));
}

#[test]
fn test_teams_without_matches_still_listed() {
    let teams = vec![team(1, "Brest"), team(2, "Auxerre")];
    let rows = compute_standings(&teams, &[]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].team_name, "Auxerre");
    assert!(rows.iter().all(|r| r.played == 0));
}

#[test]
fn test_results_outside_the_table_are_ignored() {
    let teams = vec![team(1, "Lens"), team(2, "Lille")];
    let rows = compute_standings(&teams, &[result(1, 9, 5, 0), result(1, 2, 0, 1)]);
    assert_eq!(rows[0].team_name, "Lille");
    assert_eq!(rows[1].played, 1);
    assert_eq!(rows[1].goals_for, 0);
}

#[test]
fn test_top_scorers() {
    let goals = [
        goal(1, "Mbappe", false),
        goal(2, "Giroud", false),
        goal(1, "Mbappe", false),
        goal(3, "Varane", true),
        goal(4, "Benzema", false),
    ];
    let tally = top_scorers(&goals);

    assert_eq!(tally.len(), 3);
    assert_eq!(tally[0].player_name, "Mbappe");
    assert_eq!(tally[0].goals, 2);
    assert_eq!(tally[1].player_name, "Benzema");
    assert_eq!(tally[2].player_name, "Giroud");
}
