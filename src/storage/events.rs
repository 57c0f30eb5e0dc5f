//! Goals and cards for league, cup and group fixtures

use super::{
    cups::{cup_of_match, fetch_knockout_match, recalculate_in},
    groups::fetch_group_match,
    models::*,
    schema::LeagueDatabase,
    seasons::fetch_match,
    teams::fetch_player,
};
use crate::{
    error::{LeagueError, Result},
    tournament::standings::ScorerEntry,
    CardId, CupId, GoalId, SeasonId, TeamId,
};
use log::{debug, info};
use rusqlite::{
    params,
    types::Type,
    Connection, OptionalExtension, Row,
};

const GOAL_COLUMNS: &str = "id, match_id, knockout_match_id, group_match_id, team_id, scorer_id,
     assist_id, minute, own_goal";

const CARD_COLUMNS: &str = "id, match_id, knockout_match_id, group_match_id, team_id, player_id,
     color, minute, second_yellow";

/// Column and id identifying a fixture in the goals and cards tables.
fn fixture_key(fixture: FixtureRef) -> (&'static str, i64) {
    match fixture {
        FixtureRef::League(id) => ("match_id", id.as_i64()),
        FixtureRef::Knockout(id) => ("knockout_match_id", id.as_i64()),
        FixtureRef::Group(id) => ("group_match_id", id.as_i64()),
    }
}

fn fixture_table(fixture: FixtureRef) -> &'static str {
    match fixture {
        FixtureRef::League(_) => "matches",
        FixtureRef::Knockout(_) => "knockout_matches",
        FixtureRef::Group(_) => "group_matches",
    }
}

fn fixture_from_row(row: &Row) -> rusqlite::Result<FixtureRef> {
    if let Some(id) = row.get("match_id")? {
        return Ok(FixtureRef::League(id));
    }
    if let Some(id) = row.get("knockout_match_id")? {
        return Ok(FixtureRef::Knockout(id));
    }
    if let Some(id) = row.get("group_match_id")? {
        return Ok(FixtureRef::Group(id));
    }
    Err(rusqlite::Error::FromSqlConversionFailure(
        1,
        Type::Null,
        Box::new(LeagueError::invariant("match event without a fixture")),
    ))
}

fn row_to_goal(row: &Row) -> rusqlite::Result<Goal> {
    Ok(Goal {
        id: row.get("id")?,
        fixture: fixture_from_row(row)?,
        team_id: row.get("team_id")?,
        scorer_id: row.get("scorer_id")?,
        assist_id: row.get("assist_id")?,
        minute: row.get("minute")?,
        own_goal: row.get("own_goal")?,
    })
}

fn row_to_card(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get("id")?,
        fixture: fixture_from_row(row)?,
        team_id: row.get("team_id")?,
        player_id: row.get("player_id")?,
        color: row.get("color")?,
        minute: row.get("minute")?,
        second_yellow: row.get("second_yellow")?,
    })
}

/// Home and away teams of a fixture. Walkovers take no events.
fn fixture_teams(conn: &Connection, fixture: FixtureRef) -> Result<(TeamId, TeamId)> {
    match fixture {
        FixtureRef::League(id) => {
            let m = fetch_match(conn, id)?;
            Ok((m.home_team_id, m.away_team_id))
        }
        FixtureRef::Group(id) => {
            let m = fetch_group_match(conn, id)?;
            Ok((m.home_team_id, m.away_team_id))
        }
        FixtureRef::Knockout(id) => {
            let m = fetch_knockout_match(conn, id)?;
            match (m.home_team_id, m.away_team_id, m.is_fake) {
                (Some(home), Some(away), false) => Ok((home, away)),
                _ => Err(LeagueError::validation(format!(
                    "{} is not a playable match",
                    fixture
                ))),
            }
        }
    }
}

fn ensure_team_plays(conn: &Connection, fixture: FixtureRef, team_id: TeamId) -> Result<()> {
    let (home, away) = fixture_teams(conn, fixture)?;
    if team_id != home && team_id != away {
        return Err(LeagueError::validation(format!(
            "team {} does not play in {}",
            team_id, fixture
        )));
    }
    Ok(())
}

/// Recount a fixture's score from its goals. Cup fixtures then re-run the cup's progression.
fn refresh_score(conn: &Connection, fixture: FixtureRef) -> Result<()> {
    let (home, away) = fixture_teams(conn, fixture)?;
    let (column, id) = fixture_key(fixture);
    let count = |team: TeamId| -> Result<u32> {
        Ok(conn.query_row(
            &format!("SELECT COUNT(*) FROM goals WHERE {} = ? AND team_id = ?", column),
            params![id, team],
            |row| row.get(0),
        )?)
    };
    let (home_goals, away_goals) = (count(home)?, count(away)?);

    conn.execute(
        &format!(
            "UPDATE {} SET home_score = ?, away_score = ? WHERE id = ?",
            fixture_table(fixture)
        ),
        params![home_goals, away_goals, id],
    )?;
    debug!("{}: score now {}-{}", fixture, home_goals, away_goals);

    if let FixtureRef::Knockout(match_id) = fixture {
        recalculate_in(conn, cup_of_match(conn, match_id)?)?;
    }
    Ok(())
}

fn fetch_goal(conn: &Connection, id: GoalId) -> Result<Goal> {
    conn.query_row(
        &format!("SELECT {} FROM goals WHERE id = ?", GOAL_COLUMNS),
        [id],
        row_to_goal,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("goal", id.as_i64()))
}

fn fetch_card(conn: &Connection, id: CardId) -> Result<Card> {
    conn.query_row(
        &format!("SELECT {} FROM cards WHERE id = ?", CARD_COLUMNS),
        [id],
        row_to_card,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("card", id.as_i64()))
}

impl LeagueDatabase {
    /// Record a goal and recount the fixture's score.
    pub fn record_goal(&mut self, goal: &NewGoal) -> Result<Goal> {
        let tx = self.conn.transaction()?;
        ensure_team_plays(&tx, goal.fixture, goal.team_id)?;
        for player in [goal.scorer_id, goal.assist_id].into_iter().flatten() {
            fetch_player(&tx, player)?;
        }

        let (league_id, knockout_id, group_id) = match goal.fixture {
            FixtureRef::League(id) => (Some(id), None, None),
            FixtureRef::Knockout(id) => (None, Some(id), None),
            FixtureRef::Group(id) => (None, None, Some(id)),
        };
        tx.execute(
            "INSERT INTO goals
             (match_id, knockout_match_id, group_match_id, team_id, scorer_id, assist_id,
              minute, own_goal)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                league_id,
                knockout_id,
                group_id,
                goal.team_id,
                goal.scorer_id,
                goal.assist_id,
                goal.minute,
                goal.own_goal
            ],
        )?;
        let id = GoalId::new(tx.last_insert_rowid());
        refresh_score(&tx, goal.fixture)?;
        let stored = fetch_goal(&tx, id)?;
        tx.commit()?;
        Ok(stored)
    }

    /// Remove a goal and recount the fixture's score.
    pub fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        let tx = self.conn.transaction()?;
        let goal = fetch_goal(&tx, id)?;
        tx.execute("DELETE FROM goals WHERE id = ?", [id])?;
        refresh_score(&tx, goal.fixture)?;
        tx.commit()?;
        Ok(())
    }

    pub fn goals_for(&self, fixture: FixtureRef) -> Result<Vec<Goal>> {
        let (column, id) = fixture_key(fixture);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM goals WHERE {} = ? ORDER BY minute IS NULL, minute, id",
            GOAL_COLUMNS, column
        ))?;
        let rows = stmt.query_map([id], row_to_goal)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Record a card. A player's second yellow in the same fixture is stored as a red.
    pub fn record_card(&mut self, card: &NewCard) -> Result<Card> {
        let tx = self.conn.transaction()?;
        ensure_team_plays(&tx, card.fixture, card.team_id)?;
        fetch_player(&tx, card.player_id)?;

        let (column, fixture_id) = fixture_key(card.fixture);
        let (color, second_yellow) = match card.color {
            CardColor::Yellow => {
                let yellows: u32 = tx.query_row(
                    &format!(
                        "SELECT COUNT(*) FROM cards WHERE {} = ? AND player_id = ? AND color = ?",
                        column
                    ),
                    params![fixture_id, card.player_id, CardColor::Yellow],
                    |row| row.get(0),
                )?;
                if yellows > 0 {
                    info!(
                        "player {}: second yellow in {}, shown red",
                        card.player_id, card.fixture
                    );
                    (CardColor::Red, true)
                } else {
                    (CardColor::Yellow, false)
                }
            }
            CardColor::Red => (CardColor::Red, false),
        };

        let (league_id, knockout_id, group_id) = match card.fixture {
            FixtureRef::League(id) => (Some(id), None, None),
            FixtureRef::Knockout(id) => (None, Some(id), None),
            FixtureRef::Group(id) => (None, None, Some(id)),
        };
        tx.execute(
            "INSERT INTO cards
             (match_id, knockout_match_id, group_match_id, team_id, player_id, color, minute,
              second_yellow)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                league_id,
                knockout_id,
                group_id,
                card.team_id,
                card.player_id,
                color,
                card.minute,
                second_yellow
            ],
        )?;
        let stored = fetch_card(&tx, CardId::new(tx.last_insert_rowid()))?;
        tx.commit()?;
        Ok(stored)
    }

    pub fn delete_card(&mut self, id: CardId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM cards WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("card", id.as_i64()));
        }
        Ok(())
    }

    pub fn cards_for(&self, fixture: FixtureRef) -> Result<Vec<Card>> {
        let (column, id) = fixture_key(fixture);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM cards WHERE {} = ? ORDER BY minute IS NULL, minute, id",
            CARD_COLUMNS, column
        ))?;
        let rows = stmt.query_map([id], row_to_card)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Credited goals scored in a season's league matches.
    pub fn season_scorer_entries(&self, season_id: SeasonId) -> Result<Vec<ScorerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, g.own_goal FROM goals g
             JOIN players p ON p.id = g.scorer_id
             JOIN matches m ON m.id = g.match_id
             JOIN matchdays md ON md.id = m.matchday_id
             WHERE md.season_id = ?",
        )?;
        let rows = stmt.query_map([season_id], |row| {
            Ok(ScorerEntry {
                player_id: row.get(0)?,
                player_name: row.get(1)?,
                own_goal: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Credited goals scored in a cup, walkovers excluded.
    pub fn cup_scorer_entries(&self, cup_id: CupId) -> Result<Vec<ScorerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, g.own_goal FROM goals g
             JOIN players p ON p.id = g.scorer_id
             JOIN knockout_matches km ON km.id = g.knockout_match_id
             JOIN rounds r ON r.id = km.round_id
             WHERE r.cup_id = ? AND km.is_fake = 0",
        )?;
        let rows = stmt.query_map([cup_id], |row| {
            Ok(ScorerEntry {
                player_id: row.get(0)?,
                player_name: row.get(1)?,
                own_goal: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
