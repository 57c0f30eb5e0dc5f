//! Seasons, their teams, schedules and league matches

use super::{models::*, schema::LeagueDatabase, teams::fetch_team};
use crate::{
    error::{LeagueError, Result},
    tournament::{schedule::MatchdayPlan, standings::MatchOutcome},
    types::score::Score,
    LeagueId, MatchId, MatchdayId, PlayerId, SeasonId, TeamId,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const MATCH_COLUMNS: &str = "m.id, m.matchday_id, m.home_team_id, m.away_team_id, m.home_score,
     m.away_score, m.terminated, m.home_goalkeeper_id, m.away_goalkeeper_id, m.home_saves,
     m.away_saves";

fn row_to_season(row: &Row) -> rusqlite::Result<Season> {
    Ok(Season {
        id: row.get("id")?,
        league_id: row.get("league_id")?,
        name: row.get("name")?,
        status: row.get("status")?,
    })
}

pub(crate) fn row_to_match(row: &Row) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get("id")?,
        matchday_id: row.get("matchday_id")?,
        home_team_id: row.get("home_team_id")?,
        away_team_id: row.get("away_team_id")?,
        home_score: row.get("home_score")?,
        away_score: row.get("away_score")?,
        terminated: row.get("terminated")?,
        home_goalkeeper_id: row.get("home_goalkeeper_id")?,
        away_goalkeeper_id: row.get("away_goalkeeper_id")?,
        home_saves: row.get("home_saves")?,
        away_saves: row.get("away_saves")?,
    })
}

fn fetch_season(conn: &Connection, id: SeasonId) -> Result<Season> {
    conn.query_row(
        "SELECT id, league_id, name, status FROM seasons WHERE id = ?",
        [id],
        row_to_season,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("season", id.as_i64()))
}

pub(crate) fn fetch_match(conn: &Connection, id: MatchId) -> Result<Match> {
    conn.query_row(
        &format!("SELECT {} FROM matches m WHERE m.id = ?", MATCH_COLUMNS),
        [id],
        row_to_match,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("match", id.as_i64()))
}

fn ensure_league(conn: &Connection, league_id: LeagueId) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM leagues WHERE id = ?", [league_id], |row| {
            row.get(0)
        })
        .optional()?;
    exists
        .map(|_| ())
        .ok_or_else(|| LeagueError::not_found("league", league_id.as_i64()))
}

/// Reject a second in-progress season in the same league.
fn ensure_no_season_in_progress(
    conn: &Connection,
    league_id: LeagueId,
    except: Option<SeasonId>,
) -> Result<()> {
    let running: Option<SeasonId> = conn
        .query_row(
            "SELECT id FROM seasons
             WHERE league_id = ?1 AND status = ?2 AND (?3 IS NULL OR id <> ?3)
             LIMIT 1",
            params![league_id, SeasonStatus::InProgress, except],
            |row| row.get(0),
        )
        .optional()?;
    match running {
        Some(other) => Err(LeagueError::conflict(format!(
            "league {} already has season {} in progress",
            league_id, other
        ))),
        None => Ok(()),
    }
}

impl LeagueDatabase {
    /// Start a new season. A league has at most one season in progress.
    pub fn create_season(&mut self, league_id: LeagueId, name: &str) -> Result<Season> {
        let tx = self.conn.transaction()?;
        ensure_league(&tx, league_id)?;
        ensure_no_season_in_progress(&tx, league_id, None)?;
        tx.execute(
            "INSERT INTO seasons (league_id, name, status) VALUES (?, ?, ?)",
            params![league_id, name, SeasonStatus::InProgress],
        )?;
        let season = Season {
            id: SeasonId::new(tx.last_insert_rowid()),
            league_id,
            name: name.to_string(),
            status: SeasonStatus::InProgress,
        };
        tx.commit()?;
        Ok(season)
    }

    pub fn get_season(&self, id: SeasonId) -> Result<Season> {
        fetch_season(&self.conn, id)
    }

    pub fn list_seasons(&self, league_id: LeagueId) -> Result<Vec<Season>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, league_id, name, status FROM seasons WHERE league_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map([league_id], row_to_season)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn finish_season(&mut self, id: SeasonId) -> Result<Season> {
        fetch_season(&self.conn, id)?;
        self.conn.execute(
            "UPDATE seasons SET status = ? WHERE id = ?",
            params![SeasonStatus::Finished, id],
        )?;
        self.get_season(id)
    }

    /// Put a finished season back in progress, unless another one already is.
    pub fn reopen_season(&mut self, id: SeasonId) -> Result<Season> {
        let tx = self.conn.transaction()?;
        let season = fetch_season(&tx, id)?;
        ensure_no_season_in_progress(&tx, season.league_id, Some(id))?;
        tx.execute(
            "UPDATE seasons SET status = ? WHERE id = ?",
            params![SeasonStatus::InProgress, id],
        )?;
        let season = fetch_season(&tx, id)?;
        tx.commit()?;
        Ok(season)
    }

    pub fn delete_season(&mut self, id: SeasonId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM seasons WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("season", id.as_i64()));
        }
        Ok(())
    }

    /// Replace the season's team list; the order given is the seed order.
    pub fn set_season_teams(&mut self, season_id: SeasonId, teams: &[TeamId]) -> Result<()> {
        let tx = self.conn.transaction()?;
        fetch_season(&tx, season_id)?;
        tx.execute("DELETE FROM season_teams WHERE season_id = ?", [season_id])?;
        for (seed, team_id) in teams.iter().enumerate() {
            fetch_team(&tx, *team_id)?;
            tx.execute(
                "INSERT INTO season_teams (season_id, team_id, seed) VALUES (?, ?, ?)",
                params![season_id, team_id, seed as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// The season's teams in seed order.
    pub fn season_teams(&self, season_id: SeasonId) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.rival_id FROM teams t
             JOIN season_teams st ON st.team_id = t.id
             WHERE st.season_id = ?
             ORDER BY st.seed",
        )?;
        let rows = stmt.query_map([season_id], super::teams::row_to_team)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete the season's matchdays (with their matches and events) and store a new schedule.
    pub fn replace_schedule(
        &mut self,
        season_id: SeasonId,
        plans: &[MatchdayPlan],
    ) -> Result<Vec<Matchday>> {
        let tx = self.conn.transaction()?;
        fetch_season(&tx, season_id)?;
        let removed = tx.execute("DELETE FROM matchdays WHERE season_id = ?", [season_id])?;

        let mut matchdays = Vec::with_capacity(plans.len());
        for plan in plans {
            tx.execute(
                "INSERT INTO matchdays (season_id, number) VALUES (?, ?)",
                params![season_id, plan.number],
            )?;
            let matchday = Matchday {
                id: MatchdayId::new(tx.last_insert_rowid()),
                season_id,
                number: plan.number,
            };
            for pairing in &plan.pairings {
                tx.execute(
                    "INSERT INTO matches (matchday_id, home_team_id, away_team_id) VALUES (?, ?, ?)",
                    params![matchday.id, pairing.home, pairing.away],
                )?;
            }
            matchdays.push(matchday);
        }
        tx.commit()?;

        info!(
            "season {}: replaced {} matchdays with {}",
            season_id,
            removed,
            matchdays.len()
        );
        Ok(matchdays)
    }

    pub fn matchdays(&self, season_id: SeasonId) -> Result<Vec<Matchday>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, season_id, number FROM matchdays WHERE season_id = ? ORDER BY number",
        )?;
        let rows = stmt.query_map([season_id], |row| {
            Ok(Matchday {
                id: row.get(0)?,
                season_id: row.get(1)?,
                number: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn matches_for_matchday(&self, matchday_id: MatchdayId) -> Result<Vec<Match>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches m WHERE m.matchday_id = ? ORDER BY m.id",
            MATCH_COLUMNS
        ))?;
        let rows = stmt.query_map([matchday_id], row_to_match)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every match of the season, by matchday.
    pub fn season_matches(&self, season_id: SeasonId) -> Result<Vec<Match>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM matches m
             JOIN matchdays md ON md.id = m.matchday_id
             WHERE md.season_id = ?
             ORDER BY md.number, m.id",
            MATCH_COLUMNS
        ))?;
        let rows = stmt.query_map([season_id], row_to_match)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_match(&self, id: MatchId) -> Result<Match> {
        fetch_match(&self.conn, id)
    }

    /// Set a league match's score directly.
    pub fn set_match_result(
        &mut self,
        id: MatchId,
        score: Option<Score>,
        terminated: bool,
    ) -> Result<Match> {
        let updated = self.conn.execute(
            "UPDATE matches SET home_score = ?, away_score = ?, terminated = ? WHERE id = ?",
            params![
                score.map(|s| s.home),
                score.map(|s| s.away),
                terminated,
                id
            ],
        )?;
        if updated == 0 {
            return Err(LeagueError::not_found("match", id.as_i64()));
        }
        self.get_match(id)
    }

    /// Record the goalkeeper and saves for one side of a league match.
    pub fn set_goalkeeping(
        &mut self,
        id: MatchId,
        venue: Venue,
        goalkeeper_id: Option<PlayerId>,
        saves: Option<u32>,
    ) -> Result<Match> {
        if let Some(player) = goalkeeper_id {
            super::teams::fetch_player(&self.conn, player)?;
        }
        let sql = match venue {
            Venue::Home => "UPDATE matches SET home_goalkeeper_id = ?, home_saves = ? WHERE id = ?",
            Venue::Away => "UPDATE matches SET away_goalkeeper_id = ?, away_saves = ? WHERE id = ?",
        };
        let updated = self.conn.execute(sql, params![goalkeeper_id, saves, id])?;
        if updated == 0 {
            return Err(LeagueError::not_found("match", id.as_i64()));
        }
        self.get_match(id)
    }

    /// Terminated, scored matches of the season, for the table.
    pub fn season_results(&self, season_id: SeasonId) -> Result<Vec<MatchOutcome>> {
        Ok(self
            .season_matches(season_id)?
            .into_iter()
            .filter(|m| m.terminated)
            .filter_map(|m| {
                m.score().map(|score| MatchOutcome {
                    home: m.home_team_id,
                    away: m.away_team_id,
                    score,
                })
            })
            .collect())
    }
}
