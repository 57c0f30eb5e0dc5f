//! Cups, cup models, rounds and knockout matches

use super::{models::*, schema::LeagueDatabase, teams::fetch_team};
use crate::{
    error::{LeagueError, Result},
    tournament::{
        bracket::{tie_matches, BracketPlan},
        progression::{recalculate, Bracket, BracketRound, ProgressionReport},
        tie::TieFormat,
    },
    types::score::Score,
    CupId, CupModelId, GroupCupId, KnockoutMatchId, RoundId, TeamId,
};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CUP_COLUMNS: &str =
    "id, name, model_id, matches_per_tie, victory_only, randomized, group_cup_id";

const KNOCKOUT_COLUMNS: &str = "km.id, km.round_id, km.home_team_id, km.away_team_id,
     km.home_score, km.away_score, km.home_penalties, km.away_penalties, km.home_aggregate,
     km.away_aggregate, km.terminated, km.is_first_leg, km.return_match_id, km.series_number,
     km.is_fake";

fn row_to_cup(row: &Row) -> rusqlite::Result<Cup> {
    Ok(Cup {
        id: row.get("id")?,
        name: row.get("name")?,
        model_id: row.get("model_id")?,
        matches_per_tie: row.get("matches_per_tie")?,
        victory_only: row.get("victory_only")?,
        randomized: row.get("randomized")?,
        group_cup_id: row.get("group_cup_id")?,
    })
}

fn row_to_round(row: &Row) -> rusqlite::Result<Round> {
    Ok(Round {
        id: row.get("id")?,
        cup_id: row.get("cup_id")?,
        number: row.get("number")?,
        label: row.get("label")?,
        matches_per_tie: row.get("matches_per_tie")?,
    })
}

pub(crate) fn row_to_knockout_match(row: &Row) -> rusqlite::Result<KnockoutMatch> {
    Ok(KnockoutMatch {
        id: row.get("id")?,
        round_id: row.get("round_id")?,
        home_team_id: row.get("home_team_id")?,
        away_team_id: row.get("away_team_id")?,
        home_score: row.get("home_score")?,
        away_score: row.get("away_score")?,
        home_penalties: row.get("home_penalties")?,
        away_penalties: row.get("away_penalties")?,
        home_aggregate: row.get("home_aggregate")?,
        away_aggregate: row.get("away_aggregate")?,
        terminated: row.get("terminated")?,
        is_first_leg: row.get("is_first_leg")?,
        return_match_id: row.get("return_match_id")?,
        series_number: row.get("series_number")?,
        is_fake: row.get("is_fake")?,
    })
}

pub(crate) fn fetch_cup(conn: &Connection, id: CupId) -> Result<Cup> {
    conn.query_row(
        &format!("SELECT {} FROM cups WHERE id = ?", CUP_COLUMNS),
        [id],
        row_to_cup,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("cup", id.as_i64()))
}

pub(crate) fn fetch_knockout_match(conn: &Connection, id: KnockoutMatchId) -> Result<KnockoutMatch> {
    conn.query_row(
        &format!("SELECT {} FROM knockout_matches km WHERE km.id = ?", KNOCKOUT_COLUMNS),
        [id],
        row_to_knockout_match,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("cup match", id.as_i64()))
}

/// The cup a knockout match belongs to.
pub(crate) fn cup_of_match(conn: &Connection, id: KnockoutMatchId) -> Result<CupId> {
    conn.query_row(
        "SELECT r.cup_id FROM knockout_matches km
         JOIN rounds r ON r.id = km.round_id
         WHERE km.id = ?",
        [id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("cup match", id.as_i64()))
}

pub(crate) fn insert_cup(
    conn: &Connection,
    cup: &NewCup,
    group_cup_id: Option<GroupCupId>,
) -> Result<Cup> {
    TieFormat::from_matches_per_tie(cup.matches_per_tie)?;
    if let Some(model_id) = cup.model_id {
        fetch_cup_model(conn, model_id)?;
    }
    conn.execute(
        "INSERT INTO cups (name, model_id, matches_per_tie, victory_only, randomized, group_cup_id)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            cup.name,
            cup.model_id,
            cup.matches_per_tie,
            cup.victory_only,
            cup.randomized,
            group_cup_id
        ],
    )?;
    Ok(Cup {
        id: CupId::new(conn.last_insert_rowid()),
        name: cup.name.clone(),
        model_id: cup.model_id,
        matches_per_tie: cup.matches_per_tie,
        victory_only: cup.victory_only,
        randomized: cup.randomized,
        group_cup_id,
    })
}

pub(crate) fn insert_cup_teams(conn: &Connection, cup_id: CupId, teams: &[TeamId]) -> Result<()> {
    conn.execute("DELETE FROM cup_teams WHERE cup_id = ?", [cup_id])?;
    for (seed, team_id) in teams.iter().enumerate() {
        fetch_team(conn, *team_id)?;
        conn.execute(
            "INSERT INTO cup_teams (cup_id, team_id, seed) VALUES (?, ?, ?)",
            params![cup_id, team_id, seed as i64],
        )?;
    }
    Ok(())
}

fn fetch_cup_model(conn: &Connection, id: CupModelId) -> Result<CupModel> {
    conn.query_row(
        "SELECT id, name, logo FROM cup_models WHERE id = ?",
        [id],
        |row| {
            Ok(CupModel {
                id: row.get(0)?,
                name: row.get(1)?,
                logo: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("cup model", id.as_i64()))
}

/// Drop the cup's rounds (and with them every match, goal and card) and insert `plan`.
pub(crate) fn insert_bracket(conn: &Connection, cup_id: CupId, plan: &BracketPlan) -> Result<()> {
    let removed = conn.execute("DELETE FROM rounds WHERE cup_id = ?", [cup_id])?;
    if removed > 0 {
        debug!("cup {}: removed {} existing rounds", cup_id, removed);
    }

    for round in &plan.rounds {
        conn.execute(
            "INSERT INTO rounds (cup_id, number, label, matches_per_tie) VALUES (?, ?, ?, ?)",
            params![
                cup_id,
                round.number,
                round.label,
                round.format.matches_per_tie()
            ],
        )?;
        let round_id = RoundId::new(conn.last_insert_rowid());

        for tie in &round.ties {
            let mut ids = Vec::with_capacity(round.format.matches_per_tie() as usize);
            for m in tie_matches(round.format, tie) {
                conn.execute(
                    "INSERT INTO knockout_matches
                     (round_id, home_team_id, away_team_id, is_first_leg, series_number)
                     VALUES (?, ?, ?, ?, ?)",
                    params![round_id, m.home, m.away, m.is_first_leg, m.series_number],
                )?;
                ids.push(KnockoutMatchId::new(conn.last_insert_rowid()));
            }
            if let (TieFormat::TwoLeg, [first, second]) = (round.format, ids.as_slice()) {
                conn.execute(
                    "UPDATE knockout_matches SET return_match_id = ? WHERE id = ?",
                    params![second, first],
                )?;
                conn.execute(
                    "UPDATE knockout_matches SET return_match_id = ? WHERE id = ?",
                    params![first, second],
                )?;
            }
        }
    }
    Ok(())
}

pub(crate) fn load_bracket_in(conn: &Connection, cup_id: CupId) -> Result<Bracket> {
    let cup = fetch_cup(conn, cup_id)?;

    let mut round_stmt = conn.prepare(
        "SELECT id, cup_id, number, label, matches_per_tie FROM rounds
         WHERE cup_id = ? ORDER BY number",
    )?;
    let rounds = round_stmt
        .query_map([cup_id], row_to_round)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut match_stmt = conn.prepare(&format!(
        "SELECT {} FROM knockout_matches km WHERE km.round_id = ? ORDER BY km.id",
        KNOCKOUT_COLUMNS
    ))?;
    let mut bracket_rounds = Vec::with_capacity(rounds.len());
    for round in rounds {
        let matches = match_stmt
            .query_map([round.id], row_to_knockout_match)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        bracket_rounds.push(BracketRound { round, matches });
    }

    Ok(Bracket {
        cup_id,
        victory_only: cup.victory_only,
        rounds: bracket_rounds,
    })
}

pub(crate) fn save_bracket_in(conn: &Connection, bracket: &Bracket) -> Result<()> {
    let mut stmt = conn.prepare(
        "UPDATE knockout_matches SET
            home_team_id = ?, away_team_id = ?, home_score = ?, away_score = ?,
            home_penalties = ?, away_penalties = ?, home_aggregate = ?, away_aggregate = ?,
            terminated = ?, is_fake = ?
         WHERE id = ?",
    )?;
    for m in bracket.matches() {
        stmt.execute(params![
            m.home_team_id,
            m.away_team_id,
            m.home_score,
            m.away_score,
            m.home_penalties,
            m.away_penalties,
            m.home_aggregate,
            m.away_aggregate,
            m.terminated,
            m.is_fake,
            m.id
        ])?;
    }
    Ok(())
}

/// Load, recompute and write back the whole bracket of a cup.
pub(crate) fn recalculate_in(conn: &Connection, cup_id: CupId) -> Result<ProgressionReport> {
    let mut bracket = load_bracket_in(conn, cup_id)?;
    if bracket.rounds.is_empty() {
        return Err(LeagueError::invariant(format!(
            "cup {} has no bracket yet",
            cup_id
        )));
    }
    let report = recalculate(&mut bracket);
    save_bracket_in(conn, &bracket)?;
    Ok(report)
}

impl LeagueDatabase {
    pub fn create_cup_model(&mut self, name: &str, logo: Option<&str>) -> Result<CupModel> {
        self.conn.execute(
            "INSERT INTO cup_models (name, logo) VALUES (?, ?)",
            params![name, logo],
        )?;
        Ok(CupModel {
            id: CupModelId::new(self.conn.last_insert_rowid()),
            name: name.to_string(),
            logo: logo.map(str::to_string),
        })
    }

    pub fn get_cup_model(&self, id: CupModelId) -> Result<CupModel> {
        fetch_cup_model(&self.conn, id)
    }

    pub fn list_cup_models(&self) -> Result<Vec<CupModel>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, logo FROM cup_models ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(CupModel {
                id: row.get(0)?,
                name: row.get(1)?,
                logo: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_cup_model(&mut self, id: CupModelId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM cup_models WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("cup model", id.as_i64()));
        }
        Ok(())
    }

    pub fn create_cup(&mut self, cup: &NewCup) -> Result<Cup> {
        insert_cup(&self.conn, cup, None)
    }

    pub fn get_cup(&self, id: CupId) -> Result<Cup> {
        fetch_cup(&self.conn, id)
    }

    pub fn list_cups(&self) -> Result<Vec<Cup>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM cups ORDER BY id", CUP_COLUMNS))?;
        let rows = stmt.query_map([], row_to_cup)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_cup(&mut self, id: CupId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM cups WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("cup", id.as_i64()));
        }
        Ok(())
    }

    /// Replace the cup's entrants; the order given is the seed order.
    pub fn set_cup_teams(&mut self, cup_id: CupId, teams: &[TeamId]) -> Result<()> {
        let tx = self.conn.transaction()?;
        fetch_cup(&tx, cup_id)?;
        insert_cup_teams(&tx, cup_id, teams)?;
        tx.commit()?;
        Ok(())
    }

    /// The cup's entrants in seed order.
    pub fn cup_teams(&self, cup_id: CupId) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.rival_id FROM teams t
             JOIN cup_teams ct ON ct.team_id = t.id
             WHERE ct.cup_id = ?
             ORDER BY ct.seed",
        )?;
        let rows = stmt.query_map([cup_id], super::teams::row_to_team)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Replace the cup's bracket with `plan` and resolve its byes, all or nothing.
    pub fn replace_bracket(
        &mut self,
        cup_id: CupId,
        plan: &BracketPlan,
    ) -> Result<(Bracket, ProgressionReport)> {
        let tx = self.conn.transaction()?;
        fetch_cup(&tx, cup_id)?;
        insert_bracket(&tx, cup_id, plan)?;
        let report = recalculate_in(&tx, cup_id)?;
        let bracket = load_bracket_in(&tx, cup_id)?;
        tx.commit()?;

        info!(
            "cup {}: bracket of {} rounds, {} byes",
            cup_id,
            plan.rounds.len(),
            plan.byes
        );
        Ok((bracket, report))
    }

    pub fn load_bracket(&self, cup_id: CupId) -> Result<Bracket> {
        load_bracket_in(&self.conn, cup_id)
    }

    /// Write every match of `bracket` back.
    pub fn save_bracket(&mut self, bracket: &Bracket) -> Result<()> {
        let tx = self.conn.transaction()?;
        save_bracket_in(&tx, bracket)?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_knockout_match(&self, id: KnockoutMatchId) -> Result<KnockoutMatch> {
        fetch_knockout_match(&self.conn, id)
    }

    /// Record a cup match result and propagate winners through the bracket.
    pub fn record_knockout_result(
        &mut self,
        id: KnockoutMatchId,
        score: Option<Score>,
        shootout: Option<Score>,
        terminated: bool,
    ) -> Result<(KnockoutMatch, ProgressionReport)> {
        let tx = self.conn.transaction()?;
        let current = fetch_knockout_match(&tx, id)?;
        if current.is_fake {
            return Err(LeagueError::validation(format!(
                "cup match {} is a walkover and takes no result",
                id
            )));
        }
        if !current.has_both_teams() {
            return Err(LeagueError::validation(format!(
                "cup match {} does not have both teams yet",
                id
            )));
        }

        tx.execute(
            "UPDATE knockout_matches SET home_score = ?, away_score = ?,
                home_penalties = ?, away_penalties = ?, terminated = ?
             WHERE id = ?",
            params![
                score.map(|s| s.home),
                score.map(|s| s.away),
                shootout.map(|s| s.home),
                shootout.map(|s| s.away),
                terminated,
                id
            ],
        )?;
        let cup_id = cup_of_match(&tx, id)?;
        let report = recalculate_in(&tx, cup_id)?;
        let updated = fetch_knockout_match(&tx, id)?;
        tx.commit()?;
        Ok((updated, report))
    }

    /// Recompute every tie of a cup from its recorded results.
    pub fn recalculate_cup(&mut self, cup_id: CupId) -> Result<ProgressionReport> {
        let tx = self.conn.transaction()?;
        let report = recalculate_in(&tx, cup_id)?;
        tx.commit()?;
        Ok(report)
    }
}
