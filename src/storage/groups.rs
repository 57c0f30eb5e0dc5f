//! Group cups, their groups and group matches, and finalization into a knockout cup

use super::{
    cups::{insert_bracket, insert_cup, insert_cup_teams, load_bracket_in, recalculate_in},
    models::*,
    schema::LeagueDatabase,
    teams::{fetch_team, row_to_team},
};
use crate::{
    error::{LeagueError, Result},
    tournament::{
        bracket::pairs_to_seeds,
        groups::{validate_group_config, KnockoutDraw, ScheduledGroup},
        progression::{Bracket, ProgressionReport},
        standings::MatchOutcome,
        tie::TieFormat,
    },
    types::score::Score,
    GroupCupId, GroupId, GroupMatchId, TeamId,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const GROUP_CUP_COLUMNS: &str = "id, name, team_count, group_count, qualifiers_per_group,
     randomized, legs, matches_per_tie, victory_only, finalized, knockout_cup_id";

const GROUP_MATCH_COLUMNS: &str =
    "id, group_id, matchday, home_team_id, away_team_id, home_score, away_score, terminated";

fn row_to_group_cup(row: &Row) -> rusqlite::Result<GroupCup> {
    Ok(GroupCup {
        id: row.get("id")?,
        name: row.get("name")?,
        team_count: row.get("team_count")?,
        group_count: row.get("group_count")?,
        qualifiers_per_group: row.get("qualifiers_per_group")?,
        randomized: row.get("randomized")?,
        legs: row.get("legs")?,
        matches_per_tie: row.get("matches_per_tie")?,
        victory_only: row.get("victory_only")?,
        finalized: row.get("finalized")?,
        knockout_cup_id: row.get("knockout_cup_id")?,
    })
}

fn row_to_group(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get("id")?,
        group_cup_id: row.get("group_cup_id")?,
        name: row.get("name")?,
    })
}

pub(crate) fn row_to_group_match(row: &Row) -> rusqlite::Result<GroupMatch> {
    Ok(GroupMatch {
        id: row.get("id")?,
        group_id: row.get("group_id")?,
        matchday: row.get("matchday")?,
        home_team_id: row.get("home_team_id")?,
        away_team_id: row.get("away_team_id")?,
        home_score: row.get("home_score")?,
        away_score: row.get("away_score")?,
        terminated: row.get("terminated")?,
    })
}

fn fetch_group_cup(conn: &Connection, id: GroupCupId) -> Result<GroupCup> {
    conn.query_row(
        &format!("SELECT {} FROM group_cups WHERE id = ?", GROUP_CUP_COLUMNS),
        [id],
        row_to_group_cup,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("group cup", id.as_i64()))
}

pub(crate) fn fetch_group_match(conn: &Connection, id: GroupMatchId) -> Result<GroupMatch> {
    conn.query_row(
        &format!("SELECT {} FROM group_matches WHERE id = ?", GROUP_MATCH_COLUMNS),
        [id],
        row_to_group_match,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("group match", id.as_i64()))
}

fn ensure_not_finalized(group_cup: &GroupCup) -> Result<()> {
    if group_cup.finalized {
        return Err(LeagueError::conflict(format!(
            "group cup {} is already finalized",
            group_cup.id
        )));
    }
    Ok(())
}

impl LeagueDatabase {
    /// Create a group cup after checking its layout.
    pub fn create_group_cup(&mut self, cup: &NewGroupCup) -> Result<GroupCup> {
        validate_group_config(
            cup.team_count as usize,
            cup.group_count as usize,
            cup.qualifiers_per_group as usize,
        )?;
        TieFormat::from_matches_per_tie(cup.matches_per_tie)?;
        if cup.legs != 1 && cup.legs != 2 {
            return Err(LeagueError::validation(format!(
                "groups are played over 1 or 2 legs, got {}",
                cup.legs
            )));
        }

        self.conn.execute(
            "INSERT INTO group_cups
             (name, team_count, group_count, qualifiers_per_group, randomized, legs,
              matches_per_tie, victory_only)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                cup.name,
                cup.team_count,
                cup.group_count,
                cup.qualifiers_per_group,
                cup.randomized,
                cup.legs,
                cup.matches_per_tie,
                cup.victory_only
            ],
        )?;
        self.get_group_cup(GroupCupId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_group_cup(&self, id: GroupCupId) -> Result<GroupCup> {
        fetch_group_cup(&self.conn, id)
    }

    pub fn list_group_cups(&self) -> Result<Vec<GroupCup>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM group_cups ORDER BY id", GROUP_CUP_COLUMNS))?;
        let rows = stmt.query_map([], row_to_group_cup)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete a group cup with its groups and its knockout cup.
    pub fn delete_group_cup(&mut self, id: GroupCupId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM group_cups WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("group cup", id.as_i64()));
        }
        Ok(())
    }

    /// Replace the entrants; the order given is the seed order used without a random draw.
    pub fn set_group_cup_teams(&mut self, id: GroupCupId, teams: &[TeamId]) -> Result<()> {
        let tx = self.conn.transaction()?;
        let group_cup = fetch_group_cup(&tx, id)?;
        ensure_not_finalized(&group_cup)?;
        if teams.len() != group_cup.team_count as usize {
            return Err(LeagueError::validation(format!(
                "group cup {} is set up for {} teams, got {}",
                id,
                group_cup.team_count,
                teams.len()
            )));
        }
        tx.execute("DELETE FROM group_cup_teams WHERE group_cup_id = ?", [id])?;
        for (seed, team_id) in teams.iter().enumerate() {
            fetch_team(&tx, *team_id)?;
            tx.execute(
                "INSERT INTO group_cup_teams (group_cup_id, team_id, seed) VALUES (?, ?, ?)",
                params![id, team_id, seed as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn group_cup_teams(&self, id: GroupCupId) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.rival_id FROM teams t
             JOIN group_cup_teams gt ON gt.team_id = t.id
             WHERE gt.group_cup_id = ?
             ORDER BY gt.seed",
        )?;
        let rows = stmt.query_map([id], row_to_team)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete the existing groups (with their matches and events) and store new ones.
    pub fn replace_groups(
        &mut self,
        id: GroupCupId,
        groups: &[ScheduledGroup],
    ) -> Result<Vec<Group>> {
        let tx = self.conn.transaction()?;
        let group_cup = fetch_group_cup(&tx, id)?;
        ensure_not_finalized(&group_cup)?;
        tx.execute("DELETE FROM cup_groups WHERE group_cup_id = ?", [id])?;

        let mut stored = Vec::with_capacity(groups.len());
        for scheduled in groups {
            tx.execute(
                "INSERT INTO cup_groups (group_cup_id, name) VALUES (?, ?)",
                params![id, scheduled.group.name],
            )?;
            let group = Group {
                id: GroupId::new(tx.last_insert_rowid()),
                group_cup_id: id,
                name: scheduled.group.name.clone(),
            };
            for (position, team_id) in scheduled.group.teams.iter().enumerate() {
                tx.execute(
                    "INSERT INTO group_teams (group_id, team_id, position) VALUES (?, ?, ?)",
                    params![group.id, team_id, position as i64],
                )?;
            }
            for matchday in &scheduled.matchdays {
                for pairing in &matchday.pairings {
                    tx.execute(
                        "INSERT INTO group_matches (group_id, matchday, home_team_id, away_team_id)
                         VALUES (?, ?, ?, ?)",
                        params![group.id, matchday.number, pairing.home, pairing.away],
                    )?;
                }
            }
            stored.push(group);
        }
        tx.commit()?;

        info!("group cup {}: stored {} groups", id, stored.len());
        Ok(stored)
    }

    pub fn groups(&self, id: GroupCupId) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, group_cup_id, name FROM cup_groups WHERE group_cup_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map([id], row_to_group)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn group_teams(&self, group_id: GroupId) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.rival_id FROM teams t
             JOIN group_teams gt ON gt.team_id = t.id
             WHERE gt.group_id = ?
             ORDER BY gt.position",
        )?;
        let rows = stmt.query_map([group_id], row_to_team)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn group_matches(&self, group_id: GroupId) -> Result<Vec<GroupMatch>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM group_matches WHERE group_id = ? ORDER BY matchday, id",
            GROUP_MATCH_COLUMNS
        ))?;
        let rows = stmt.query_map([group_id], row_to_group_match)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_group_match(&self, id: GroupMatchId) -> Result<GroupMatch> {
        fetch_group_match(&self.conn, id)
    }

    pub fn set_group_match_result(
        &mut self,
        id: GroupMatchId,
        score: Option<Score>,
        terminated: bool,
    ) -> Result<GroupMatch> {
        let updated = self.conn.execute(
            "UPDATE group_matches SET home_score = ?, away_score = ?, terminated = ? WHERE id = ?",
            params![
                score.map(|s| s.home),
                score.map(|s| s.away),
                terminated,
                id
            ],
        )?;
        if updated == 0 {
            return Err(LeagueError::not_found("group match", id.as_i64()));
        }
        self.get_group_match(id)
    }

    /// Terminated, scored matches of a group.
    pub fn group_results(&self, group_id: GroupId) -> Result<Vec<MatchOutcome>> {
        Ok(self
            .group_matches(group_id)?
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

    /// Create the knockout cup from a drawn bracket and mark the group cup finalized.
    ///
    /// Fails with a conflict if the group cup was finalized already; nothing is written then.
    pub fn finalize_group_cup(
        &mut self,
        id: GroupCupId,
        draw: &KnockoutDraw,
    ) -> Result<(Cup, Bracket, ProgressionReport)> {
        let tx = self.conn.transaction()?;
        let group_cup = fetch_group_cup(&tx, id)?;
        ensure_not_finalized(&group_cup)?;

        let cup = insert_cup(
            &tx,
            &NewCup {
                name: format!("{} - phase finale", group_cup.name),
                model_id: None,
                matches_per_tie: group_cup.matches_per_tie,
                victory_only: group_cup.victory_only,
                randomized: true,
            },
            Some(id),
        )?;
        insert_cup_teams(&tx, cup.id, &pairs_to_seeds(&draw.pairs))?;
        insert_bracket(&tx, cup.id, &draw.bracket)?;
        let report = recalculate_in(&tx, cup.id)?;
        let bracket = load_bracket_in(&tx, cup.id)?;

        tx.execute(
            "UPDATE group_cups SET finalized = 1, knockout_cup_id = ? WHERE id = ?",
            params![cup.id, id],
        )?;
        tx.commit()?;

        info!(
            "group cup {} finalized into cup {} with {} ties in round 1",
            id,
            cup.id,
            draw.pairs.len()
        );
        Ok((cup, bracket, report))
    }
}
