//! Leagues, teams, rivalries, players and transfers

use super::{models::*, schema::LeagueDatabase};
use crate::{
    error::{LeagueError, Result},
    LeagueId, PlayerId, TeamId, TransferId,
};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(crate) fn row_to_team(row: &Row) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get("id")?,
        name: row.get("name")?,
        rival_id: row.get("rival_id")?,
    })
}

fn row_to_player(row: &Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get("id")?,
        name: row.get("name")?,
        position: row.get("position")?,
        current_team_id: row.get("current_team_id")?,
    })
}

fn row_to_transfer(row: &Row) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: row.get("id")?,
        player_id: row.get("player_id")?,
        from_team_id: row.get("from_team_id")?,
        to_team_id: row.get("to_team_id")?,
        date: row.get("date")?,
    })
}

pub(crate) fn fetch_team(conn: &Connection, id: TeamId) -> Result<Team> {
    conn.query_row(
        "SELECT id, name, rival_id FROM teams WHERE id = ?",
        [id],
        row_to_team,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("team", id.as_i64()))
}

pub(crate) fn fetch_player(conn: &Connection, id: PlayerId) -> Result<Player> {
    conn.query_row(
        "SELECT id, name, position, current_team_id FROM players WHERE id = ?",
        [id],
        row_to_player,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("player", id.as_i64()))
}

fn fetch_transfer(conn: &Connection, id: TransferId) -> Result<Transfer> {
    conn.query_row(
        "SELECT id, player_id, from_team_id, to_team_id, date FROM transfers WHERE id = ?",
        [id],
        row_to_transfer,
    )
    .optional()?
    .ok_or_else(|| LeagueError::not_found("transfer", id.as_i64()))
}

/// The player's most recent transfer: latest date, then latest recorded.
fn latest_transfer(conn: &Connection, player_id: PlayerId) -> Result<Option<Transfer>> {
    Ok(conn
        .query_row(
            "SELECT id, player_id, from_team_id, to_team_id, date FROM transfers
             WHERE player_id = ?
             ORDER BY date DESC, id DESC
             LIMIT 1",
            [player_id],
            row_to_transfer,
        )
        .optional()?)
}

fn set_current_team(conn: &Connection, player_id: PlayerId, team: Option<TeamId>) -> Result<()> {
    conn.execute(
        "UPDATE players SET current_team_id = ? WHERE id = ?",
        params![team, player_id],
    )?;
    Ok(())
}

impl LeagueDatabase {
    pub fn create_league(&mut self, name: &str) -> Result<League> {
        self.conn
            .execute("INSERT INTO leagues (name) VALUES (?)", [name])?;
        Ok(League {
            id: LeagueId::new(self.conn.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    pub fn get_league(&self, id: LeagueId) -> Result<League> {
        self.conn
            .query_row("SELECT id, name FROM leagues WHERE id = ?", [id], |row| {
                Ok(League {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?
            .ok_or_else(|| LeagueError::not_found("league", id.as_i64()))
    }

    pub fn list_leagues(&self) -> Result<Vec<League>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM leagues ORDER BY name, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(League {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete a league with its seasons, schedules and league matches.
    pub fn delete_league(&mut self, id: LeagueId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM leagues WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("league", id.as_i64()));
        }
        Ok(())
    }

    pub fn create_team(&mut self, name: &str) -> Result<Team> {
        self.conn.execute("INSERT INTO teams (name) VALUES (?)", [name])?;
        Ok(Team {
            id: TeamId::new(self.conn.last_insert_rowid()),
            name: name.to_string(),
            rival_id: None,
        })
    }

    pub fn get_team(&self, id: TeamId) -> Result<Team> {
        fetch_team(&self.conn, id)
    }

    pub fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, rival_id FROM teams ORDER BY name, id")?;
        let rows = stmt.query_map([], row_to_team)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn rename_team(&mut self, id: TeamId, name: &str) -> Result<Team> {
        let updated = self
            .conn
            .execute("UPDATE teams SET name = ? WHERE id = ?", params![name, id])?;
        if updated == 0 {
            return Err(LeagueError::not_found("team", id.as_i64()));
        }
        self.get_team(id)
    }

    /// Delete a team. Its fixtures, memberships and transfers into it go with it.
    pub fn delete_team(&mut self, id: TeamId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM teams WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("team", id.as_i64()));
        }
        Ok(())
    }

    /// Make two teams rivals of each other.
    ///
    /// Both sides are written, and any previous rivalry of either team is cleared on both ends.
    pub fn set_rival(&mut self, team_id: TeamId, rival_id: TeamId) -> Result<()> {
        if team_id == rival_id {
            return Err(LeagueError::validation(format!(
                "team {} cannot be its own rival",
                team_id
            )));
        }
        let tx = self.conn.transaction()?;
        fetch_team(&tx, team_id)?;
        fetch_team(&tx, rival_id)?;

        tx.execute(
            "UPDATE teams SET rival_id = NULL
             WHERE id IN (?1, ?2) OR rival_id IN (?1, ?2)",
            params![team_id, rival_id],
        )?;
        tx.execute(
            "UPDATE teams SET rival_id = ? WHERE id = ?",
            params![rival_id, team_id],
        )?;
        tx.execute(
            "UPDATE teams SET rival_id = ? WHERE id = ?",
            params![team_id, rival_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove a team's rivalry from both ends.
    pub fn clear_rival(&mut self, team_id: TeamId) -> Result<()> {
        let tx = self.conn.transaction()?;
        fetch_team(&tx, team_id)?;
        tx.execute(
            "UPDATE teams SET rival_id = NULL WHERE id = ?1 OR rival_id = ?1",
            [team_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Create a player, optionally with the club they start at.
    pub fn create_player(
        &mut self,
        name: &str,
        position: Option<&str>,
        team_id: Option<TeamId>,
    ) -> Result<Player> {
        if let Some(team_id) = team_id {
            fetch_team(&self.conn, team_id)?;
        }
        self.conn.execute(
            "INSERT INTO players (name, position, current_team_id) VALUES (?, ?, ?)",
            params![name, position, team_id],
        )?;
        Ok(Player {
            id: PlayerId::new(self.conn.last_insert_rowid()),
            name: name.to_string(),
            position: position.map(str::to_string),
            current_team_id: team_id,
        })
    }

    pub fn get_player(&self, id: PlayerId) -> Result<Player> {
        fetch_player(&self.conn, id)
    }

    /// Players, optionally only those currently at `team_id`.
    pub fn list_players(&self, team_id: Option<TeamId>) -> Result<Vec<Player>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, position, current_team_id FROM players
             WHERE ?1 IS NULL OR current_team_id = ?1
             ORDER BY name, id",
        )?;
        let rows = stmt.query_map([team_id], row_to_player)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_player(
        &mut self,
        id: PlayerId,
        name: &str,
        position: Option<&str>,
    ) -> Result<Player> {
        let updated = self.conn.execute(
            "UPDATE players SET name = ?, position = ? WHERE id = ?",
            params![name, position, id],
        )?;
        if updated == 0 {
            return Err(LeagueError::not_found("player", id.as_i64()));
        }
        self.get_player(id)
    }

    pub fn delete_player(&mut self, id: PlayerId) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM players WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(LeagueError::not_found("player", id.as_i64()));
        }
        Ok(())
    }

    /// Record a move to `to_team_id` on `date`.
    ///
    /// `from_team_id` defaults to the player's current team. The player's current team only
    /// changes if this becomes their most recent transfer.
    pub fn record_transfer(
        &mut self,
        player_id: PlayerId,
        from_team_id: Option<TeamId>,
        to_team_id: TeamId,
        date: NaiveDate,
    ) -> Result<Transfer> {
        let tx = self.conn.transaction()?;
        let player = fetch_player(&tx, player_id)?;
        fetch_team(&tx, to_team_id)?;
        let from_team_id = from_team_id.or(player.current_team_id);
        if let Some(from) = from_team_id {
            fetch_team(&tx, from)?;
        }
        if from_team_id == Some(to_team_id) {
            return Err(LeagueError::validation(format!(
                "transfer of player {} goes from team {} to itself",
                player_id, to_team_id
            )));
        }

        tx.execute(
            "INSERT INTO transfers (player_id, from_team_id, to_team_id, date)
             VALUES (?, ?, ?, ?)",
            params![player_id, from_team_id, to_team_id, date],
        )?;
        let transfer = Transfer {
            id: TransferId::new(tx.last_insert_rowid()),
            player_id,
            from_team_id,
            to_team_id,
            date,
        };

        if latest_transfer(&tx, player_id)?.map(|t| t.id) == Some(transfer.id) {
            set_current_team(&tx, player_id, Some(to_team_id))?;
            info!("player {} now plays for team {}", player_id, to_team_id);
        }
        tx.commit()?;
        Ok(transfer)
    }

    pub fn get_transfer(&self, id: TransferId) -> Result<Transfer> {
        fetch_transfer(&self.conn, id)
    }

    /// A player's transfers, oldest first.
    pub fn list_transfers(&self, player_id: PlayerId) -> Result<Vec<Transfer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, from_team_id, to_team_id, date FROM transfers
             WHERE player_id = ?
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map([player_id], row_to_transfer)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Change a transfer's teams or date.
    ///
    /// The current team is recomputed only when the transfer was, or now is, the most recent one.
    pub fn update_transfer(
        &mut self,
        id: TransferId,
        from_team_id: Option<TeamId>,
        to_team_id: TeamId,
        date: NaiveDate,
    ) -> Result<Transfer> {
        if from_team_id == Some(to_team_id) {
            return Err(LeagueError::validation(format!(
                "transfer {} goes from team {} to itself",
                id, to_team_id
            )));
        }
        let tx = self.conn.transaction()?;
        let before = fetch_transfer(&tx, id)?;
        fetch_team(&tx, to_team_id)?;
        if let Some(from) = from_team_id {
            fetch_team(&tx, from)?;
        }
        let was_latest = latest_transfer(&tx, before.player_id)?.map(|t| t.id) == Some(id);

        tx.execute(
            "UPDATE transfers SET from_team_id = ?, to_team_id = ?, date = ? WHERE id = ?",
            params![from_team_id, to_team_id, date, id],
        )?;

        let latest = latest_transfer(&tx, before.player_id)?;
        let is_latest = latest.as_ref().map(|t| t.id) == Some(id);
        if was_latest || is_latest {
            set_current_team(&tx, before.player_id, latest.map(|t| t.to_team_id))?;
        }
        let updated = fetch_transfer(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a transfer.
    ///
    /// Deleting the most recent transfer moves the player back: to the destination of the
    /// transfer that is now the latest, or to the deleted transfer's origin if none is left.
    pub fn delete_transfer(&mut self, id: TransferId) -> Result<()> {
        let tx = self.conn.transaction()?;
        let transfer = fetch_transfer(&tx, id)?;
        let was_latest = latest_transfer(&tx, transfer.player_id)?.map(|t| t.id) == Some(id);

        tx.execute("DELETE FROM transfers WHERE id = ?", [id])?;

        if was_latest {
            let team = match latest_transfer(&tx, transfer.player_id)? {
                Some(previous) => Some(previous.to_team_id),
                None => transfer.from_team_id,
            };
            set_current_team(&tx, transfer.player_id, team)?;
        }
        tx.commit()?;
        Ok(())
    }
}
