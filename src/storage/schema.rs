//! Database schema and connection management

use crate::error::Result;
use log::debug;
use rusqlite::Connection;
use std::path::Path;

/// Connection to the league database.
pub struct LeagueDatabase {
    pub(crate) conn: Connection,
}

impl LeagueDatabase {
    /// Open (or create) the database at `path` and make sure every table exists.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!("opening database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// A throwaway database, used by tests.
    pub fn new_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS leagues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                rival_id INTEGER REFERENCES teams(id) ON DELETE SET NULL,
                CHECK (rival_id IS NULL OR rival_id <> id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                position TEXT,
                current_team_id INTEGER REFERENCES teams(id) ON DELETE SET NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
                from_team_id INTEGER REFERENCES teams(id) ON DELETE SET NULL,
                to_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                date TEXT NOT NULL
            )",
            [],
        )?;

        // Seasons, schedules and league matches
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS seasons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id INTEGER NOT NULL REFERENCES leagues(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                status TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS season_teams (
                season_id INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                seed INTEGER NOT NULL,
                PRIMARY KEY (season_id, team_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS matchdays (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                season_id INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
                number INTEGER NOT NULL,
                UNIQUE (season_id, number)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                matchday_id INTEGER NOT NULL REFERENCES matchdays(id) ON DELETE CASCADE,
                home_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                away_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                home_score INTEGER,
                away_score INTEGER,
                terminated INTEGER NOT NULL DEFAULT 0,
                home_goalkeeper_id INTEGER REFERENCES players(id) ON DELETE SET NULL,
                away_goalkeeper_id INTEGER REFERENCES players(id) ON DELETE SET NULL,
                home_saves INTEGER,
                away_saves INTEGER
            )",
            [],
        )?;

        // Cups and knockout brackets
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cup_models (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                logo TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS group_cups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                team_count INTEGER NOT NULL,
                group_count INTEGER NOT NULL,
                qualifiers_per_group INTEGER NOT NULL,
                randomized INTEGER NOT NULL,
                legs INTEGER NOT NULL DEFAULT 1,
                matches_per_tie INTEGER NOT NULL DEFAULT 1,
                victory_only INTEGER NOT NULL DEFAULT 0,
                finalized INTEGER NOT NULL DEFAULT 0,
                knockout_cup_id INTEGER REFERENCES cups(id) ON DELETE SET NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                model_id INTEGER REFERENCES cup_models(id) ON DELETE SET NULL,
                matches_per_tie INTEGER NOT NULL,
                victory_only INTEGER NOT NULL,
                randomized INTEGER NOT NULL,
                group_cup_id INTEGER REFERENCES group_cups(id) ON DELETE CASCADE
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cup_teams (
                cup_id INTEGER NOT NULL REFERENCES cups(id) ON DELETE CASCADE,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                seed INTEGER NOT NULL,
                PRIMARY KEY (cup_id, team_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS rounds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cup_id INTEGER NOT NULL REFERENCES cups(id) ON DELETE CASCADE,
                number INTEGER NOT NULL,
                label TEXT NOT NULL,
                matches_per_tie INTEGER NOT NULL,
                UNIQUE (cup_id, number)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS knockout_matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                round_id INTEGER NOT NULL REFERENCES rounds(id) ON DELETE CASCADE,
                home_team_id INTEGER REFERENCES teams(id) ON DELETE SET NULL,
                away_team_id INTEGER REFERENCES teams(id) ON DELETE SET NULL,
                home_score INTEGER,
                away_score INTEGER,
                home_penalties INTEGER,
                away_penalties INTEGER,
                home_aggregate INTEGER,
                away_aggregate INTEGER,
                terminated INTEGER NOT NULL DEFAULT 0,
                is_first_leg INTEGER NOT NULL DEFAULT 1,
                return_match_id INTEGER REFERENCES knockout_matches(id) ON DELETE SET NULL,
                series_number INTEGER,
                is_fake INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        // Group stages
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS group_cup_teams (
                group_cup_id INTEGER NOT NULL REFERENCES group_cups(id) ON DELETE CASCADE,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                seed INTEGER NOT NULL,
                PRIMARY KEY (group_cup_id, team_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cup_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_cup_id INTEGER NOT NULL REFERENCES group_cups(id) ON DELETE CASCADE,
                name TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS group_teams (
                group_id INTEGER NOT NULL REFERENCES cup_groups(id) ON DELETE CASCADE,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                PRIMARY KEY (group_id, team_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS group_matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL REFERENCES cup_groups(id) ON DELETE CASCADE,
                matchday INTEGER NOT NULL,
                home_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                away_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                home_score INTEGER,
                away_score INTEGER,
                terminated INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        // Match events: exactly one fixture column is set
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER REFERENCES matches(id) ON DELETE CASCADE,
                knockout_match_id INTEGER REFERENCES knockout_matches(id) ON DELETE CASCADE,
                group_match_id INTEGER REFERENCES group_matches(id) ON DELETE CASCADE,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                scorer_id INTEGER REFERENCES players(id) ON DELETE SET NULL,
                assist_id INTEGER REFERENCES players(id) ON DELETE SET NULL,
                minute INTEGER,
                own_goal INTEGER NOT NULL DEFAULT 0,
                CHECK ((match_id IS NOT NULL) + (knockout_match_id IS NOT NULL)
                       + (group_match_id IS NOT NULL) = 1)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id INTEGER REFERENCES matches(id) ON DELETE CASCADE,
                knockout_match_id INTEGER REFERENCES knockout_matches(id) ON DELETE CASCADE,
                group_match_id INTEGER REFERENCES group_matches(id) ON DELETE CASCADE,
                team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
                color TEXT NOT NULL,
                minute INTEGER,
                second_yellow INTEGER NOT NULL DEFAULT 0,
                CHECK ((match_id IS NOT NULL) + (knockout_match_id IS NOT NULL)
                       + (group_match_id IS NOT NULL) = 1)
            )",
            [],
        )?;

        // Indexes for the common lookups
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_matches_matchday ON matches(matchday_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_knockout_matches_round ON knockout_matches(round_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_group_matches_group ON group_matches(group_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_player ON transfers(player_id, date)",
            [],
        )?;

        Ok(())
    }
}
