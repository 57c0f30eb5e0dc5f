//! League Manager Library
//!
//! Leagues, seasons, knockout cups and group stages backed by a local SQLite database.
//!
//! ## Features
//!
//! - **Schedules**: Double round robin with mirrored return legs and byes for odd team counts
//! - **Brackets**: Single elimination with byes up to the next power of two, played as single
//!   matches, two-legged ties or best-of-3/5/7 series
//! - **Progression**: Tie winners (aggregate, penalties, series wins) pushed through the bracket,
//!   idempotently
//! - **Group Stages**: Groups with their own round robins, finalized into a cross-paired
//!   knockout cup
//! - **Standings**: Points tables and top scorers
//! - **Records**: Teams, rivalries, players, transfers, goals and cards
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use league_manager::{commands::seasons::*, storage::LeagueDatabase};
//!
//! # fn example() -> league_manager::Result<()> {
//! let mut db = LeagueDatabase::new_in_memory()?;
//! let league = db.create_league("Ligue 1")?;
//! let season = db.create_season(league.id, "2024-2025")?;
//! let teams: Vec<_> = ["Lyon", "Lens", "Lille", "Lorient"]
//!     .iter()
//!     .map(|name| db.create_team(name).map(|t| t.id))
//!     .collect::<league_manager::Result<_>>()?;
//! db.set_season_teams(season.id, &teams)?;
//!
//! generate_schedule(&mut db, season.id, true, &mut rand::thread_rng())?;
//! let table = season_standings(&db, season.id)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! Point the CLI at a database file to avoid passing `--db` in every command:
//! ```bash
//! export LEAGUE_MANAGER_DB=~/football/league.db
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod storage;
pub mod tournament;
pub mod types;

// Re-export commonly used types
pub use error::{LeagueError, Result};
pub use types::ids::*;
pub use types::score::Score;

pub const LEAGUE_MANAGER_DB_ENV_VAR: &str = "LEAGUE_MANAGER_DB";
