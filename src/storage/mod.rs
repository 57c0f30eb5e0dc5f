//! Storage layer for the league manager
//!
//! A SQLite store organized by area:
//! - `models`: Data structures
//! - `schema`: Database connection and schema management
//! - `teams`: Leagues, teams, rivalries, players and transfers
//! - `seasons`: Seasons, schedules and league matches
//! - `cups`: Cups, rounds and knockout matches
//! - `groups`: Group cups and their finalization
//! - `events`: Goals and cards

pub mod cups;
pub mod events;
pub mod groups;
pub mod models;
pub mod schema;
pub mod seasons;
pub mod teams;

#[cfg(test)]
mod tests;

// Re-export the main types and database struct for easy access
pub use models::*;
pub use schema::LeagueDatabase;
