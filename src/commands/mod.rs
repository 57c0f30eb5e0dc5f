//! Command implementations for the league manager
//!
//! Each area exposes plain operations over a [`LeagueDatabase`](crate::storage::LeagueDatabase)
//! plus a `handle_*` function that runs a parsed CLI command and prints the outcome.

pub mod common;
pub mod cups;
pub mod events;
pub mod groups;
pub mod seasons;
pub mod teams;


pub use common::CommandContext;
