//! Tournament engine: schedules, brackets, group stages, progression and standings.
//!
//! Everything here is pure computation over in-memory values. Storage reads the current state,
//! hands it to these functions and writes the result back.

pub mod bracket;
pub mod groups;
pub mod progression;
pub mod schedule;
pub mod standings;
pub mod tie;

pub use bracket::{plan_bracket, BracketPlan, RoundPlan, TiePlan};
pub use groups::{cross_pairings, partition_groups, plan_group_stage, plan_knockout};
pub use progression::{recalculate, Bracket, BracketRound, ProgressionReport};
pub use schedule::{double_round_robin, single_round_robin, MatchdayPlan, Pairing};
pub use standings::{compute_standings, top_scorers, MatchOutcome, StandingRow};
pub use tie::{TieFormat, TieOutcome};
