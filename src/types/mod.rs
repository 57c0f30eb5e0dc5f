//! Type-safe wrappers for league records and results.

pub mod ids;
pub mod score;
