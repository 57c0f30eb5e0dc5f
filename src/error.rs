//! Error types for the league manager

use thiserror::Error;


pub type Result<T> = std::result::Result<T, LeagueError>;

#[derive(Error, Debug)]
pub enum LeagueError {
    /// Invalid configuration, rejected before any mutation.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The operation would clash with existing state, which is left untouched.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Invariant violated: {message}")]
    Invariant { message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse identifier: {0}")]
    InvalidId(#[from] std::num::ParseIntError),

    #[error("Invalid score '{input}', expected HOME-AWAY (e.g. 2-1)")]
    InvalidScore { input: String },

    #[error("Invalid date: {0}")]
    InvalidDate(#[from] chrono::ParseError),
}

impl LeagueError {
    pub fn validation(message: impl Into<String>) -> Self {
        LeagueError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        LeagueError::Conflict {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        LeagueError::Invariant {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LeagueError::NotFound { entity, id }
    }
}
