//! ID types for league records.
//!
//! Every stored record gets its own identifier type so that a `TeamId` can never be
//! passed where a `PlayerId` is expected. All of them wrap the SQLite rowid.

use crate::error::{LeagueError, Result};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = LeagueError;

            fn from_str(s: &str) -> Result<Self> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map(Self)
            }
        }
    };
}

record_id!(
    /// Type-safe wrapper for team IDs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use league_manager::TeamId;
    ///
    /// let team_id = TeamId::new(7);
    /// assert_eq!(team_id.as_i64(), 7);
    /// assert_eq!(team_id.to_string(), "7");
    /// ```
    TeamId
);
record_id!(PlayerId);
record_id!(LeagueId);
record_id!(SeasonId);
record_id!(MatchdayId);
record_id!(
    /// A league (season) match.
    MatchId
);
record_id!(CupId);
record_id!(CupModelId);
record_id!(RoundId);
record_id!(KnockoutMatchId);
record_id!(
    /// A cup played as a group stage followed by a knockout phase.
    GroupCupId
);
record_id!(GroupId);
record_id!(GroupMatchId);
record_id!(GoalId);
record_id!(CardId);
record_id!(TransferId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_through_str() {
        let id: TeamId = "42".parse().unwrap();
        assert_eq!(id, TeamId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_parse_trims_whitespace() {
        let id: CupId = " 9 ".parse().unwrap();
        assert_eq!(id.as_i64(), 9);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        let result = "abc".parse::<PlayerId>();
        assert!(matches!(result, Err(LeagueError::InvalidId(_))));
    }

    #[test]
    fn test_ids_are_ordered_by_value() {
        let mut ids = vec![TeamId::new(3), TeamId::new(1), TeamId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![TeamId::new(1), TeamId::new(2), TeamId::new(3)]);
    }

    #[test]
    fn test_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&GroupId::new(5)).unwrap();
        assert_eq!(json, "5");
    }
}
