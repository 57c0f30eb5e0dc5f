//! Score values entered for a fixture.

use crate::error::{LeagueError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Goals scored by the home and away side, written `HOME-AWAY`.
///
/// The same shape is used for penalty shootouts.
///
/// # Examples
///
/// ```rust
/// use league_manager::Score;
///
/// let score: Score = "3-1".parse().unwrap();
/// assert_eq!(score.home, 3);
/// assert_eq!(score.away, 1);
/// assert_eq!(score.to_string(), "3-1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// The same score seen from the other side.
    pub fn swapped(&self) -> Self {
        Self {
            home: self.away,
            away: self.home,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.home == self.away
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

impl FromStr for Score {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LeagueError::InvalidScore {
            input: s.to_string(),
        };

        let (home, away) = s.trim().split_once(['-', ':']).ok_or_else(invalid)?;
        let home = home.trim().parse().map_err(|_| invalid())?;
        let away = away.trim().parse().map_err(|_| invalid())?;
        Ok(Self { home, away })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dash_and_colon() {
        assert_eq!("2-1".parse::<Score>().unwrap(), Score::new(2, 1));
        assert_eq!("0:0".parse::<Score>().unwrap(), Score::new(0, 0));
        assert_eq!(" 4 - 3 ".parse::<Score>().unwrap(), Score::new(4, 3));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in ["", "2", "a-1", "2-", "-1-2", "2-1-0"] {
            assert!(
                matches!(input.parse::<Score>(), Err(LeagueError::InvalidScore { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_swapped() {
        assert_eq!(Score::new(3, 0).swapped(), Score::new(0, 3));
        assert!(Score::new(1, 1).is_draw());
        assert!(!Score::new(1, 0).is_draw());
    }
}
