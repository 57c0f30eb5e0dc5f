//! Data models for the storage layer

use crate::{
    error::{LeagueError, Result},
    tournament::tie::{LegResult, TieFormat},
    types::{ids::*, score::Score},
};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
}

/// A club. Rivalries are stored on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub rival_id: Option<TeamId>,
}

/// A player; `current_team_id` always mirrors the latest transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Option<String>,
    pub current_team_id: Option<TeamId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub player_id: PlayerId,
    pub from_team_id: Option<TeamId>,
    pub to_team_id: TeamId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeasonStatus {
    InProgress,
    Finished,
}

impl SeasonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonStatus::InProgress => "in_progress",
            SeasonStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonStatus {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in_progress" => Ok(SeasonStatus::InProgress),
            "finished" => Ok(SeasonStatus::Finished),
            other => Err(LeagueError::validation(format!(
                "unknown season status '{}'",
                other
            ))),
        }
    }
}

impl ToSql for SeasonStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SeasonStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub league_id: LeagueId,
    pub name: String,
    pub status: SeasonStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchday {
    pub id: MatchdayId,
    pub season_id: SeasonId,
    pub number: u32,
}

/// A league fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub matchday_id: MatchdayId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub terminated: bool,
    pub home_goalkeeper_id: Option<PlayerId>,
    pub away_goalkeeper_id: Option<PlayerId>,
    pub home_saves: Option<u32>,
    pub away_saves: Option<u32>,
}

impl Match {
    pub fn score(&self) -> Option<Score> {
        Some(Score::new(self.home_score?, self.away_score?))
    }
}

/// Home or away side of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    Home,
    Away,
}

impl FromStr for Venue {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "home" | "h" => Ok(Venue::Home),
            "away" | "a" => Ok(Venue::Away),
            other => Err(LeagueError::validation(format!(
                "unknown side '{}', expected home or away",
                other
            ))),
        }
    }
}

/// Display metadata for a cup (trophy name, logo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CupModel {
    pub id: CupModelId,
    pub name: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cup {
    pub id: CupId,
    pub name: String,
    pub model_id: Option<CupModelId>,
    pub matches_per_tie: u8,
    pub victory_only: bool,
    pub randomized: bool,
    /// Set when the cup is the knockout phase of a group stage.
    pub group_cup_id: Option<GroupCupId>,
}

impl Cup {
    pub fn format(&self) -> Result<TieFormat> {
        TieFormat::from_matches_per_tie(self.matches_per_tie)
    }
}

/// Settings for a new knockout cup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCup {
    pub name: String,
    pub model_id: Option<CupModelId>,
    pub matches_per_tie: u8,
    pub victory_only: bool,
    pub randomized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub cup_id: CupId,
    pub number: u32,
    pub label: String,
    pub matches_per_tie: u8,
}

impl Round {
    pub fn format(&self) -> Result<TieFormat> {
        TieFormat::from_matches_per_tie(self.matches_per_tie)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnockoutMatch {
    pub id: KnockoutMatchId,
    pub round_id: RoundId,
    pub home_team_id: Option<TeamId>,
    pub away_team_id: Option<TeamId>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub home_penalties: Option<u32>,
    pub away_penalties: Option<u32>,
    pub home_aggregate: Option<u32>,
    pub away_aggregate: Option<u32>,
    pub terminated: bool,
    pub is_first_leg: bool,
    pub return_match_id: Option<KnockoutMatchId>,
    pub series_number: Option<u8>,
    /// Walkover or bye: excluded from statistics.
    pub is_fake: bool,
}

impl KnockoutMatch {
    pub fn score(&self) -> Option<Score> {
        Some(Score::new(self.home_score?, self.away_score?))
    }

    pub fn shootout(&self) -> Option<Score> {
        Some(Score::new(self.home_penalties?, self.away_penalties?))
    }

    pub fn leg_result(&self) -> LegResult {
        LegResult {
            score: self.score(),
            shootout: self.shootout(),
            terminated: self.terminated,
            is_fake: self.is_fake,
        }
    }

    pub fn has_both_teams(&self) -> bool {
        self.home_team_id.is_some() && self.away_team_id.is_some()
    }
}

/// A cup played as a group stage followed by a knockout phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCup {
    pub id: GroupCupId,
    pub name: String,
    pub team_count: u32,
    pub group_count: u32,
    pub qualifiers_per_group: u32,
    pub randomized: bool,
    /// 1 = single round robin per group, 2 = home and away.
    pub legs: u8,
    /// Tie format of knockout rounds after the first.
    pub matches_per_tie: u8,
    pub victory_only: bool,
    pub finalized: bool,
    pub knockout_cup_id: Option<CupId>,
}

impl GroupCup {
    /// Format of knockout rounds after the first.
    pub fn knockout_format(&self) -> Result<TieFormat> {
        TieFormat::from_matches_per_tie(self.matches_per_tie)
    }
}

/// Settings for a new group cup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroupCup {
    pub name: String,
    pub team_count: u32,
    pub group_count: u32,
    pub qualifiers_per_group: u32,
    pub randomized: bool,
    pub legs: u8,
    pub matches_per_tie: u8,
    pub victory_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub group_cup_id: GroupCupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMatch {
    pub id: GroupMatchId,
    pub group_id: GroupId,
    pub matchday: u32,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub terminated: bool,
}

impl GroupMatch {
    pub fn score(&self) -> Option<Score> {
        Some(Score::new(self.home_score?, self.away_score?))
    }
}

/// The fixture a goal or card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum FixtureRef {
    League(MatchId),
    Knockout(KnockoutMatchId),
    Group(GroupMatchId),
}

impl fmt::Display for FixtureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureRef::League(id) => write!(f, "league match {}", id),
            FixtureRef::Knockout(id) => write!(f, "cup match {}", id),
            FixtureRef::Group(id) => write!(f, "group match {}", id),
        }
    }
}

/// Parses `league:ID`, `cup:ID` or `group:ID`.
impl FromStr for FixtureRef {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s.split_once(':').ok_or_else(|| {
            LeagueError::validation(format!(
                "invalid fixture '{}', expected league:ID, cup:ID or group:ID",
                s
            ))
        })?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "league" => Ok(FixtureRef::League(id.trim().parse()?)),
            "cup" => Ok(FixtureRef::Knockout(id.trim().parse()?)),
            "group" => Ok(FixtureRef::Group(id.trim().parse()?)),
            other => Err(LeagueError::validation(format!(
                "unknown fixture kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub fixture: FixtureRef,
    /// The team credited with the goal.
    pub team_id: TeamId,
    pub scorer_id: Option<PlayerId>,
    pub assist_id: Option<PlayerId>,
    pub minute: Option<u32>,
    pub own_goal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub fixture: FixtureRef,
    pub team_id: TeamId,
    pub scorer_id: Option<PlayerId>,
    pub assist_id: Option<PlayerId>,
    pub minute: Option<u32>,
    pub own_goal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardColor {
    Yellow,
    Red,
}

impl CardColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardColor::Yellow => "yellow",
            CardColor::Red => "red",
        }
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardColor {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yellow" | "y" => Ok(CardColor::Yellow),
            "red" | "r" => Ok(CardColor::Red),
            other => Err(LeagueError::validation(format!(
                "unknown card color '{}'",
                other
            ))),
        }
    }
}

impl ToSql for CardColor {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardColor {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub fixture: FixtureRef,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub color: CardColor,
    pub minute: Option<u32>,
    /// Red card issued because this was the player's second yellow in the fixture.
    pub second_yellow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub fixture: FixtureRef,
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub color: CardColor,
    pub minute: Option<u32>,
}
