//! CLI argument definitions and parsing.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

use crate::{
    storage::{CardColor, FixtureRef, Venue},
    types::score::Score,
    CardId, CupId, CupModelId, GoalId, GroupCupId, GroupMatchId, KnockoutMatchId, LeagueId,
    MatchId, PlayerId, SeasonId, TeamId, TransferId,
};


#[derive(Debug, Parser)]
#[clap(name = "league-manager", about = "Leagues, cups and group stages from the command line")]
pub struct LeagueManager {
    /// Database file (or set `LEAGUE_MANAGER_DB` env var).
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output results as JSON instead of text lines.
    #[clap(long, global = true)]
    pub json: bool,

    /// More logging: `-v` for info, `-vv` for debug.
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage leagues
    League {
        #[clap(subcommand)]
        cmd: LeagueCmd,
    },

    /// Manage teams and rivalries
    Team {
        #[clap(subcommand)]
        cmd: TeamCmd,
    },

    /// Manage players
    Player {
        #[clap(subcommand)]
        cmd: PlayerCmd,
    },

    /// Record and edit player transfers
    Transfer {
        #[clap(subcommand)]
        cmd: TransferCmd,
    },

    /// League seasons: schedule, results, standings
    Season {
        #[clap(subcommand)]
        cmd: SeasonCmd,
    },

    /// Knockout cups: bracket, results, progression
    Cup {
        #[clap(subcommand)]
        cmd: CupCmd,
    },

    /// Cups with a group stage
    Groups {
        #[clap(subcommand)]
        cmd: GroupCupCmd,
    },

    /// Goals and cards
    Event {
        #[clap(subcommand)]
        cmd: EventCmd,
    },
}

#[derive(Debug, Subcommand)]
pub enum LeagueCmd {
    /// Create a league.
    Add { name: String },
    /// List leagues.
    List,
    /// Delete a league with all its seasons.
    Delete { id: LeagueId },
}

#[derive(Debug, Subcommand)]
pub enum TeamCmd {
    /// Create a team.
    Add { name: String },
    /// List teams.
    List,
    /// Rename a team.
    Rename { id: TeamId, name: String },
    /// Delete a team.
    Delete { id: TeamId },
    /// Make two teams rivals (both ways).
    Rival { team: TeamId, rival: TeamId },
    /// Remove a team's rivalry (both ways).
    ClearRival { team: TeamId },
}

#[derive(Debug, Subcommand)]
pub enum PlayerCmd {
    /// Create a player.
    Add {
        name: String,

        /// Playing position (free text, e.g. GK).
        #[clap(long, short)]
        position: Option<String>,

        /// Club the player starts at.
        #[clap(long, short)]
        team: Option<TeamId>,
    },
    /// List players, optionally of one team.
    List {
        #[clap(long, short)]
        team: Option<TeamId>,
    },
    /// Change a player's name or position.
    Update {
        id: PlayerId,
        name: String,

        #[clap(long, short)]
        position: Option<String>,
    },
    /// Delete a player.
    Delete { id: PlayerId },
}

#[derive(Debug, Subcommand)]
pub enum TransferCmd {
    /// Record a transfer.
    Add {
        player: PlayerId,

        /// Destination team.
        #[clap(long)]
        to: TeamId,

        /// Origin team (defaults to the player's current team).
        #[clap(long)]
        from: Option<TeamId>,

        /// Transfer date (YYYY-MM-DD).
        #[clap(long)]
        date: NaiveDate,
    },
    /// A player's transfer history.
    List { player: PlayerId },
    /// Edit a transfer.
    Update {
        id: TransferId,

        #[clap(long)]
        to: TeamId,

        #[clap(long)]
        from: Option<TeamId>,

        #[clap(long)]
        date: NaiveDate,
    },
    /// Delete a transfer.
    Delete { id: TransferId },
}

#[derive(Debug, Subcommand)]
pub enum SeasonCmd {
    /// Open a new season in a league.
    Add { league: LeagueId, name: String },
    /// List a league's seasons.
    List { league: LeagueId },
    /// Mark a season finished.
    Finish { id: SeasonId },
    /// Put a finished season back in progress.
    Reopen { id: SeasonId },
    /// Delete a season.
    Delete { id: SeasonId },
    /// Set the participating teams, in seed order.
    Teams {
        season: SeasonId,
        #[clap(required = true)]
        teams: Vec<TeamId>,
    },
    /// Generate the double round robin, replacing any existing schedule.
    Schedule {
        season: SeasonId,

        /// Shuffle the teams before drawing the schedule.
        #[clap(long)]
        shuffle: bool,
    },
    /// Show every matchday and its fixtures.
    Fixtures { season: SeasonId },
    /// Record a league match score.
    Result {
        id: MatchId,
        score: Score,

        /// Keep the match open (not terminated).
        #[clap(long)]
        pending: bool,
    },
    /// Record goalkeeper and saves for one side of a match.
    Keeper {
        id: MatchId,
        side: Venue,

        #[clap(long)]
        player: Option<PlayerId>,

        #[clap(long)]
        saves: Option<u32>,
    },
    /// League table.
    Standings { season: SeasonId },
    /// Top scorers.
    Scorers { season: SeasonId },
}

#[derive(Debug, Subcommand)]
pub enum CupCmd {
    /// Create a cup model (trophy name and logo).
    AddModel {
        name: String,

        #[clap(long)]
        logo: Option<String>,
    },
    /// List cup models.
    Models,
    /// Create a knockout cup.
    Add {
        name: String,

        #[clap(long)]
        model: Option<CupModelId>,

        /// Matches per tie: 1, 2 (home and away), 3, 5 or 7.
        #[clap(long, default_value_t = 1)]
        matches_per_tie: u8,

        /// Decide series on match wins instead of total goals.
        #[clap(long)]
        victory_only: bool,

        /// Shuffle the entrants when drawing the bracket.
        #[clap(long)]
        random: bool,
    },
    /// List cups.
    List,
    /// Delete a cup.
    Delete { id: CupId },
    /// Set the entrants, in seed order.
    Teams {
        cup: CupId,
        #[clap(required = true)]
        teams: Vec<TeamId>,
    },
    /// Draw the bracket, replacing any existing one.
    Draw { cup: CupId },
    /// Show the bracket.
    Show { cup: CupId },
    /// Record a cup match score.
    Result {
        id: KnockoutMatchId,
        score: Score,

        /// Penalty shootout score.
        #[clap(long)]
        pens: Option<Score>,

        #[clap(long)]
        pending: bool,
    },
    /// Recompute every tie winner from the recorded results.
    Recalculate { cup: CupId },
    /// Top scorers.
    Scorers { cup: CupId },
}

#[derive(Debug, Subcommand)]
pub enum GroupCupCmd {
    /// Create a cup with a group stage.
    Add {
        name: String,

        /// Number of entrants.
        #[clap(long)]
        teams: u32,

        /// Number of groups.
        #[clap(long)]
        groups: u32,

        /// Teams qualifying from each group.
        #[clap(long)]
        qualifiers: u32,

        /// Shuffle the entrants when drawing the groups.
        #[clap(long)]
        random: bool,

        /// 1 for a single round robin per group, 2 for home and away.
        #[clap(long, default_value_t = 1)]
        legs: u8,

        /// Matches per tie in knockout rounds after the first.
        #[clap(long, default_value_t = 1)]
        matches_per_tie: u8,

        #[clap(long)]
        victory_only: bool,
    },
    /// List group cups.
    List,
    /// Delete a group cup.
    Delete { id: GroupCupId },
    /// Set the entrants, in seed order.
    Teams {
        id: GroupCupId,
        #[clap(required = true)]
        teams: Vec<TeamId>,
    },
    /// Draw the groups and their schedules, replacing any existing ones.
    Draw { id: GroupCupId },
    /// Show every group with its table and fixtures.
    Show { id: GroupCupId },
    /// Record a group match score.
    Result {
        id: GroupMatchId,
        score: Score,

        #[clap(long)]
        pending: bool,
    },
    /// Close the group stage and draw the knockout phase.
    Finalize { id: GroupCupId },
}

#[derive(Debug, Subcommand)]
pub enum EventCmd {
    /// Record a goal; the fixture score is recounted.
    Goal {
        /// `league:ID`, `cup:ID` or `group:ID`.
        fixture: FixtureRef,

        /// Team credited with the goal.
        #[clap(long)]
        team: TeamId,

        #[clap(long)]
        scorer: Option<PlayerId>,

        #[clap(long)]
        assist: Option<PlayerId>,

        #[clap(long)]
        minute: Option<u32>,

        #[clap(long)]
        own_goal: bool,
    },
    /// Record a card; a second yellow is stored as a red.
    Card {
        fixture: FixtureRef,

        #[clap(long)]
        team: TeamId,

        #[clap(long)]
        player: PlayerId,

        /// yellow or red.
        #[clap(long, default_value = "yellow")]
        color: CardColor,

        #[clap(long)]
        minute: Option<u32>,
    },
    /// Goals and cards of a fixture.
    List { fixture: FixtureRef },
    /// Delete a goal.
    DeleteGoal { id: GoalId },
    /// Delete a card.
    DeleteCard { id: CardId },
}
