//! Leaderboard records and spreadsheet cell values.

use serde::Serialize;
use std::num::NonZeroU32;

/// Header row written above the records of every destination tab
pub const HEADER: [&str; 5] = ["Rank", "Team", "Games", "Points", "Average Points Per Game"];

/// One validated leaderboard row.
///
/// Teams without played games never become records, so the average is
/// always defined.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRecord {
    rank: String,
    team_name: String,
    games_played: NonZeroU32,
    points: f64,
    average_points_per_game: f64,
}

impl LeaderboardRecord {
    pub fn new(
        rank: impl Into<String>,
        team_name: impl Into<String>,
        games_played: NonZeroU32,
        points: f64,
    ) -> Self {
        Self {
            rank: rank.into(),
            team_name: team_name.into(),
            games_played,
            points,
            average_points_per_game: round2(points / f64::from(games_played.get())),
        }
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn games_played(&self) -> u32 {
        self.games_played.get()
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn average_points_per_game(&self) -> f64 {
        self.average_points_per_game
    }

    /// Cells in header order
    pub fn to_row(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.rank.clone()),
            CellValue::Text(self.team_name.clone()),
            CellValue::Integer(i64::from(self.games_played.get())),
            CellValue::Number(self.points),
            CellValue::Number(self.average_points_per_game),
        ]
    }
}

/// Round to two decimal places.
///
/// Goes through fixed-precision formatting, which rounds the exact binary
/// value and sends exact ties to the even digit: 0.125 becomes 0.12.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Text of the three cells of one rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub rank_team: String,
    pub games: String,
    pub points: String,
}

impl RawRow {
    pub fn new(rank_team: impl Into<String>, games: impl Into<String>, points: impl Into<String>) -> Self {
        Self {
            rank_team: rank_team.into(),
            games: games.into(),
            points: points.into(),
        }
    }
}

impl std::fmt::Display for RawRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}, {:?}]", self.rank_team, self.games, self.points)
    }
}

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Number(v) => write!(f, "{}", v),
            CellValue::Text(v) => f.write_str(v),
        }
    }
}

/// Header followed by one row per record, as written to a destination tab
pub fn table_rows(records: &[LeaderboardRecord]) -> Vec<Vec<CellValue>> {
    let header = HEADER.iter().map(|h| CellValue::Text(h.to_string())).collect();
    std::iter::once(header)
        .chain(records.iter().map(LeaderboardRecord::to_row))
        .collect()
}
