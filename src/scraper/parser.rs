//! Row parser for the rating table.

use std::num::NonZeroU32;

use crate::error::ParseError;
use crate::types::{LeaderboardRecord, RawRow};

/// Result of parsing a well-formed row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record(LeaderboardRecord),
    /// The team has not played yet and is left out of the ranking
    NoGames,
}

/// Parse one raw row.
///
/// The first cell reads `"<rank>. <team>"`; only the first `.` separates the
/// two, so team names may contain dots. Points accept `,` as the decimal
/// separator.
pub fn parse_row(row: &RawRow) -> Result<RowOutcome, ParseError> {
    let (rank, team) = row
        .rank_team
        .split_once('.')
        .ok_or_else(|| ParseError::MissingRankSeparator(row.rank_team.clone()))?;

    let games_text = row.games.trim();
    let games: u32 = games_text.parse().map_err(|_| ParseError::InvalidGames {
        text: games_text.to_string(),
    })?;
    let Some(games) = NonZeroU32::new(games) else {
        return Ok(RowOutcome::NoGames);
    };

    let points = parse_points(&row.points)?;

    Ok(RowOutcome::Record(LeaderboardRecord::new(
        rank.trim(),
        team.trim(),
        games,
        points,
    )))
}

fn parse_points(text: &str) -> Result<f64, ParseError> {
    let cleaned = text.trim().replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| ParseError::InvalidPoints {
            text: text.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: RowOutcome) -> LeaderboardRecord {
        match outcome {
            RowOutcome::Record(r) => r,
            RowOutcome::NoGames => panic!("expected a record"),
        }
    }

    #[test]
    fn test_parse_regular_row() {
        let r = record(parse_row(&RawRow::new("1. Alpha", "4", "40")).unwrap());
        assert_eq!(r.rank(), "1");
        assert_eq!(r.team_name(), "Alpha");
        assert_eq!(r.games_played(), 4);
        assert_eq!(r.points(), 40.0);
        assert_eq!(r.average_points_per_game(), 10.0);
    }

    #[test]
    fn test_zero_games_is_not_a_record() {
        assert_eq!(parse_row(&RawRow::new("2. Beta", "0", "10")).unwrap(), RowOutcome::NoGames);
    }

    #[test]
    fn test_comma_decimal_separator() {
        let r = record(parse_row(&RawRow::new("5. Echo", "2", "12,5")).unwrap());
        assert_eq!(r.points(), 12.5);
        assert_eq!(r.average_points_per_game(), 6.25);
    }

    #[test]
    fn test_only_first_dot_splits() {
        let r = record(parse_row(&RawRow::new(" 12. Dr. Who ", "1", "3")).unwrap());
        assert_eq!(r.rank(), "12");
        assert_eq!(r.team_name(), "Dr. Who");
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            parse_row(&RawRow::new("NoRankName", "3", "5")),
            Err(ParseError::MissingRankSeparator("NoRankName".to_string()))
        );
    }

    #[test]
    fn test_non_numeric_games() {
        assert_eq!(
            parse_row(&RawRow::new("3. Gamma", "two", "5")),
            Err(ParseError::InvalidGames {
                text: "two".to_string()
            })
        );
    }

    #[test]
    fn test_negative_games_rejected() {
        assert!(matches!(
            parse_row(&RawRow::new("3. Gamma", "-2", "5")),
            Err(ParseError::InvalidGames { .. })
        ));
    }

    #[test]
    fn test_non_numeric_points() {
        assert!(matches!(
            parse_row(&RawRow::new("4. Delta", "2", "n/a")),
            Err(ParseError::InvalidPoints { .. })
        ));
        assert!(matches!(
            parse_row(&RawRow::new("4. Delta", "2", "NaN")),
            Err(ParseError::InvalidPoints { .. })
        ));
    }

    #[test]
    fn test_zero_games_wins_over_bad_points() {
        assert_eq!(parse_row(&RawRow::new("9. Zed", "0", "-")).unwrap(), RowOutcome::NoGames);
    }
}
