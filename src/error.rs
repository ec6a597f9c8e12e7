//! Error types shared by the prediction pipeline, evaluation, and I/O.

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while validating inputs or persisting results.
///
/// Per-day numeric problems (NaN, infinite scores) are never errors: they
/// propagate through the day's derived fields and end up classified BLUE.
#[derive(Debug, Error)]
pub enum TempoError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column `{column}` has {actual} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("input series is empty")]
    EmptySeries,

    #[error("dates must be strictly increasing: {previous} is followed by {date}")]
    UnorderedDates { previous: NaiveDate, date: NaiveDate },

    #[error("date {date} lies outside the season {start} ..= {end}")]
    OutsideSeason {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("history day {date} is not before the season start {start}")]
    HistoryOverlap { date: NaiveDate, start: NaiveDate },

    #[error("invalid season: start {start} is after end {end}")]
    InvalidSeason { start: NaiveDate, end: NaiveDate },

    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("truth has {truth} rows but predictions have {predicted}")]
    LengthMismatch { truth: usize, predicted: usize },

    #[error("unknown tempo color \"{0}\"")]
    UnknownColor(String),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("model error: {0}")]
    Model(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, TempoError>;
