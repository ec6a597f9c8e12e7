//! Tempo season calendar: boundaries, quotas, and the red-day window.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TempoError};

use super::types::DailyRecord;

/// Red days allowed per season.
pub const RED_QUOTA: i32 = 22;
/// White days allowed per season.
pub const WHITE_QUOTA: i32 = 43;

/// Month and day at which a standard season starts (1 September).
const SEASON_START: (u32, u32) = (9, 1);
/// First day red days may be assigned (1 November of the start year).
const RED_WINDOW_START: (u32, u32) = (11, 1);
/// Last day red days may be assigned (31 March of the end year).
const RED_WINDOW_END: (u32, u32) = (3, 31);

/// Number of red and white days a season may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub red: i32,
    pub white: i32,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            red: RED_QUOTA,
            white: WHITE_QUOTA,
        }
    }
}

/// A tempo season with explicit inclusive boundaries.
///
/// The red window is derived from the boundaries rather than from the data:
/// 1 November of the start year through 31 March of the end year.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tempo_forecast::tempo::season::Season;
///
/// let season = Season::starting_in(2023).expect("valid year");
/// let jan = NaiveDate::from_ymd_opt(2024, 1, 16).expect("valid date");
/// assert!(season.contains(jan));
/// assert!(season.is_red_allowed(jan));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Season {
    start: NaiveDate,
    end: NaiveDate,
    red_from: NaiveDate,
    red_until: NaiveDate,
}

fn ymd(year: i32, (month, day): (u32, u32)) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(TempoError::InvalidDate { year, month, day })
}

impl Season {
    /// Creates a season from explicit inclusive boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::InvalidSeason`] if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(TempoError::InvalidSeason { start, end });
        }
        Ok(Self {
            start,
            end,
            red_from: ymd(start.year(), RED_WINDOW_START)?,
            red_until: ymd(end.year(), RED_WINDOW_END)?,
        })
    }

    /// Standard season running 1 September `year` to 31 August `year + 1`.
    pub fn starting_in(year: i32) -> Result<Self> {
        let start = ymd(year, SEASON_START)?;
        let next = ymd(year + 1, SEASON_START)?;
        let end = next.pred_opt().ok_or(TempoError::InvalidDate {
            year: year + 1,
            month: 8,
            day: 31,
        })?;
        Self::new(start, end)
    }

    /// Standard season that contains `date`.
    pub fn containing(date: NaiveDate) -> Result<Self> {
        let year = if date.month() >= SEASON_START.0 {
            date.year()
        } else {
            date.year() - 1
        };
        Self::starting_in(year)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive red window `(first, last)`.
    pub fn red_window(&self) -> (NaiveDate, NaiveDate) {
        (self.red_from, self.red_until)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the calendar permits a red day on `date` (window only, not weekday).
    pub fn is_red_allowed(&self, date: NaiveDate) -> bool {
        self.red_from <= date && date <= self.red_until
    }

    /// Number of calendar days in the season.
    pub fn len_days(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    /// Iterates over every calendar day of the season.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|d| *d <= self.end)
    }

    /// Checks that `records` is a non-empty, strictly increasing series inside the season.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate_series(&self, records: &[DailyRecord]) -> Result<()> {
        if records.is_empty() {
            return Err(TempoError::EmptySeries);
        }
        let mut previous: Option<NaiveDate> = None;
        for record in records {
            if !self.contains(record.date) {
                return Err(TempoError::OutsideSeason {
                    date: record.date,
                    start: self.start,
                    end: self.end,
                });
            }
            if let Some(prev) = previous {
                if record.date <= prev {
                    return Err(TempoError::UnorderedDates {
                        previous: prev,
                        date: record.date,
                    });
                }
            }
            previous = Some(record.date);
        }
        Ok(())
    }

    /// Checks that `history` is strictly increasing and ends before the season.
    ///
    /// An empty history is valid.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::UnorderedDates`] or [`TempoError::HistoryOverlap`].
    pub fn validate_history(&self, history: &[DailyRecord]) -> Result<()> {
        for pair in history.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(TempoError::UnorderedDates {
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }
        match history.last() {
            Some(last) if last.date >= self.start => Err(TempoError::HistoryOverlap {
                date: last.date,
                start: self.start,
            }),
            _ => Ok(()),
        }
    }
}

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}
