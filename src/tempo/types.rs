//! Core input types: tempo colors, daily records, and the column-named input table.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TempoError};

/// Column holding the day-ahead consumption forecast (MW).
pub const FORECAST_CONSUMPTION: &str = "forecast_consumption";
/// Column holding the forecasted wind production (MW).
pub const WIND_PRODUCTION: &str = "wind_production";
/// Column holding the forecasted solar production (MW).
pub const SOLAR_PRODUCTION: &str = "solar_production";
/// Column holding the daily mean temperature (°C).
pub const TEMPERATURE: &str = "temperature";
/// Categorical column holding the realized tempo color, if any.
pub const KNOWN_COLOR: &str = "known_color";

/// Numeric columns every input table must provide.
pub const REQUIRED_NUMERIC_COLUMNS: [&str; 4] = [
    FORECAST_CONSUMPTION,
    WIND_PRODUCTION,
    SOLAR_PRODUCTION,
    TEMPERATURE,
];

/// Tempo tariff-day color.
///
/// Serialized with RTE's API spelling (`RED`, `WHITE`, `BLUE`); the French
/// labels used in RTE's published files (`ROUGE`, `BLANC`, `BLEU`) are
/// accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TempoColor {
    #[serde(rename = "RED", alias = "ROUGE")]
    Red,
    #[serde(rename = "WHITE", alias = "BLANC")]
    White,
    #[serde(rename = "BLUE", alias = "BLEU")]
    Blue,
}

impl TempoColor {
    /// All colors in prediction-column order (red, white, blue).
    pub const ALL: [TempoColor; 3] = [TempoColor::Red, TempoColor::White, TempoColor::Blue];

    /// RTE API label of the color.
    pub fn as_str(self) -> &'static str {
        match self {
            TempoColor::Red => "RED",
            TempoColor::White => "WHITE",
            TempoColor::Blue => "BLUE",
        }
    }
}

impl fmt::Display for TempoColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TempoColor {
    type Err = TempoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RED" | "ROUGE" => Ok(TempoColor::Red),
            "WHITE" | "BLANC" => Ok(TempoColor::White),
            "BLUE" | "BLEU" => Ok(TempoColor::Blue),
            _ => Err(TempoError::UnknownColor(s.to_owned())),
        }
    }
}

/// One calendar day of assembled input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar day (timezone-naive).
    pub date: NaiveDate,
    /// Forecasted national consumption (MW).
    pub forecast_consumption: f64,
    /// Forecasted wind production (MW).
    pub wind_production: f64,
    /// Forecasted solar production (MW).
    pub solar_production: f64,
    /// Daily mean temperature (°C).
    pub temperature: f64,
    /// Realized tempo color; `None` for future or undetermined days.
    pub known_color: Option<TempoColor>,
}

impl DailyRecord {
    /// Creates a record with no known color.
    pub fn new(
        date: NaiveDate,
        forecast_consumption: f64,
        wind_production: f64,
        solar_production: f64,
        temperature: f64,
    ) -> Self {
        Self {
            date,
            forecast_consumption,
            wind_production,
            solar_production,
            temperature,
            known_color: None,
        }
    }

    /// Returns the record with its realized color set.
    pub fn with_known_color(mut self, color: Option<TempoColor>) -> Self {
        self.known_color = color;
        self
    }
}

/// Column-oriented daily table as delivered by the data assembly step.
///
/// Columns are looked up by name so that a table missing a required column
/// is rejected as a whole by [`InputTable::into_records`].
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    dates: Vec<NaiveDate>,
    numeric: BTreeMap<String, Vec<f64>>,
    known_color: Option<Vec<Option<TempoColor>>>,
}

impl InputTable {
    /// Creates a table indexed by the given dates, with no columns yet.
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            numeric: BTreeMap::new(),
            known_color: None,
        }
    }

    /// Adds (or replaces) a numeric column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.numeric.insert(name.into(), values);
        self
    }

    /// Adds the categorical realized-color column.
    pub fn with_known_colors(mut self, colors: Vec<Option<TempoColor>>) -> Self {
        self.known_color = Some(colors);
        self
    }

    /// Number of rows (dates) in the table.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Validates the table and converts it into row records.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::MissingColumns`] naming every absent required
    /// column, or [`TempoError::ColumnLength`] if a column does not have one
    /// value per date. No records are produced on error.
    pub fn into_records(mut self) -> Result<Vec<DailyRecord>> {
        let mut missing: Vec<String> = REQUIRED_NUMERIC_COLUMNS
            .iter()
            .filter(|name| !self.numeric.contains_key(**name))
            .map(|name| (*name).to_owned())
            .collect();
        if self.known_color.is_none() {
            missing.push(KNOWN_COLOR.to_owned());
        }
        if !missing.is_empty() {
            return Err(TempoError::MissingColumns(missing));
        }

        let expected = self.dates.len();
        for name in REQUIRED_NUMERIC_COLUMNS {
            let actual = self.numeric.get(name).map_or(0, Vec::len);
            if actual != expected {
                return Err(TempoError::ColumnLength {
                    column: name.to_owned(),
                    expected,
                    actual,
                });
            }
        }
        let colors = self.known_color.take().unwrap_or_default();
        if colors.len() != expected {
            return Err(TempoError::ColumnLength {
                column: KNOWN_COLOR.to_owned(),
                expected,
                actual: colors.len(),
            });
        }

        let mut column = |name: &str| self.numeric.remove(name).unwrap_or_default();
        let consumption = column(FORECAST_CONSUMPTION);
        let wind = column(WIND_PRODUCTION);
        let solar = column(SOLAR_PRODUCTION);
        let temperature = column(TEMPERATURE);

        Ok(self
            .dates
            .iter()
            .enumerate()
            .map(|(i, &date)| {
                DailyRecord::new(date, consumption[i], wind[i], solar[i], temperature[i])
                    .with_known_color(colors[i])
            })
            .collect())
    }
}
