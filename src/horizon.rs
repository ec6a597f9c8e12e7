//! Forecast-horizon labelling and the running prediction ledger.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::tempo::pipeline::DailyPrediction;
use crate::tempo::types::TempoColor;

/// How far ahead of "today" a prediction was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Horizon {
    /// Tomorrow, and any day up to tomorrow.
    J1,
    J2,
    J3,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::J1, Horizon::J2, Horizon::J3];

    /// Horizon of a day `offset_days` after today.
    ///
    /// Every offset up to one day (including past days) is J-1; offsets
    /// beyond three days have no horizon.
    pub fn for_offset(offset_days: i64) -> Option<Self> {
        match offset_days {
            i64::MIN..=1 => Some(Horizon::J1),
            2 => Some(Horizon::J2),
            3 => Some(Horizon::J3),
            _ => None,
        }
    }

    /// Days between today and the day this horizon predicts.
    pub fn days_ahead(self) -> u64 {
        match self {
            Horizon::J1 => 1,
            Horizon::J2 => 2,
            Horizon::J3 => 3,
        }
    }

    pub fn between(today: NaiveDate, date: NaiveDate) -> Option<Self> {
        Self::for_offset((date - today).num_days())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Horizon::J1 => "J-1",
            Horizon::J2 => "J-2",
            Horizon::J3 => "J-3",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dated row of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub known_color: Option<TempoColor>,
    #[serde(rename = "prediction_J-1")]
    pub j1: Option<TempoColor>,
    #[serde(rename = "prediction_J-2")]
    pub j2: Option<TempoColor>,
    #[serde(rename = "prediction_J-3")]
    pub j3: Option<TempoColor>,
}

impl LedgerRow {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            known_color: None,
            j1: None,
            j2: None,
            j3: None,
        }
    }

    /// Files one prediction under its horizon relative to `today`.
    pub fn from_prediction(today: NaiveDate, prediction: &DailyPrediction) -> Self {
        let mut row = Self::empty(prediction.date);
        row.known_color = prediction.known_color;
        if let Some(horizon) = Horizon::between(today, prediction.date) {
            row.set(horizon, Some(prediction.predicted_color));
        }
        row
    }

    pub fn get(&self, horizon: Horizon) -> Option<TempoColor> {
        match horizon {
            Horizon::J1 => self.j1,
            Horizon::J2 => self.j2,
            Horizon::J3 => self.j3,
        }
    }

    pub fn set(&mut self, horizon: Horizon, color: Option<TempoColor>) {
        match horizon {
            Horizon::J1 => self.j1 = color,
            Horizon::J2 => self.j2 = color,
            Horizon::J3 => self.j3 = color,
        }
    }

    /// Non-empty fields of `self` win; gaps are filled from `older`.
    pub fn combine_first(self, older: &LedgerRow) -> Self {
        Self {
            date: self.date,
            known_color: self.known_color.or(older.known_color),
            j1: self.j1.or(older.j1),
            j2: self.j2.or(older.j2),
            j3: self.j3.or(older.j3),
        }
    }
}

/// Outcome of [`PredictionLedger::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The ledger was empty and now holds the incoming rows.
    Created,
    /// Incoming rows were combined into the ledger.
    Merged,
    /// The incoming table had as many rows as the ledger; nothing changed.
    Unchanged,
}

/// Date-keyed record of realized colors and J-1/J-2/J-3 predictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionLedger {
    rows: BTreeMap<NaiveDate, LedgerRow>,
}

impl PredictionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = LedgerRow>) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.date, r)).collect(),
        }
    }

    /// Labels a run of predictions made on `today`.
    pub fn from_predictions(today: NaiveDate, predictions: &[DailyPrediction]) -> Self {
        Self::from_rows(
            predictions
                .iter()
                .map(|p| LedgerRow::from_prediction(today, p)),
        )
    }

    /// Labels the output of a run made on `today`: the season so far and
    /// the days up to the farthest horizon.
    ///
    /// The table grows by one row per day, so rerunning the same day yields
    /// as many rows as the ledger it already went into.
    pub fn from_run(today: NaiveDate, predictions: &[DailyPrediction]) -> Self {
        let last = today.checked_add_days(Days::new(Horizon::J3.days_ahead()));
        let upto = predictions.partition_point(|p| last.is_none_or(|last| p.date <= last));
        Self::from_predictions(today, &predictions[..upto])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&LedgerRow> {
        self.rows.get(&date)
    }

    /// Rows in date order.
    pub fn rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.values()
    }

    /// Combines `incoming` into the ledger, incoming values first.
    ///
    /// A table with exactly as many rows as the ledger is taken as a rerun
    /// of an already recorded day and leaves the ledger untouched.
    pub fn merge(&mut self, incoming: PredictionLedger) -> MergeOutcome {
        if self.rows.is_empty() {
            self.rows = incoming.rows;
            info!(rows = self.rows.len(), "created prediction ledger");
            return MergeOutcome::Created;
        }
        if incoming.len() == self.len() {
            info!(rows = self.rows.len(), "predictions already recorded");
            return MergeOutcome::Unchanged;
        }
        for (date, row) in incoming.rows {
            let combined = match self.rows.get(&date) {
                Some(older) => row.combine_first(older),
                None => row,
            };
            self.rows.insert(date, combined);
        }
        info!(rows = self.rows.len(), "merged predictions into ledger");
        MergeOutcome::Merged
    }
}
