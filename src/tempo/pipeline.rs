//! Season predictor chaining the pure stages:
//! net demand → normalization → quota → thresholds → classification.

use std::fmt;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::Result;
use crate::evaluation::{ConfusionMatrix, DayLabel, OneHot};

use super::classifier::{Classifier, ClassifierInput, Decision};
use super::net_demand::net_demand_series;
use super::normalization::{NormalizationParams, NormalizedDay, normalize_with_history};
use super::quota::{DailyStock, QuotaTracker};
use super::season::{Quota, Season};
use super::threshold::{DailyThresholds, ThresholdParams};
use super::types::{DailyRecord, InputTable, TempoColor};

/// All tunable parameters of the predictor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictorParams {
    pub quota: Quota,
    pub normalization: NormalizationParams,
    pub thresholds: ThresholdParams,
}

/// Derived fields of one day, computed once per predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayFeatures {
    pub date: NaiveDate,
    pub known_color: Option<TempoColor>,
    pub normalized: NormalizedDay,
    pub stock: DailyStock,
    pub thresholds: DailyThresholds,
}

/// Prediction for one day, with the inputs that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrediction {
    pub date: NaiveDate,
    /// Realized color if already known.
    pub known_color: Option<TempoColor>,
    pub net_demand: f64,
    pub normalized_score: f64,
    pub stock_red: i32,
    pub stock_white: i32,
    pub threshold_red: f64,
    pub threshold_white_red: f64,
    pub prediction_red: bool,
    pub prediction_white: bool,
    pub prediction_blue: bool,
    pub predicted_color: TempoColor,
}

impl DailyPrediction {
    fn new(features: &DayFeatures, decision: Decision) -> Self {
        Self {
            date: features.date,
            known_color: features.known_color,
            net_demand: features.normalized.net_demand,
            normalized_score: features.normalized.score,
            stock_red: features.stock.red,
            stock_white: features.stock.white,
            threshold_red: features.thresholds.red,
            threshold_white_red: features.thresholds.white_red,
            prediction_red: decision.red,
            prediction_white: decision.white,
            prediction_blue: decision.blue,
            predicted_color: decision.color(),
        }
    }
}

impl fmt::Display for DailyPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = self.known_color.map_or("-", TempoColor::as_str);
        write!(
            f,
            "{} known={:<5} score={:>7.3} red_thr={:.3} wr_thr={:.3} stock(r/w)={}/{} -> {}",
            self.date,
            known,
            self.normalized_score,
            self.threshold_red,
            self.threshold_white_red,
            self.stock_red,
            self.stock_white,
            self.predicted_color
        )
    }
}

/// Tempo-day predictor over one season's records.
///
/// Construction validates the series and computes every derived field;
/// [`TempoPredictor::predict`] is then a pure read of those fields.
#[derive(Debug, Clone)]
pub struct TempoPredictor {
    season: Season,
    params: PredictorParams,
    features: Vec<DayFeatures>,
}

impl TempoPredictor {
    /// Builds the predictor from typed records, without pre-season history.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the records are empty, not strictly
    /// increasing, or fall outside `season`.
    pub fn new(season: Season, records: &[DailyRecord], params: PredictorParams) -> Result<Self> {
        Self::with_history(season, &[], records, params)
    }

    /// Builds the predictor from the season's records and the days that
    /// precede the season.
    ///
    /// `history` only feeds the trailing normalization windows; its colors
    /// never touch the season's quota.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the records are invalid for `season`,
    /// or if `history` is unordered or reaches into the season.
    pub fn with_history(
        season: Season,
        history: &[DailyRecord],
        records: &[DailyRecord],
        params: PredictorParams,
    ) -> Result<Self> {
        season.validate_series(records)?;
        season.validate_history(history)?;

        let net = net_demand_series(records);
        let temperatures: Vec<f64> = records.iter().map(|r| r.temperature).collect();
        let history_net = net_demand_series(history);
        let history_temperatures: Vec<f64> = history.iter().map(|r| r.temperature).collect();
        let normalized = normalize_with_history(
            &history_net,
            &history_temperatures,
            &net,
            &temperatures,
            &params.normalization,
        );
        debug!(
            rows = records.len(),
            history = history.len(),
            "normalized net demand"
        );

        let stocks = QuotaTracker::new(params.quota).track(records);
        let thresholds = params.thresholds.for_season(&stocks);
        debug!(
            final_red = stocks.last().map_or(0, |s| s.red),
            final_white = stocks.last().map_or(0, |s| s.white),
            "tracked quota"
        );

        let features = records
            .iter()
            .zip(normalized)
            .zip(stocks)
            .zip(thresholds)
            .map(|(((record, normalized), stock), thresholds)| DayFeatures {
                date: record.date,
                known_color: record.known_color,
                normalized,
                stock,
                thresholds,
            })
            .collect();

        Ok(Self {
            season,
            params,
            features,
        })
    }

    /// Builds the predictor from a column-named table.
    ///
    /// # Errors
    ///
    /// Fails fast on missing or mis-sized columns before any computation.
    pub fn from_table(season: Season, table: InputTable, params: PredictorParams) -> Result<Self> {
        let records = table.into_records()?;
        Self::new(season, &records, params)
    }

    pub fn season(&self) -> &Season {
        &self.season
    }

    pub fn params(&self) -> &PredictorParams {
        &self.params
    }

    /// Derived per-day fields in input order.
    pub fn features(&self) -> &[DayFeatures] {
        &self.features
    }

    /// Predicts one color per day, in input order.
    pub fn predict(&self) -> Vec<DailyPrediction> {
        let classifier = Classifier::new(self.season);
        let predictions: Vec<DailyPrediction> = self
            .features
            .iter()
            .map(|f| {
                let decision = classifier.classify(&ClassifierInput {
                    date: f.date,
                    score: f.normalized.score,
                    stock: f.stock,
                    thresholds: f.thresholds,
                });
                DailyPrediction::new(f, decision)
            })
            .collect();

        let count = |color: TempoColor| {
            predictions
                .iter()
                .filter(|p| p.predicted_color == color)
                .count()
        };
        info!(
            season_start = %self.season.start(),
            days = predictions.len(),
            red = count(TempoColor::Red),
            white = count(TempoColor::White),
            blue = count(TempoColor::Blue),
            "predicted tempo colors"
        );
        predictions
    }

    /// Confusion matrix of the known colors against this predictor's output.
    pub fn confusion_matrix(&self) -> ConfusionMatrix {
        ConfusionMatrix::tabulate(self.predict().iter().map(|p| {
            (
                DayLabel::from(p.known_color),
                DayLabel::from(OneHot::from(p).argmax()),
            )
        }))
    }
}
