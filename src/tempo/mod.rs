//! Tempo-day prediction engine.

pub mod classifier;
pub mod net_demand;
/// Net-demand normalization and its quantile policies.
pub mod normalization;
pub mod pipeline;
/// Remaining red/white quota tracking.
pub mod quota;
/// Season calendar, quotas, and the red-day window.
pub mod season;
pub mod threshold;
pub mod types;

pub use pipeline::{DailyPrediction, PredictorParams, TempoPredictor};
pub use season::{Quota, Season};
pub use types::{DailyRecord, InputTable, TempoColor};
