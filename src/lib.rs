//! Day-ahead prediction of French Tempo tariff colors.

pub mod config;
pub mod error;
/// Confusion matrix and accuracy reporting.
pub mod evaluation;
pub mod horizon;
pub mod io;
pub mod logging;
pub mod production;
pub mod synthetic;
/// Prediction engine: net demand, normalization, quota, thresholds, classification.
pub mod tempo;

pub use error::{Result, TempoError};
