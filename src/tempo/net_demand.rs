//! Net demand: consumption left after renewable production.

use super::types::DailyRecord;

/// Computes net demand for one day.
///
/// Production is subtracted as-is, with no sign flipping: wind and solar are
/// positive magnitudes in MW. NaN in any input yields NaN.
///
/// # Arguments
///
/// * `consumption` - Forecasted consumption (MW)
/// * `wind` - Wind production (MW)
/// * `solar` - Solar production (MW)
///
/// # Returns
///
/// `consumption - (wind + solar)` in MW
pub fn net_demand(consumption: f64, wind: f64, solar: f64) -> f64 {
    consumption - (wind + solar)
}

/// Net demand of every record, in input order.
pub fn net_demand_series(records: &[DailyRecord]) -> Vec<f64> {
    records
        .iter()
        .map(|r| net_demand(r.forecast_consumption, r.wind_production, r.solar_production))
        .collect()
}
