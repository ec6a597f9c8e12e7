//! Normalization of net demand into a dimensionless score.
//!
//! `score = (net - q_low) / ((q_high - q_low) * exp(gamma * (kappa - t_ref)))`
//!
//! where `q_low`/`q_high` are net-demand quantiles (0.4 / 0.8 by default) and
//! `t_ref` is the temperature reference (fixed at 9 °C by default).

use tracing::warn;

/// Window over which net-demand quantiles are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantilePolicy {
    /// One quantile pair over the entire provided series.
    WholeSeries,
    /// Quantiles over the `window_days` values ending at each day (inclusive),
    /// pre-season history first.
    ///
    /// Until history and season together fill a window, a day uses every
    /// value up to and including itself. Later days never contribute.
    Trailing { window_days: usize },
}

/// Source of the temperature reference used in the exponential correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureReference {
    /// Constant reference temperature (°C).
    Fixed(f64),
    /// Trailing percentile of the forward-filled temperature series.
    TrailingPercentile { window_days: usize, quantile: f64 },
}

/// Temperature reference of the historical calibration.
pub const DEFAULT_TEMPERATURE_REFERENCE: f64 = 9.0;
pub const DEFAULT_GAMMA: f64 = -0.1176;
pub const DEFAULT_KAPPA: f64 = 8.3042;

/// Parameters of the normalization stage.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationParams {
    /// Lower net-demand quantile (0.4).
    pub low_quantile: f64,
    /// Upper net-demand quantile (0.8).
    pub high_quantile: f64,
    /// Exponential temperature sensitivity.
    pub gamma: f64,
    /// Temperature pivot (°C).
    pub kappa: f64,
    pub quantile_policy: QuantilePolicy,
    pub temperature_reference: TemperatureReference,
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self {
            low_quantile: 0.4,
            high_quantile: 0.8,
            gamma: DEFAULT_GAMMA,
            kappa: DEFAULT_KAPPA,
            quantile_policy: QuantilePolicy::WholeSeries,
            temperature_reference: TemperatureReference::Fixed(DEFAULT_TEMPERATURE_REFERENCE),
        }
    }
}

/// Normalization inputs and result for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedDay {
    pub net_demand: f64,
    pub low_quantile: f64,
    pub high_quantile: f64,
    pub temperature_reference: f64,
    pub score: f64,
}

/// Linear-interpolated quantile of the non-NaN values.
///
/// Uses the position `(n - 1) * q` between order statistics. Returns NaN if
/// no finite-or-infinite (non-NaN) value is present.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Trailing-window quantile for each position.
///
/// Position `i` uses `values[i + 1 - window_days ..= i]`, or every value up
/// to `i` while fewer than `window_days` are available.
pub fn trailing_quantile(values: &[f64], window_days: usize, q: f64) -> Vec<f64> {
    let window = window_days.max(1);
    (0..values.len())
        .map(|end| quantile(&values[(end + 1).saturating_sub(window)..=end], q))
        .collect()
}

/// Replaces each NaN with the last preceding non-NaN value.
fn forward_fill(values: &[f64]) -> Vec<f64> {
    let mut last = f64::NAN;
    values
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                last = v;
            }
            last
        })
        .collect()
}

/// Replaces each NaN with the next following non-NaN value, then forward-fills the tail.
fn back_then_forward_fill(values: &[f64]) -> Vec<f64> {
    let mut filled = values.to_vec();
    let mut next = f64::NAN;
    for v in filled.iter_mut().rev() {
        if v.is_nan() {
            *v = next;
        } else {
            next = *v;
        }
    }
    forward_fill(&filled)
}

impl QuantilePolicy {
    /// Per-day quantile `q` of `values`, one entry per value.
    ///
    /// `history` holds the days right before `values`; only the trailing
    /// policy reads it.
    pub fn per_day(&self, history: &[f64], values: &[f64], q: f64) -> Vec<f64> {
        match *self {
            QuantilePolicy::WholeSeries => vec![quantile(values, q); values.len()],
            QuantilePolicy::Trailing { window_days } => {
                let joined = [history, values].concat();
                trailing_quantile(&joined, window_days, q).split_off(history.len())
            }
        }
    }

    fn window_days(&self) -> Option<usize> {
        match *self {
            QuantilePolicy::WholeSeries => None,
            QuantilePolicy::Trailing { window_days } => Some(window_days),
        }
    }
}

impl TemperatureReference {
    /// Per-day reference temperature, one entry per value of `temperatures`.
    pub fn per_day(&self, history: &[f64], temperatures: &[f64]) -> Vec<f64> {
        match *self {
            TemperatureReference::Fixed(t) => vec![t; temperatures.len()],
            TemperatureReference::TrailingPercentile {
                window_days,
                quantile: q,
            } => {
                let filled = forward_fill(&[history, temperatures].concat());
                let raw = trailing_quantile(&filled, window_days, q);
                back_then_forward_fill(&raw).split_off(history.len())
            }
        }
    }

    fn window_days(&self) -> Option<usize> {
        match *self {
            TemperatureReference::Fixed(_) => None,
            TemperatureReference::TrailingPercentile { window_days, .. } => Some(window_days),
        }
    }
}

/// Normalized score for one day.
pub fn normalized_score(
    net_demand: f64,
    low_quantile: f64,
    high_quantile: f64,
    temperature_reference: f64,
    gamma: f64,
    kappa: f64,
) -> f64 {
    let scale = (high_quantile - low_quantile) * (gamma * (kappa - temperature_reference)).exp();
    (net_demand - low_quantile) / scale
}

/// Normalizes a net-demand series without pre-season history.
///
/// `net_demand` and `temperatures` must have the same length (one value per
/// day). Division by a zero quantile spread yields ±infinity or NaN, never a
/// panic.
pub fn normalize(
    net_demand: &[f64],
    temperatures: &[f64],
    params: &NormalizationParams,
) -> Vec<NormalizedDay> {
    normalize_with_history(&[], &[], net_demand, temperatures, params)
}

/// Normalizes a net-demand series, feeding trailing windows with the days
/// that precede it.
///
/// `history_net_demand` and `history_temperatures` cover the same days,
/// ending the day before the first value of `net_demand`. Only the season
/// days are returned.
pub fn normalize_with_history(
    history_net_demand: &[f64],
    history_temperatures: &[f64],
    net_demand: &[f64],
    temperatures: &[f64],
    params: &NormalizationParams,
) -> Vec<NormalizedDay> {
    let available = history_net_demand.len() + net_demand.len();
    let widest = [
        params.quantile_policy.window_days(),
        params.temperature_reference.window_days(),
    ]
    .into_iter()
    .flatten()
    .max();
    if let Some(window_days) = widest.filter(|w| available < *w) {
        warn!(
            history = history_net_demand.len(),
            rows = net_demand.len(),
            window_days,
            "history shorter than trailing window, leading days use partial windows"
        );
    }

    let policy = params.quantile_policy;
    let low = policy.per_day(history_net_demand, net_demand, params.low_quantile);
    let high = policy.per_day(history_net_demand, net_demand, params.high_quantile);
    let t_ref = params
        .temperature_reference
        .per_day(history_temperatures, temperatures);

    net_demand
        .iter()
        .enumerate()
        .map(|(i, &net)| {
            let t = t_ref.get(i).copied().unwrap_or(f64::NAN);
            NormalizedDay {
                net_demand: net,
                low_quantile: low[i],
                high_quantile: high[i],
                temperature_reference: t,
                score: normalized_score(net, low[i], high[i], t, params.gamma, params.kappa),
            }
        })
        .collect()
}
