//! TOML-based predictor configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::tempo::normalization::{
    DEFAULT_GAMMA, DEFAULT_KAPPA, DEFAULT_TEMPERATURE_REFERENCE, NormalizationParams,
    QuantilePolicy, TemperatureReference,
};
use crate::tempo::pipeline::PredictorParams;
use crate::tempo::season::{Quota, RED_QUOTA, Season, WHITE_QUOTA};
use crate::tempo::threshold::{ThresholdLine, ThresholdParams};

/// Top-level predictor configuration parsed from TOML.
///
/// All fields have defaults matching the historical calibration. Load from
/// TOML with [`PredictorConfig::from_toml_file`] or use
/// [`PredictorConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictorConfig {
    /// Season boundaries and quotas.
    #[serde(default)]
    pub season: SeasonConfig,
    /// Net-demand normalization.
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// Red and white+red threshold curves.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Synthetic season used by the command-line demo.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

/// Season boundaries and quotas.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonConfig {
    /// Year in which the season starts (1 September).
    pub start_year: i32,
    /// Red days allowed in the season.
    pub red_quota: i32,
    /// White days allowed in the season.
    pub white_quota: i32,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            start_year: 2023,
            red_quota: RED_QUOTA,
            white_quota: WHITE_QUOTA,
        }
    }
}

/// Net-demand normalization parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    /// Quantile window: `"whole_series"` or `"trailing"`.
    pub quantile_window: String,
    /// Trailing window length in days (used by `"trailing"`).
    pub window_days: usize,
    /// Lower net-demand quantile (0.0–1.0).
    pub low_quantile: f64,
    /// Upper net-demand quantile (0.0–1.0).
    pub high_quantile: f64,
    /// Temperature reference: `"fixed"` or `"trailing_percentile"`.
    pub temperature_reference: String,
    /// Reference temperature (°C) used by `"fixed"`.
    pub fixed_temperature: f64,
    /// Trailing window length in days used by `"trailing_percentile"`.
    pub temperature_window_days: usize,
    /// Temperature percentile (0.0–1.0) used by `"trailing_percentile"`.
    pub temperature_quantile: f64,
    /// Exponential temperature sensitivity.
    pub gamma: f64,
    /// Temperature pivot (°C).
    pub kappa: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            quantile_window: "whole_series".to_string(),
            window_days: 365,
            low_quantile: 0.4,
            high_quantile: 0.8,
            temperature_reference: "fixed".to_string(),
            fixed_temperature: DEFAULT_TEMPERATURE_REFERENCE,
            temperature_window_days: 365,
            temperature_quantile: 0.3,
            gamma: DEFAULT_GAMMA,
            kappa: DEFAULT_KAPPA,
        }
    }
}

/// Threshold curve coefficients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    pub red_intercept: f64,
    pub red_day_slope: f64,
    pub red_stock_slope: f64,
    pub white_red_intercept: f64,
    pub white_red_day_slope: f64,
    pub white_red_stock_slope: f64,
    /// Threshold applied once a stock reaches zero.
    pub exhausted_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let defaults = ThresholdParams::default();
        Self {
            red_intercept: defaults.red.intercept,
            red_day_slope: defaults.red.day_slope,
            red_stock_slope: defaults.red.stock_slope,
            white_red_intercept: defaults.white_red.intercept,
            white_red_day_slope: defaults.white_red.day_slope,
            white_red_stock_slope: defaults.white_red.stock_slope,
            exhausted_threshold: defaults.exhausted,
        }
    }
}

/// Synthetic season parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Master random seed.
    pub seed: u64,
    /// Leading days of the season whose color is revealed as history.
    pub known_days: usize,
    /// Days simulated before the season to feed trailing windows.
    pub history_days: usize,
    /// Mean daily consumption above the heating contribution (MW).
    pub base_consumption_mw: f64,
    /// Extra consumption per degree below `heating_threshold_c` (MW/°C).
    pub heating_mw_per_degree: f64,
    /// Temperature below which heating kicks in (°C).
    pub heating_threshold_c: f64,
    /// Multiplier applied to weekend consumption (0.0–1.0).
    pub weekend_factor: f64,
    /// Gaussian noise on consumption (MW).
    pub consumption_noise_mw: f64,
    /// Annual mean temperature (°C).
    pub mean_temperature_c: f64,
    /// Half peak-to-peak seasonal temperature swing (°C).
    pub temperature_amplitude_c: f64,
    /// Gaussian noise on temperature (°C).
    pub temperature_noise_c: f64,
    /// Mean wind speed (m/s).
    pub mean_wind_speed: f64,
    /// Gaussian noise on wind speed (m/s).
    pub wind_speed_noise: f64,
    /// Peak seasonal solar flux (W/m²).
    pub peak_sun_flux: f64,
}

// Calibrated so that a season predicted without revealed colors lands
// near the red quota under the default thresholds.
impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            known_days: 120,
            history_days: 365,
            base_consumption_mw: 45_000.0,
            heating_mw_per_degree: 1_200.0,
            heating_threshold_c: 12.0,
            weekend_factor: 0.9,
            consumption_noise_mw: 6_000.0,
            mean_temperature_c: 12.5,
            temperature_amplitude_c: 4.0,
            temperature_noise_c: 3.0,
            mean_wind_speed: 8.0,
            wind_speed_noise: 3.0,
            peak_sun_flux: 300.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"normalization.low_quantile"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl PredictorConfig {
    /// Returns the baseline configuration: whole-series quantiles, fixed temperature reference.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the rolling preset: trailing 365-day quantiles and temperature percentile.
    pub fn rolling() -> Self {
        Self {
            normalization: NormalizationConfig {
                quantile_window: "trailing".to_string(),
                temperature_reference: "trailing_percentile".to_string(),
                ..NormalizationConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the late-season preset: most of the winter already realized.
    pub fn late_season() -> Self {
        Self {
            synthetic: SyntheticConfig {
                known_days: 200,
                ..SyntheticConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "rolling", "late_season"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "rolling" => Ok(Self::rolling()),
            "late_season" => Ok(Self::late_season()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.season;
        if Season::starting_in(s.start_year).is_err() {
            errors.push(ConfigError::new(
                "season.start_year",
                format!("{} is not a representable year", s.start_year),
            ));
        }
        if s.red_quota < 0 {
            errors.push(ConfigError::new("season.red_quota", "must be >= 0"));
        }
        if s.white_quota < 0 {
            errors.push(ConfigError::new("season.white_quota", "must be >= 0"));
        }

        let n = &self.normalization;
        if n.quantile_window != "whole_series" && n.quantile_window != "trailing" {
            errors.push(ConfigError::new(
                "normalization.quantile_window",
                format!(
                    "must be \"whole_series\" or \"trailing\", got \"{}\"",
                    n.quantile_window
                ),
            ));
        }
        if n.window_days == 0 {
            errors.push(ConfigError::new("normalization.window_days", "must be > 0"));
        }
        for (field, q) in [
            ("normalization.low_quantile", n.low_quantile),
            ("normalization.high_quantile", n.high_quantile),
            ("normalization.temperature_quantile", n.temperature_quantile),
        ] {
            if !(0.0..=1.0).contains(&q) {
                errors.push(ConfigError::new(field, "must be in [0.0, 1.0]"));
            }
        }
        if n.low_quantile >= n.high_quantile {
            errors.push(ConfigError::new(
                "normalization.low_quantile",
                "must be < normalization.high_quantile",
            ));
        }
        if n.temperature_reference != "fixed" && n.temperature_reference != "trailing_percentile" {
            errors.push(ConfigError::new(
                "normalization.temperature_reference",
                format!(
                    "must be \"fixed\" or \"trailing_percentile\", got \"{}\"",
                    n.temperature_reference
                ),
            ));
        }
        if n.temperature_window_days == 0 {
            errors.push(ConfigError::new(
                "normalization.temperature_window_days",
                "must be > 0",
            ));
        }
        for (field, v) in [
            ("normalization.fixed_temperature", n.fixed_temperature),
            ("normalization.gamma", n.gamma),
            ("normalization.kappa", n.kappa),
        ] {
            if !v.is_finite() {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }

        let t = &self.thresholds;
        for (field, v) in [
            ("thresholds.red_intercept", t.red_intercept),
            ("thresholds.red_day_slope", t.red_day_slope),
            ("thresholds.red_stock_slope", t.red_stock_slope),
            ("thresholds.white_red_intercept", t.white_red_intercept),
            ("thresholds.white_red_day_slope", t.white_red_day_slope),
            ("thresholds.white_red_stock_slope", t.white_red_stock_slope),
            ("thresholds.exhausted_threshold", t.exhausted_threshold),
        ] {
            if !v.is_finite() {
                errors.push(ConfigError::new(field, "must be finite"));
            }
        }

        let syn = &self.synthetic;
        if !(0.0..=1.0).contains(&syn.weekend_factor) {
            errors.push(ConfigError::new(
                "synthetic.weekend_factor",
                "must be in [0.0, 1.0]",
            ));
        }
        for (field, v) in [
            ("synthetic.consumption_noise_mw", syn.consumption_noise_mw),
            ("synthetic.temperature_noise_c", syn.temperature_noise_c),
            ("synthetic.wind_speed_noise", syn.wind_speed_noise),
            ("synthetic.mean_wind_speed", syn.mean_wind_speed),
            ("synthetic.peak_sun_flux", syn.peak_sun_flux),
        ] {
            if v < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        errors
    }

    /// Season described by `[season]`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the start year is not representable.
    pub fn season(&self) -> Result<Season, ConfigError> {
        Season::starting_in(self.season.start_year)
            .map_err(|e| ConfigError::new("season.start_year", e.to_string()))
    }

    /// Predictor parameters described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for unknown policy names.
    pub fn predictor_params(&self) -> Result<PredictorParams, ConfigError> {
        let n = &self.normalization;
        let quantile_policy = match n.quantile_window.as_str() {
            "whole_series" => QuantilePolicy::WholeSeries,
            "trailing" => QuantilePolicy::Trailing {
                window_days: n.window_days,
            },
            other => {
                return Err(ConfigError::new(
                    "normalization.quantile_window",
                    format!("unknown policy \"{other}\""),
                ));
            }
        };
        let temperature_reference = match n.temperature_reference.as_str() {
            "fixed" => TemperatureReference::Fixed(n.fixed_temperature),
            "trailing_percentile" => TemperatureReference::TrailingPercentile {
                window_days: n.temperature_window_days,
                quantile: n.temperature_quantile,
            },
            other => {
                return Err(ConfigError::new(
                    "normalization.temperature_reference",
                    format!("unknown reference \"{other}\""),
                ));
            }
        };

        let t = &self.thresholds;
        Ok(PredictorParams {
            quota: Quota {
                red: self.season.red_quota,
                white: self.season.white_quota,
            },
            normalization: NormalizationParams {
                low_quantile: n.low_quantile,
                high_quantile: n.high_quantile,
                gamma: n.gamma,
                kappa: n.kappa,
                quantile_policy,
                temperature_reference,
            },
            thresholds: ThresholdParams {
                red: ThresholdLine {
                    intercept: t.red_intercept,
                    day_slope: t.red_day_slope,
                    stock_slope: t.red_stock_slope,
                },
                white_red: ThresholdLine {
                    intercept: t.white_red_intercept,
                    day_slope: t.white_red_day_slope,
                    stock_slope: t.white_red_stock_slope,
                },
                exhausted: t.exhausted_threshold,
            },
        })
    }
}
