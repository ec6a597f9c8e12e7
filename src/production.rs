//! Renewable production model: weather to wind and solar output.
//!
//! Both halves are intercept-free linear regressions with non-negative
//! coefficients. Wind uses each region's speed expanded to `(v, v², v³)`,
//! solar uses each region's flux as is.

use std::fs;
use std::path::Path;

use faer::{Mat, prelude::*, solvers::PartialPivLu};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TempoError};

const MAX_ITERATIONS: usize = 30;
const TOLERANCE: f64 = 1e-10;

/// Per-region weather of one day.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherObservation {
    /// Wind speed per region (m/s).
    pub wind_speeds: Vec<f64>,
    /// Solar flux per region (W/m²).
    pub sun_fluxes: Vec<f64>,
}

impl WeatherObservation {
    pub fn new(wind_speeds: Vec<f64>, sun_fluxes: Vec<f64>) -> Self {
        Self {
            wind_speeds,
            sun_fluxes,
        }
    }

    fn wind_features(&self) -> Vec<f64> {
        let v = &self.wind_speeds;
        v.iter()
            .copied()
            .chain(v.iter().map(|s| s.powi(2)))
            .chain(v.iter().map(|s| s.powi(3)))
            .collect()
    }
}

/// Realized or predicted renewable output of one day (MW).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenewableOutput {
    pub wind: f64,
    pub solar: f64,
}

/// Intercept-free linear model with non-negative coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonNegativeLinear {
    pub coefficients: Vec<f64>,
}

impl NonNegativeLinear {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Fits `targets ≈ features · b` subject to `b ≥ 0`.
    ///
    /// Active-set solve (Lawson-Hanson) on the column-scaled normal
    /// equations. Constant-zero features keep a zero weight.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::Model`] on empty input, ragged rows, or
    /// linearly dependent features.
    pub fn fit(features: &[Vec<f64>], targets: &[f64]) -> Result<Self> {
        if features.is_empty() {
            return Err(TempoError::Model("no training rows".to_owned()));
        }
        if features.len() != targets.len() {
            return Err(TempoError::Model(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        let width = features[0].len();
        if features.iter().any(|row| row.len() != width) {
            return Err(TempoError::Model("feature rows differ in width".to_owned()));
        }

        let mut gram = vec![vec![0.0; width]; width];
        let mut rhs = vec![0.0; width];
        for (row, &y) in features.iter().zip(targets) {
            for j in 0..width {
                rhs[j] += row[j] * y;
                for k in 0..width {
                    gram[j][k] += row[j] * row[k];
                }
            }
        }

        // unit diagonal keeps v, v², v³ on comparable scales
        let scale: Vec<f64> = (0..width)
            .map(|j| if gram[j][j] > 0.0 { gram[j][j].sqrt() } else { 1.0 })
            .collect();
        for j in 0..width {
            rhs[j] /= scale[j];
            for k in 0..width {
                gram[j][k] /= scale[j] * scale[k];
            }
        }

        let mut x = vec![0.0; width];
        let mut active = vec![false; width];
        let mut iterations = 0;
        while iterations < MAX_ITERATIONS * width.max(1) {
            iterations += 1;
            let gradient = residual_gradient(&gram, &rhs, &x);
            let entering = (0..width)
                .filter(|&j| !active[j] && gradient[j] > TOLERANCE)
                .max_by(|&a, &b| gradient[a].total_cmp(&gradient[b]));
            let Some(entering) = entering else {
                break;
            };
            active[entering] = true;

            // each pass drops at least one active coordinate
            for _ in 0..=width {
                let z = solve_active(&gram, &rhs, &active)?;
                if (0..width).all(|j| !active[j] || z[j] > 0.0) {
                    x = z;
                    break;
                }
                // step back to the boundary and drop the blocking coordinates
                let alpha = (0..width)
                    .filter(|&j| active[j] && z[j] <= 0.0 && x[j] - z[j] > 0.0)
                    .map(|j| x[j] / (x[j] - z[j]))
                    .fold(f64::INFINITY, f64::min);
                let alpha = if alpha.is_finite() { alpha } else { 0.0 };
                for j in 0..width {
                    x[j] += alpha * (z[j] - x[j]);
                    if active[j] && x[j] <= TOLERANCE {
                        active[j] = false;
                        x[j] = 0.0;
                    }
                }
            }
        }

        let coefficients = x.iter().zip(&scale).map(|(b, d)| b / d).collect();
        debug!(width, iterations, "fitted non-negative linear model");
        Ok(Self { coefficients })
    }

    /// Dot product of `features` with the coefficients.
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(b, x)| b * x)
            .sum()
    }
}

/// `rhs - gram · x`, the negative gradient of the least-squares loss.
fn residual_gradient(gram: &[Vec<f64>], rhs: &[f64], x: &[f64]) -> Vec<f64> {
    gram.iter()
        .zip(rhs)
        .map(|(row, c)| c - row.iter().zip(x).map(|(g, b)| g * b).sum::<f64>())
        .collect()
}

/// Unconstrained least squares restricted to the active coordinates.
///
/// Inactive coordinates are zero in the result.
fn solve_active(gram: &[Vec<f64>], rhs: &[f64], active: &[bool]) -> Result<Vec<f64>> {
    let index: Vec<usize> = (0..active.len()).filter(|&j| active[j]).collect();
    let n = index.len();
    let mut z = vec![0.0; active.len()];
    if n == 0 {
        return Ok(z);
    }

    let a = Mat::from_fn(n, n, |r, c| gram[index[r]][index[c]]);
    let b = Mat::from_fn(n, 1, |r, _| rhs[index[r]]);
    let lu = PartialPivLu::new(a.as_ref());
    let solution = lu.solve(&b);

    for (r, &j) in index.iter().enumerate() {
        let value = solution.read(r, 0);
        if !value.is_finite() {
            return Err(TempoError::Model(
                "features are linearly dependent".to_owned(),
            ));
        }
        z[j] = value;
    }
    Ok(z)
}

/// Paired wind and solar production model.
///
/// ```
/// use tempo_forecast::production::{ProductionModel, WeatherObservation};
///
/// let model = ProductionModel::from_coefficients(vec![0.0, 0.0, 2.0], vec![10.0]);
/// let out = model.predict_one(&WeatherObservation::new(vec![3.0], vec![50.0]));
/// assert_eq!(out.wind, 54.0);
/// assert_eq!(out.solar, 500.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionModel {
    pub wind: NonNegativeLinear,
    pub solar: NonNegativeLinear,
}

impl ProductionModel {
    /// Builds a model from raw coefficients.
    ///
    /// Wind coefficients are laid out as all linear terms, then all squares,
    /// then all cubes.
    pub fn from_coefficients(wind: Vec<f64>, solar: Vec<f64>) -> Self {
        Self {
            wind: NonNegativeLinear::new(wind),
            solar: NonNegativeLinear::new(solar),
        }
    }

    /// Fits both halves against realized production.
    ///
    /// # Errors
    ///
    /// Returns [`TempoError::Model`] if the inputs are empty or misaligned.
    pub fn fit(weather: &[WeatherObservation], productions: &[RenewableOutput]) -> Result<Self> {
        let wind_x: Vec<Vec<f64>> = weather.iter().map(WeatherObservation::wind_features).collect();
        let sun_x: Vec<Vec<f64>> = weather.iter().map(|w| w.sun_fluxes.clone()).collect();
        let wind_y: Vec<f64> = productions.iter().map(|p| p.wind).collect();
        let sun_y: Vec<f64> = productions.iter().map(|p| p.solar).collect();
        Ok(Self {
            wind: NonNegativeLinear::fit(&wind_x, &wind_y)?,
            solar: NonNegativeLinear::fit(&sun_x, &sun_y)?,
        })
    }

    pub fn predict_one(&self, weather: &WeatherObservation) -> RenewableOutput {
        RenewableOutput {
            wind: self.wind.predict(&weather.wind_features()),
            solar: self.solar.predict(&weather.sun_fluxes),
        }
    }

    pub fn predict(&self, weather: &[WeatherObservation]) -> Vec<RenewableOutput> {
        weather.iter().map(|w| self.predict_one(w)).collect()
    }

    /// Writes the model as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Reads a model previously written by [`ProductionModel::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
