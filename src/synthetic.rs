//! Seeded synthetic season: weather, consumption, production and reference colors.

use std::f64::consts::PI;

use chrono::{Datelike, Days, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::config::SyntheticConfig;
use crate::error::Result;
use crate::production::{ProductionModel, RenewableOutput, WeatherObservation};
use crate::tempo::season::{Quota, Season, is_sunday, is_weekend};
use crate::tempo::types::{DailyRecord, TempoColor};

/// Wind output per (m/s)³ of the reference fleet (MW).
pub const WIND_MW_PER_CUBIC_SPEED: f64 = 23.0;
/// Solar output per W/m² of the reference fleet (MW).
pub const SOLAR_MW_PER_FLUX: f64 = 15.0;

/// Persistence of the daily temperature anomaly.
const TEMPERATURE_PERSISTENCE: f64 = 0.7;
/// Relative noise on realized renewable output.
const PRODUCTION_NOISE: f64 = 0.05;

// Day-of-year phases of the seasonal cycles.
const WARMEST_DAY: f64 = 200.0;
const WINDIEST_DAY: f64 = 15.0;
const SUNNIEST_DAY: f64 = 172.0;

/// Draws zero-mean Gaussian noise with the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}

/// Cosine of the annual cycle, `1.0` on day-of-year `peak_day`.
fn annual_cycle(date: NaiveDate, peak_day: f64) -> f64 {
    (2.0 * PI * (f64::from(date.ordinal()) - peak_day) / 365.25).cos()
}

/// Reference fleet used to turn synthetic weather into production.
pub fn reference_production_model() -> ProductionModel {
    ProductionModel::from_coefficients(
        vec![0.0, 0.0, WIND_MW_PER_CUBIC_SPEED],
        vec![SOLAR_MW_PER_FLUX],
    )
}

/// A generated season.
#[derive(Debug, Clone)]
pub struct SyntheticSeason {
    pub season: Season,
    /// One record per calendar day; only the first `known_days` carry a color.
    pub records: Vec<DailyRecord>,
    /// Reference color of every day, revealed or not.
    pub reference_colors: Vec<TempoColor>,
    /// Single-region weather of every day.
    pub weather: Vec<WeatherObservation>,
    /// Realized days right before the season, without colors.
    pub history: Vec<DailyRecord>,
}

impl SyntheticSeason {
    /// Number of leading days with a revealed color.
    pub fn known_days(&self) -> usize {
        self.records
            .iter()
            .take_while(|r| r.known_color.is_some())
            .count()
    }

    /// Realized wind and solar output per day.
    pub fn realized_production(&self) -> Vec<RenewableOutput> {
        self.records
            .iter()
            .map(|r| RenewableOutput {
                wind: r.wind_production,
                solar: r.solar_production,
            })
            .collect()
    }

    /// Fits a production model on the revealed history and replaces every
    /// day's wind and solar figures by the model's forecast.
    ///
    /// # Errors
    ///
    /// Returns a model error if there is no history to fit on.
    pub fn with_production_forecast(&self) -> Result<(ProductionModel, Vec<DailyRecord>)> {
        let history = self.known_days();
        let realized = self.realized_production();
        let model = ProductionModel::fit(&self.weather[..history], &realized[..history])?;
        let records = self
            .records
            .iter()
            .zip(model.predict(&self.weather))
            .map(|(r, forecast)| DailyRecord {
                wind_production: forecast.wind,
                solar_production: forecast.solar,
                ..r.clone()
            })
            .collect();
        Ok((model, records))
    }
}

/// Deterministic generator of a full season of daily records.
#[derive(Debug, Clone)]
pub struct SeasonGenerator {
    config: SyntheticConfig,
    season: Season,
    quota: Quota,
    production: ProductionModel,
    rng: StdRng,
}

impl SeasonGenerator {
    pub fn new(season: Season, quota: Quota, config: &SyntheticConfig) -> Self {
        Self {
            config: config.clone(),
            season,
            quota,
            production: reference_production_model(),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Generates the pre-season history, then every day of the season.
    pub fn generate(&mut self) -> SyntheticSeason {
        let start = self.season.start();
        let history_dates: Vec<NaiveDate> = start
            .checked_sub_days(Days::new(self.config.history_days as u64))
            .map_or_else(Vec::new, |first| {
                first.iter_days().take_while(|d| *d < start).collect()
            });
        let dates: Vec<NaiveDate> = self.season.days().collect();

        let mut anomaly = 0.0;
        let history: Vec<DailyRecord> = history_dates
            .iter()
            .map(|&date| self.simulate_day(date, &mut anomaly).0)
            .collect();

        let mut records = Vec::with_capacity(dates.len());
        let mut weather = Vec::with_capacity(dates.len());
        for &date in &dates {
            let (record, observation) = self.simulate_day(date, &mut anomaly);
            records.push(record);
            weather.push(observation);
        }

        let known_days = self.config.known_days;
        let net: Vec<f64> = records
            .iter()
            .map(|r| r.forecast_consumption - r.wind_production - r.solar_production)
            .collect();
        let reference_colors = assign_reference_colors(&self.season, self.quota, &dates, &net);
        for (i, (record, color)) in records.iter_mut().zip(&reference_colors).enumerate() {
            if i < known_days {
                record.known_color = Some(*color);
            }
        }

        info!(
            season_start = %start,
            days = records.len(),
            history_days = history.len(),
            known_days = known_days.min(records.len()),
            seed = self.config.seed,
            "generated synthetic season"
        );
        SyntheticSeason {
            season: self.season,
            records,
            reference_colors,
            weather,
            history,
        }
    }

    /// Weather, consumption and realized production of one day.
    ///
    /// `anomaly` carries the temperature anomaly from one day to the next.
    fn simulate_day(
        &mut self,
        date: NaiveDate,
        anomaly: &mut f64,
    ) -> (DailyRecord, WeatherObservation) {
        let c = &self.config;
        let shock = gaussian_noise(&mut self.rng, c.temperature_noise_c);
        *anomaly = TEMPERATURE_PERSISTENCE * *anomaly + shock;
        let temperature =
            c.mean_temperature_c + c.temperature_amplitude_c * annual_cycle(date, WARMEST_DAY)
                + *anomaly;

        let heating = c.heating_mw_per_degree * (c.heating_threshold_c - temperature).max(0.0);
        let mut consumption = c.base_consumption_mw + heating;
        if is_weekend(date) {
            consumption *= c.weekend_factor;
        }
        consumption += gaussian_noise(&mut self.rng, c.consumption_noise_mw);

        let wind_speed = (c.mean_wind_speed
            + 1.5 * annual_cycle(date, WINDIEST_DAY)
            + gaussian_noise(&mut self.rng, c.wind_speed_noise))
        .max(0.0);
        let clearness: f64 = self.rng.random_range(0.4..1.0);
        let sun_flux =
            c.peak_sun_flux * (0.6 + 0.4 * annual_cycle(date, SUNNIEST_DAY)) * clearness;

        let observation = WeatherObservation::new(vec![wind_speed], vec![sun_flux]);
        let output = self.production.predict_one(&observation);
        let wind =
            (output.wind * (1.0 + gaussian_noise(&mut self.rng, PRODUCTION_NOISE))).max(0.0);
        let solar =
            (output.solar * (1.0 + gaussian_noise(&mut self.rng, PRODUCTION_NOISE))).max(0.0);

        (
            DailyRecord::new(date, consumption, wind, solar, temperature),
            observation,
        )
    }
}

/// Colors the highest net-demand days under the calendar and quota rules.
///
/// Red goes to the highest weekdays inside the red window, up to the red
/// quota; white to the highest remaining non-Sunday days, up to the white
/// quota; every other day is blue.
pub fn assign_reference_colors(
    season: &Season,
    quota: Quota,
    dates: &[NaiveDate],
    net_demand: &[f64],
) -> Vec<TempoColor> {
    let mut order: Vec<usize> = (0..dates.len().min(net_demand.len())).collect();
    order.sort_by(|&a, &b| net_demand[b].total_cmp(&net_demand[a]).then(a.cmp(&b)));

    let mut colors = vec![TempoColor::Blue; dates.len()];
    let mut reds = 0;
    for &i in &order {
        if reds >= quota.red {
            break;
        }
        if season.is_red_allowed(dates[i]) && !is_weekend(dates[i]) {
            colors[i] = TempoColor::Red;
            reds += 1;
        }
    }
    let mut whites = 0;
    for &i in &order {
        if whites >= quota.white {
            break;
        }
        if colors[i] == TempoColor::Blue && !is_sunday(dates[i]) {
            colors[i] = TempoColor::White;
            whites += 1;
        }
    }
    debug!(reds, whites, "assigned reference colors");
    colors
}
