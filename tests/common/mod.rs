//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::NaiveDate;
use tempo_forecast::config::SyntheticConfig;
use tempo_forecast::logging;
use tempo_forecast::synthetic::{SeasonGenerator, SyntheticSeason};
use tempo_forecast::tempo::{DailyRecord, Quota, Season, TempoColor};

/// The 2023/2024 season (1 September 2023 to 31 August 2024, 366 days).
pub fn season() -> Season {
    logging::init_test();
    Season::starting_in(2023).expect("valid season")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// One record per season day with the given net demand, no renewables,
/// and temperature at the fixed reference.
pub fn records_with_net_demand(net: impl Fn(usize, NaiveDate) -> f64) -> Vec<DailyRecord> {
    season()
        .days()
        .enumerate()
        .map(|(i, d)| DailyRecord::new(d, net(i, d), 0.0, 0.0, 9.0))
        .collect()
}

/// Mildly varying net demand around 50 GW, repeating weekly.
pub fn weekly_pattern(i: usize, _date: NaiveDate) -> f64 {
    50_000.0 + (i % 7) as f64 * 100.0
}

/// Marks the given dates with a known color.
pub fn with_known(records: &mut [DailyRecord], dates: &[NaiveDate], color: TempoColor) {
    for r in records.iter_mut() {
        if dates.contains(&r.date) {
            r.known_color = Some(color);
        }
    }
}

/// Synthetic season with default parameters and the given history length.
pub fn synthetic_season(seed: u64, known_days: usize) -> SyntheticSeason {
    let config = SyntheticConfig {
        seed,
        known_days,
        ..SyntheticConfig::default()
    };
    SeasonGenerator::new(season(), Quota::default(), &config).generate()
}
