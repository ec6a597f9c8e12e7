//! Season-level behavior of the tempo predictor.

mod common;

use chrono::{Datelike, Weekday};
use tempo_forecast::TempoError;
use tempo_forecast::config::PredictorConfig;
use tempo_forecast::evaluation::{ConfusionMatrix, OneHot};
use tempo_forecast::tempo::normalization::{NormalizationParams, QuantilePolicy, quantile};
use tempo_forecast::tempo::types::{
    FORECAST_CONSUMPTION, SOLAR_PRODUCTION, TEMPERATURE, WIND_PRODUCTION,
};
use tempo_forecast::tempo::{
    DailyPrediction, DailyRecord, InputTable, PredictorParams, TempoColor, TempoPredictor,
};

fn predict(records: &[DailyRecord], params: PredictorParams) -> Vec<DailyPrediction> {
    TempoPredictor::new(common::season(), records, params)
        .expect("valid records")
        .predict()
}

fn trailing_params() -> PredictorParams {
    PredictorParams {
        normalization: NormalizationParams {
            quantile_policy: QuantilePolicy::Trailing { window_days: 365 },
            ..Default::default()
        },
        ..PredictorParams::default()
    }
}

fn synthetic_predictions(preset: &str, known_days: usize) -> Vec<DailyPrediction> {
    let params = PredictorConfig::from_preset(preset)
        .and_then(|c| c.predictor_params())
        .expect("valid preset");
    let generated = common::synthetic_season(42, known_days);
    TempoPredictor::with_history(common::season(), &generated.history, &generated.records, params)
        .expect("valid records")
        .predict()
}

#[test]
fn exactly_one_color_per_day() {
    for preset in PredictorConfig::PRESETS {
        for p in synthetic_predictions(preset, 120) {
            let flags = [p.prediction_red, p.prediction_white, p.prediction_blue];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{preset}: {p}");
            assert_eq!(OneHot::from(&p).argmax(), p.predicted_color);
        }
    }
}

#[test]
fn predictions_keep_input_order() {
    let generated = common::synthetic_season(42, 120);
    let predictions = predict(&generated.records, PredictorParams::default());
    assert_eq!(predictions.len(), generated.records.len());
    for (p, r) in predictions.iter().zip(&generated.records) {
        assert_eq!(p.date, r.date);
        assert_eq!(p.known_color, r.known_color);
    }
}

#[test]
fn calendar_rules_hold_all_season() {
    let season = common::season();
    let (red_from, red_until) = season.red_window();
    assert_eq!(red_from, common::date(2023, 11, 1));
    assert_eq!(red_until, common::date(2024, 3, 31));

    for preset in ["baseline", "rolling"] {
        for p in synthetic_predictions(preset, 0) {
            let weekday = p.date.weekday();
            if p.prediction_red {
                assert!(weekday != Weekday::Sat && weekday != Weekday::Sun, "{p}");
                assert!(red_from <= p.date && p.date <= red_until, "{p}");
            }
            if weekday == Weekday::Sun {
                assert_eq!(p.predicted_color, TempoColor::Blue, "{p}");
            }
        }
    }
}

#[test]
fn stocks_only_drop_after_known_days_of_that_color() {
    let predictions = synthetic_predictions("baseline", 366);
    assert_eq!(predictions[0].stock_red, 22);
    assert_eq!(predictions[0].stock_white, 43);

    for pair in predictions.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let red_drop = prev.stock_red - next.stock_red;
        let white_drop = prev.stock_white - next.stock_white;
        let expected_red = i32::from(prev.known_color == Some(TempoColor::Red));
        let expected_white = i32::from(prev.known_color == Some(TempoColor::White));
        assert_eq!(red_drop, expected_red, "{}", next.date);
        assert_eq!(white_drop, expected_white, "{}", next.date);
    }
}

#[test]
fn exhausted_stock_pins_threshold_to_two() {
    let predictions = synthetic_predictions("baseline", 366);
    let mut exhausted_red_days = 0;
    for p in &predictions {
        if p.stock_red == 0 {
            exhausted_red_days += 1;
            assert_eq!(p.threshold_red, 2.0, "{p}");
        }
        if p.stock_red + p.stock_white == 0 {
            assert_eq!(p.threshold_white_red, 2.0, "{p}");
        }
    }
    // the whole red quota is revealed, so the stock reaches zero before summer
    assert!(exhausted_red_days > 0);
}

#[test]
fn consumed_red_quota_blocks_further_red_days() {
    let season = common::season();
    let quota_plus_one: Vec<_> = season
        .days()
        .filter(|d| *d >= common::date(2023, 11, 1))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(23)
        .collect();
    let spike = common::date(2024, 1, 16);
    let mut records = common::records_with_net_demand(|i, d| {
        if d == spike {
            1_000_000.0
        } else {
            common::weekly_pattern(i, d)
        }
    });
    common::with_known(&mut records, &quota_plus_one, TempoColor::Red);

    let predictions = predict(&records, PredictorParams::default());
    let day = predictions
        .iter()
        .find(|p| p.date == spike)
        .expect("spike day predicted");
    assert_eq!(day.stock_red, -1);
    assert!(!day.prediction_red);
    assert_eq!(day.predicted_color, TempoColor::White);
    assert!(
        predictions
            .iter()
            .filter(|p| p.stock_red < 0)
            .all(|p| !p.prediction_red)
    );
}

#[test]
fn january_tuesday_spike_is_red() {
    let spike = common::date(2024, 1, 16);
    assert_eq!(spike.weekday(), Weekday::Tue);
    let records = common::records_with_net_demand(|i, d| {
        if d == spike {
            1_000_000.0
        } else {
            common::weekly_pattern(i, d)
        }
    });
    let predictions = predict(&records, PredictorParams::default());
    let day = predictions
        .iter()
        .find(|p| p.date == spike)
        .expect("spike day predicted");
    assert_eq!(day.stock_red, 22);
    assert!((day.threshold_red - (3.15 - 0.010 * 137.0 - 0.031 * 22.0)).abs() < 1e-9);
    assert_eq!(day.predicted_color, TempoColor::Red);
}

#[test]
fn days_below_low_quantile_are_blue() {
    // Early season, where both thresholds are still positive.
    let records: Vec<DailyRecord> = common::records_with_net_demand(|i, _| 40_000.0 + i as f64 * 50.0)
        .into_iter()
        .take(60)
        .collect();
    let predictor = TempoPredictor::new(common::season(), &records, PredictorParams::default())
        .expect("valid records");
    let features = predictor.features();
    let predictions = predictor.predict();
    let mut below = 0;
    for (f, p) in features.iter().zip(&predictions) {
        if f.normalized.net_demand < f.normalized.low_quantile {
            below += 1;
            assert!(p.normalized_score < 0.0, "{p}");
            assert_eq!(p.predicted_color, TempoColor::Blue, "{p}");
        }
    }
    assert!(below > 0);
}

#[test]
fn constant_series_is_all_blue() {
    let records = common::records_with_net_demand(|_, _| 55_000.0);
    for p in predict(&records, PredictorParams::default()) {
        assert!(p.normalized_score.is_nan());
        assert_eq!(p.predicted_color, TempoColor::Blue, "{p}");
    }
}

#[test]
fn nan_day_is_blue_and_does_not_poison_neighbours() {
    let spike = common::date(2024, 1, 16);
    let hole = common::date(2024, 1, 17);
    let records = common::records_with_net_demand(|i, d| {
        if d == spike {
            1_000_000.0
        } else if d == hole {
            f64::NAN
        } else {
            common::weekly_pattern(i, d)
        }
    });
    let predictions = predict(&records, PredictorParams::default());
    for p in &predictions {
        if p.date == hole {
            assert_eq!(p.predicted_color, TempoColor::Blue);
        } else {
            assert!(p.normalized_score.is_finite(), "{p}");
        }
    }
    let spike_day = predictions.iter().find(|p| p.date == spike);
    assert_eq!(spike_day.map(|p| p.predicted_color), Some(TempoColor::Red));
}

#[test]
fn perfect_predictions_give_diagonal_matrix() {
    let predictions = synthetic_predictions("baseline", 120);
    let truth: Vec<Option<TempoColor>> = predictions.iter().map(|p| Some(p.predicted_color)).collect();
    let matrix = ConfusionMatrix::from_predictions(&truth, &predictions).expect("same length");
    assert!(matrix.is_diagonal());
    assert_eq!(matrix.total(), predictions.len());
    assert_eq!(matrix.matches(), predictions.len());
}

#[test]
fn short_series_uses_partial_trailing_windows() {
    let records: Vec<DailyRecord> = common::records_with_net_demand(common::weekly_pattern)
        .into_iter()
        .take(30)
        .collect();
    let predictor = TempoPredictor::new(common::season(), &records, trailing_params())
        .expect("valid records");
    let features = predictor.features();
    assert_eq!(features[0].normalized.low_quantile, records[0].forecast_consumption);
    let first_week: Vec<f64> = records[..7].iter().map(|r| r.forecast_consumption).collect();
    assert!(
        (features[6].normalized.low_quantile - quantile(&first_week, 0.4)).abs() < 1e-9
    );
}

#[test]
fn trailing_quantiles_only_see_past_days() {
    let generated = common::synthetic_season(42, 0);
    let full = TempoPredictor::with_history(
        common::season(),
        &generated.history,
        &generated.records,
        trailing_params(),
    )
    .expect("valid records");
    let partial = TempoPredictor::with_history(
        common::season(),
        &generated.history,
        &generated.records[..150],
        trailing_params(),
    )
    .expect("valid records");

    for (whole, cut) in full.features().iter().zip(partial.features()) {
        assert_eq!(whole.normalized, cut.normalized, "{}", whole.date);
    }

    let mut low: Vec<f64> = full
        .features()
        .iter()
        .map(|f| f.normalized.low_quantile)
        .collect();
    low.dedup();
    assert!(low.len() > 100, "q40 changed only {} times", low.len());

    let without_history =
        TempoPredictor::new(common::season(), &generated.records[..150], trailing_params())
            .expect("valid records");
    assert_ne!(
        without_history.features()[0].normalized.low_quantile,
        partial.features()[0].normalized.low_quantile
    );
}

#[test]
fn history_overlapping_the_season_is_rejected() {
    let generated = common::synthetic_season(42, 0);
    let result = TempoPredictor::with_history(
        common::season(),
        &generated.records[..10],
        &generated.records,
        PredictorParams::default(),
    );
    assert!(matches!(result, Err(TempoError::HistoryOverlap { .. })));
}

#[test]
fn unrevealed_seasons_stay_near_the_red_quota() {
    let quota = PredictorParams::default().quota;
    let seeds = 1..=8u64;
    let reds: Vec<usize> = seeds
        .map(|seed| {
            let generated = common::synthetic_season(seed, 0);
            predict(&generated.records, PredictorParams::default())
                .iter()
                .filter(|p| p.prediction_red)
                .count()
        })
        .collect();
    let mean = reds.iter().sum::<usize>() as f64 / reds.len() as f64;
    assert!(
        mean <= f64::from(quota.red) + 4.0,
        "mean predicted red {mean} over {reds:?}"
    );
}

#[test]
fn revealing_each_prediction_keeps_within_quota() {
    let quota = PredictorParams::default().quota;
    let mut records = common::synthetic_season(42, 0).records;
    for i in 0..records.len() {
        let predictor = TempoPredictor::new(common::season(), &records, PredictorParams::default())
            .expect("valid records");
        let color = predictor.predict()[i].predicted_color;
        records[i].known_color = Some(color);
    }
    let count = |color: TempoColor| {
        records
            .iter()
            .filter(|r| r.known_color == Some(color))
            .count()
    };
    // a zero stock still allows one more day at the exhausted threshold
    assert!(count(TempoColor::Red) <= quota.red as usize + 1);
    assert!(count(TempoColor::White) <= quota.white as usize + 1);
    assert!(count(TempoColor::Red) > 0);
}

#[test]
fn invalid_series_are_rejected() {
    let season = common::season();
    let mut records = common::records_with_net_demand(common::weekly_pattern);

    records.swap(10, 11);
    let result = TempoPredictor::new(season, &records, PredictorParams::default());
    assert!(matches!(result, Err(TempoError::UnorderedDates { .. })));

    let outside = vec![DailyRecord::new(common::date(2024, 9, 1), 1.0, 0.0, 0.0, 9.0)];
    let result = TempoPredictor::new(season, &outside, PredictorParams::default());
    assert!(matches!(result, Err(TempoError::OutsideSeason { .. })));
}

#[test]
fn table_input_reports_every_missing_column() {
    let dates: Vec<_> = common::season().days().take(3).collect();
    let table = InputTable::new(dates).with_column(FORECAST_CONSUMPTION, vec![1.0, 2.0, 3.0]);
    let result = TempoPredictor::from_table(common::season(), table, PredictorParams::default());
    match result {
        Err(TempoError::MissingColumns(columns)) => {
            for name in [WIND_PRODUCTION, SOLAR_PRODUCTION, TEMPERATURE] {
                assert!(columns.iter().any(|c| c == name), "{name} not reported");
            }
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn table_input_matches_record_input() {
    let records: Vec<DailyRecord> = common::synthetic_season(3, 40).records.into_iter().take(90).collect();
    let column = |f: fn(&DailyRecord) -> f64| records.iter().map(f).collect::<Vec<_>>();
    let table = InputTable::new(records.iter().map(|r| r.date).collect())
        .with_column(FORECAST_CONSUMPTION, column(|r| r.forecast_consumption))
        .with_column(WIND_PRODUCTION, column(|r| r.wind_production))
        .with_column(SOLAR_PRODUCTION, column(|r| r.solar_production))
        .with_column(TEMPERATURE, column(|r| r.temperature))
        .with_known_colors(records.iter().map(|r| r.known_color).collect());
    let from_table =
        TempoPredictor::from_table(common::season(), table, PredictorParams::default())
            .expect("complete table")
            .predict();
    assert_eq!(from_table, predict(&records, PredictorParams::default()));
}
