//! Three-way color decision from score, thresholds, stock, and calendar.

use chrono::NaiveDate;

use super::quota::DailyStock;
use super::season::{Season, is_sunday, is_weekend};
use super::threshold::DailyThresholds;
use super::types::TempoColor;

/// Everything the classifier needs to decide one day.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput {
    pub date: NaiveDate,
    pub score: f64,
    pub stock: DailyStock,
    pub thresholds: DailyThresholds,
}

/// Candidate flags and final color of one day.
///
/// Exactly one of `red`, `white`, `blue` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub red: bool,
    pub white: bool,
    pub blue: bool,
}

impl Decision {
    pub fn color(&self) -> TempoColor {
        if self.red {
            TempoColor::Red
        } else if self.white {
            TempoColor::White
        } else {
            TempoColor::Blue
        }
    }
}

/// Rule-based tempo classifier bound to one season's calendar.
///
/// Score comparisons follow IEEE semantics: any comparison with NaN is
/// false, so a day with a NaN score is never a red or white candidate and
/// falls back to BLUE.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    season: Season,
}

impl Classifier {
    pub fn new(season: Season) -> Self {
        Self { season }
    }

    /// Decides the color of one day.
    pub fn classify(&self, input: &ClassifierInput) -> Decision {
        let red = input.score > input.thresholds.red
            && self.season.is_red_allowed(input.date)
            && !is_weekend(input.date)
            && input.stock.red >= 0;

        let white_red = input.score > input.thresholds.white_red;
        let white = white_red && !red && !is_sunday(input.date) && input.stock.white >= 0;

        Decision {
            red,
            white,
            blue: !(red || white),
        }
    }

    pub fn classify_all(&self, inputs: &[ClassifierInput]) -> Vec<Decision> {
        inputs.iter().map(|i| self.classify(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn classifier() -> Classifier {
        Classifier::new(Season::starting_in(2023).expect("valid season"))
    }

    fn input(date: NaiveDate, score: f64) -> ClassifierInput {
        ClassifierInput {
            date,
            score,
            stock: DailyStock {
                day_index: 100,
                red: 10,
                white: 20,
            },
            thresholds: DailyThresholds {
                red: 2.0,
                white_red: 1.0,
            },
        }
    }

    // 2024-01-16 is a Tuesday
    const TUESDAY: (i32, u32, u32) = (2024, 1, 16);

    #[test]
    fn high_score_weekday_in_winter_is_red() {
        let (y, m, d) = TUESDAY;
        let decision = classifier().classify(&input(date(y, m, d), 5.0));
        assert_eq!(decision.color(), TempoColor::Red);
        assert!(!decision.white && !decision.blue);
    }

    #[test]
    fn between_thresholds_is_white() {
        let (y, m, d) = TUESDAY;
        let decision = classifier().classify(&input(date(y, m, d), 1.5));
        assert_eq!(decision.color(), TempoColor::White);
    }

    #[test]
    fn low_score_is_blue() {
        let (y, m, d) = TUESDAY;
        let decision = classifier().classify(&input(date(y, m, d), 0.5));
        assert_eq!(decision.color(), TempoColor::Blue);
    }

    #[test]
    fn saturday_demotes_red_to_white() {
        let decision = classifier().classify(&input(date(2024, 1, 13), 5.0));
        assert_eq!(decision.color(), TempoColor::White);
    }

    #[test]
    fn sunday_is_always_blue() {
        let decision = classifier().classify(&input(date(2024, 1, 14), 5.0));
        assert_eq!(decision.color(), TempoColor::Blue);
    }

    #[test]
    fn outside_red_window_demotes_to_white() {
        // 2023-10-31 is a Tuesday, 2024-04-02 a Tuesday
        for d in [date(2023, 10, 31), date(2024, 4, 2)] {
            let decision = classifier().classify(&input(d, 5.0));
            assert_eq!(decision.color(), TempoColor::White, "{d}");
        }
    }

    #[test]
    fn negative_stock_blocks_color() {
        let (y, m, d) = TUESDAY;
        let mut i = input(date(y, m, d), 5.0);
        i.stock.red = -1;
        assert_eq!(classifier().classify(&i).color(), TempoColor::White);
        i.stock.white = -1;
        assert_eq!(classifier().classify(&i).color(), TempoColor::Blue);
    }

    #[test]
    fn nan_score_is_blue() {
        let (y, m, d) = TUESDAY;
        let decision = classifier().classify(&input(date(y, m, d), f64::NAN));
        assert_eq!(decision.color(), TempoColor::Blue);
        assert!(decision.blue);
    }

    #[test]
    fn infinite_score_compares_deterministically() {
        let (y, m, d) = TUESDAY;
        let c = classifier();
        assert_eq!(c.classify(&input(date(y, m, d), f64::INFINITY)).color(), TempoColor::Red);
        assert_eq!(
            c.classify(&input(date(y, m, d), f64::NEG_INFINITY)).color(),
            TempoColor::Blue
        );
    }
}
