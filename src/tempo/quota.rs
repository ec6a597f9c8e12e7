//! Remaining red/white quota ("stock") before each day of the season.

use super::season::Quota;
use super::types::{DailyRecord, TempoColor};

/// Quota state in effect at the start of one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyStock {
    /// 1-based position of the day in the season's record sequence.
    pub day_index: usize,
    /// Red days left before this day's color is decided.
    pub red: i32,
    /// White days left before this day's color is decided.
    pub white: i32,
}

impl DailyStock {
    /// Combined white + red stock.
    pub fn white_red(&self) -> i32 {
        self.red + self.white
    }
}

/// Tracks quota depletion from realized colors only.
///
/// Depletion is strictly causal: the stock of a day counts known colors
/// of the days before it, never the day itself, and never predictions.
/// Days without a known color leave the stock unchanged.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    quota: Quota,
}

impl QuotaTracker {
    pub fn new(quota: Quota) -> Self {
        Self { quota }
    }

    /// Stock before each record, in input order.
    pub fn track(&self, records: &[DailyRecord]) -> Vec<DailyStock> {
        let mut red_used = 0;
        let mut white_used = 0;
        let mut stocks = Vec::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            stocks.push(DailyStock {
                day_index: i + 1,
                red: self.quota.red - red_used,
                white: self.quota.white - white_used,
            });
            match record.known_color {
                Some(TempoColor::Red) => red_used += 1,
                Some(TempoColor::White) => white_used += 1,
                Some(TempoColor::Blue) | None => {}
            }
        }
        stocks
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(Quota::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn records(colors: &[Option<TempoColor>]) -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2023, 9, 1).expect("valid date");
        colors
            .iter()
            .zip(start.iter_days())
            .map(|(c, d)| DailyRecord::new(d, 1.0, 0.0, 0.0, 10.0).with_known_color(*c))
            .collect()
    }

    #[test]
    fn first_day_has_full_quota() {
        let stocks = QuotaTracker::default().track(&records(&[Some(TempoColor::Red)]));
        assert_eq!(stocks[0].red, 22);
        assert_eq!(stocks[0].white, 43);
        assert_eq!(stocks[0].white_red(), 65);
        assert_eq!(stocks[0].day_index, 1);
    }

    #[test]
    fn stock_decrements_on_the_day_after_a_known_color() {
        use TempoColor::{Blue, Red, White};
        let stocks = QuotaTracker::default().track(&records(&[
            Some(Red),
            Some(White),
            None,
            Some(Blue),
            Some(Red),
            None,
        ]));
        let red: Vec<i32> = stocks.iter().map(|s| s.red).collect();
        let white: Vec<i32> = stocks.iter().map(|s| s.white).collect();
        assert_eq!(red, vec![22, 21, 21, 21, 21, 20]);
        assert_eq!(white, vec![43, 43, 42, 42, 42, 42]);
        let idx: Vec<usize> = stocks.iter().map(|s| s.day_index).collect();
        assert_eq!(idx, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn over_quota_history_goes_negative() {
        let tracker = QuotaTracker::new(Quota { red: 1, white: 0 });
        let stocks = tracker.track(&records(&[
            Some(TempoColor::Red),
            Some(TempoColor::Red),
            Some(TempoColor::White),
            None,
        ]));
        assert_eq!(stocks[3].red, -1);
        assert_eq!(stocks[3].white, -1);
    }
}
