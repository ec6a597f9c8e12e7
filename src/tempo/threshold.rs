//! Day- and stock-dependent classification thresholds.

use super::quota::DailyStock;

/// Linear threshold `intercept + day_slope * (day_index - 1) + stock_slope * stock`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdLine {
    pub intercept: f64,
    pub day_slope: f64,
    pub stock_slope: f64,
}

impl ThresholdLine {
    /// Evaluates the line, replacing it with `exhausted` when `stock` is exactly zero.
    pub fn at(&self, day_index: usize, stock: i32, exhausted: f64) -> f64 {
        if stock == 0 {
            return exhausted;
        }
        let elapsed = day_index.saturating_sub(1) as f64;
        self.intercept + self.day_slope * elapsed + self.stock_slope * f64::from(stock)
    }
}

/// Coefficients of the red and white+red threshold curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    pub red: ThresholdLine,
    pub white_red: ThresholdLine,
    /// Threshold used once the corresponding stock reaches zero.
    pub exhausted: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            red: ThresholdLine {
                intercept: 3.15,
                day_slope: -0.010,
                stock_slope: -0.031,
            },
            white_red: ThresholdLine {
                intercept: 4.0,
                day_slope: -0.015,
                stock_slope: -0.026,
            },
            exhausted: 2.0,
        }
    }
}

/// Thresholds in effect for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyThresholds {
    pub red: f64,
    pub white_red: f64,
}

impl ThresholdParams {
    /// Thresholds for a day given its stock.
    pub fn for_day(&self, stock: &DailyStock) -> DailyThresholds {
        DailyThresholds {
            red: self.red.at(stock.day_index, stock.red, self.exhausted),
            white_red: self
                .white_red
                .at(stock.day_index, stock.white_red(), self.exhausted),
        }
    }

    pub fn for_season(&self, stocks: &[DailyStock]) -> Vec<DailyThresholds> {
        stocks.iter().map(|s| self.for_day(s)).collect()
    }
}
