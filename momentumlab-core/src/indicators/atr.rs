//! Average true range: trailing simple mean of true range.
//!
//! The first bar has no previous close and contributes no true range, so
//! `atr_14` is first defined on the 15th bar.

use super::rolling::rolling_mean;
use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Largest of the bar's range and its gaps against the previous close.
fn bar_true_range(prev_close: f64, bar: &Bar) -> f64 {
    let range = bar.high - bar.low;
    let up_gap = (bar.high - prev_close).abs();
    let down_gap = (bar.low - prev_close).abs();
    range.max(up_gap).max(down_gap)
}

/// True range per bar; NaN on the first bar.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    if bars.is_empty() {
        return Vec::new();
    }
    std::iter::once(f64::NAN)
        .chain(
            bars.windows(2)
                .map(|pair| bar_true_range(pair[0].close, &pair[1])),
        )
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_defined(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&true_range(bars), self.period, self.period)
    }
}
