//! Exponential moving average of close.
//!
//! `ema[0] = x[0]`, `ema[t] = α·x[t] + (1−α)·ema[t−1]` with α = 2/(span+1).
//! Seeded on the first value, so the series is defined from the first bar.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_defined(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ewm(&closes, self.span)
    }
}

/// Smoothing factor for a span.
pub fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Exponentially weighted mean of an arbitrary series (MACD smooths its own
/// line with this).
pub fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    let a = alpha(span);
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|&x| {
            let next = match state {
                None => x,
                Some(prev) => a * x + (1.0 - a) * prev,
            };
            state = Some(next);
            next
        })
        .collect()
}
