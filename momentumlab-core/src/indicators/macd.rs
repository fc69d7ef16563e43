//! Moving Average Convergence Divergence (MACD).
//!
//! Produces three series (exposed as separate Indicator instances):
//! - Line: EMA(fast) - EMA(slow)
//! - Signal: EMA(signal) of the line
//! - Histogram: line - signal
//!
//! All three inherit the EMA seeding, so they are defined from the first bar.

use super::ema::ewm;
use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Which MACD series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        let name = match line {
            MacdLine::Line => "macd".to_string(),
            MacdLine::Signal => "macd_signal".to_string(),
            MacdLine::Histogram => "macd_histogram".to_string(),
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name,
        }
    }

    /// Standard 12/26/9 configuration.
    pub fn standard(line: MacdLine) -> Self {
        Self::new(12, 26, 9, line)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_defined(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ewm(&closes, self.fast);
        let slow = ewm(&closes, self.slow);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        match self.line {
            MacdLine::Line => line,
            MacdLine::Signal => ewm(&line, self.signal),
            MacdLine::Histogram => {
                let signal = ewm(&line, self.signal);
                line.iter().zip(&signal).map(|(l, s)| l - s).collect()
            }
        }
    }
}
