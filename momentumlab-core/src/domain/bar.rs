//! One day of OHLCV prices for one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar.
///
/// Loaders store a missing or non-numeric price as NaN rather than failing
/// the whole file; [`Bar::is_void`] flags those rows so validation can drop
/// them before indicators run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    fn prices(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// Any of open/high/low/close is NaN or infinite.
    pub fn is_void(&self) -> bool {
        self.prices().iter().any(|p| !p.is_finite())
    }

    /// All four prices are above zero. Meaningless on a void bar.
    pub fn has_positive_prices(&self) -> bool {
        self.prices().iter().all(|&p| p > 0.0)
    }
}
