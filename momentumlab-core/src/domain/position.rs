use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position.
///
/// Owned by the simulator's portfolio from entry until exit. Share counts are
/// whole numbers; the stop is fixed at entry and never moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub stop_price: f64,
}

impl Position {
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.shares as f64 * current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.entry_price
    }

    /// True when `close` has reached or crossed the stop.
    pub fn is_stopped_out(&self, close: f64) -> bool {
        close <= self.stop_price
    }
}
