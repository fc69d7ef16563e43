use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio value at the close of one simulated date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub date: NaiveDate,
    /// Cash plus the market value of every open position.
    pub total_equity: f64,
    pub cash: f64,
}
