//! Turning available cash and volatility into a share count.

pub mod atr_risk;

pub use atr_risk::AtrRiskSizer;

/// Decides how many whole shares an entry buys and where its stop sits.
///
/// Sizers never decide whether to enter, and never check affordability:
/// the simulator does both.
pub trait Sizer: Send + Sync {
    /// Whole shares to buy, zero to skip. `atr` is `None` during warmup.
    fn size(&self, cash: f64, close: f64, atr: Option<f64>) -> u64;

    /// How far below the entry close the protective stop is placed.
    fn stop_distance(&self, atr: f64) -> f64;
}
