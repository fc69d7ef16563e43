//! The momentum indicator set and the engine that folds it into records.
//!
//! | column | type |
//! |---|---|
//! | rsi_14 | [`Rsi`] |
//! | sma_50, sma_200, volume_ma_20 | [`Sma`] |
//! | ema_20 | [`Ema`] |
//! | macd, macd_signal, macd_histogram | [`Macd`], one instance per line |
//! | atr_14 | [`Atr`] |
//! | ath_1y, ath_2y, ath_5y, ath_all_time | [`RollingHigh`] |
//!
//! `IndicatorEngine` runs all of them over one instrument's history and
//! derives `distance_from_ath_5y` from the 5-year column.

pub mod ath;
pub mod atr;
pub mod ema;
pub mod macd;
pub mod record;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use ath::{distance_from_high, RollingHigh};
pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdLine};
pub use record::{IndicatorEngine, IndicatorRecord};
pub use rsi::Rsi;
pub use sma::{Sma, Source};

/// Test bars from a close path. Each bar opens at the previous close and
/// spans one point beyond its body on both sides; volume is fixed at 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let first = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let opens = closes.first().into_iter().chain(closes.iter()).copied();
    opens
        .zip(closes)
        .zip(first.iter_days())
        .map(|((open, &close), date)| crate::domain::Bar {
            symbol: "TEST".into(),
            date,
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

#[cfg(test)]
#[track_caller]
pub fn assert_approx(actual: f64, expected: f64, tol: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff < tol,
        "{actual} is not within {tol} of {expected} (off by {diff})"
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
