//! All-time-high family — trailing maximum of close.
//!
//! Windowed variants activate on a partial window once `min_periods` bars
//! are available (1y: 252 bars, active from 100; 2y: 504 from 200;
//! 5y: 1260 from 500). The all-time variant is the expanding maximum and
//! is defined from the first bar.

use super::rolling::{expanding_max, rolling_max};
use crate::components::indicator::Indicator;
use crate::domain::Bar;

/// Trading days per year used to size the ATH windows.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

#[derive(Debug, Clone)]
pub struct RollingHigh {
    /// `None` means unbounded (all-time).
    window: Option<usize>,
    min_periods: usize,
    name: String,
}

impl RollingHigh {
    pub fn new(name: impl Into<String>, window: usize, min_periods: usize) -> Self {
        assert!(window >= 1, "rolling high window must be >= 1");
        assert!(
            (1..=window).contains(&min_periods),
            "min_periods must be in 1..=window"
        );
        Self {
            window: Some(window),
            min_periods,
            name: name.into(),
        }
    }

    pub fn one_year() -> Self {
        Self::new("ath_1y", TRADING_DAYS_PER_YEAR, 100)
    }

    pub fn two_year() -> Self {
        Self::new("ath_2y", 2 * TRADING_DAYS_PER_YEAR, 200)
    }

    pub fn five_year() -> Self {
        Self::new("ath_5y", 5 * TRADING_DAYS_PER_YEAR, 500)
    }

    pub fn all_time() -> Self {
        Self {
            window: None,
            min_periods: 1,
            name: "ath_all_time".to_string(),
        }
    }
}

impl Indicator for RollingHigh {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_defined(&self) -> usize {
        self.min_periods - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.window {
            Some(window) => rolling_max(&closes, window, self.min_periods),
            None => expanding_max(&closes),
        }
    }
}

/// Fractional distance of `close` below a reference high: (close - high) / high.
///
/// Returns `None` when the high is undefined or not positive.
pub fn distance_from_high(close: f64, high: Option<f64>) -> Option<f64> {
    let high = high.filter(|h| h.is_finite() && *h > 0.0)?;
    Some((close - high) / high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn one_year_activates_at_100_bars() {
        let closes: Vec<f64> = (0..120).map(|i| 50.0 + i as f64).collect();
        let result = RollingHigh::one_year().compute(&make_bars(&closes));
        assert!(result[98].is_nan());
        assert_eq!(result[99], 149.0);
        assert_eq!(result[119], 169.0);
    }

    #[test]
    fn five_year_window_forgets_old_peak() {
        let mut closes = vec![500.0];
        closes.extend(std::iter::repeat(100.0).take(1300));
        let result = RollingHigh::five_year().compute(&make_bars(&closes));
        assert!(result[498].is_nan());
        assert_eq!(result[499], 500.0);
        assert_eq!(result[1259], 500.0);
        // index 0 left the 1260-bar window at index 1260
        assert_eq!(result[1260], 100.0);
    }

    #[test]
    fn all_time_defined_from_first_bar() {
        let result = RollingHigh::all_time().compute(&make_bars(&[3.0, 5.0, 4.0]));
        assert_eq!(result, vec![3.0, 5.0, 5.0]);
        assert_eq!(RollingHigh::all_time().first_defined(), 0);
    }

    #[test]
    fn distance_is_non_positive_and_zero_at_high() {
        assert_eq!(distance_from_high(100.0, Some(100.0)), Some(0.0));
        let d = distance_from_high(95.0, Some(100.0)).unwrap();
        assert!((d - (-0.05)).abs() < 1e-12);
        assert_eq!(distance_from_high(95.0, None), None);
        assert_eq!(distance_from_high(95.0, Some(f64::NAN)), None);
    }
}
