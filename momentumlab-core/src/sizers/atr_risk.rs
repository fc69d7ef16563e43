//! ATR Risk Sizer
//!
//! Position size based on volatility (ATR) and fixed risk per trade, capped
//! by a maximum share of current cash in any single position.

use crate::sizers::Sizer;

/// ATR-based risk sizer
///
/// # Formula
/// ```text
/// risk_dollars  = cash * risk_pct
/// stop_distance = atr_multiplier * ATR
/// by_risk       = floor(risk_dollars / stop_distance)
/// by_allocation = floor(cash * max_allocation / close)
/// quantity      = min(by_risk, by_allocation)
/// ```
///
/// # Example
/// - Cash: $100,000, risk 2% ($2,000)
/// - ATR: $2.00, multiplier 2x (stop distance $4.00)
/// - By risk: 500 shares
/// - Close $50, cap 20% ($20,000): 400 shares
/// - Quantity: 400
#[derive(Debug, Clone)]
pub struct AtrRiskSizer {
    /// Risk fraction per trade (e.g., 0.02 = 2%)
    risk_pct: f64,

    /// ATR multiplier for stop distance (e.g., 2.0 = 2x ATR)
    atr_multiplier: f64,

    /// Maximum fraction of cash in one position (e.g., 0.20 = 20%)
    max_allocation: f64,
}

impl AtrRiskSizer {
    pub const DEFAULT_ATR_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_MAX_ALLOCATION: f64 = 0.20;

    pub fn new(risk_pct: f64, atr_multiplier: f64, max_allocation: f64) -> Self {
        assert!(risk_pct > 0.0 && risk_pct < 1.0, "risk_pct must be in (0, 1)");
        assert!(atr_multiplier > 0.0, "atr_multiplier must be > 0");
        assert!(
            max_allocation > 0.0 && max_allocation <= 1.0,
            "max_allocation must be in (0, 1]"
        );

        Self {
            risk_pct,
            atr_multiplier,
            max_allocation,
        }
    }

    /// 2x ATR stop, 20% allocation cap.
    pub fn with_risk(risk_pct: f64) -> Self {
        Self::new(
            risk_pct,
            Self::DEFAULT_ATR_MULTIPLIER,
            Self::DEFAULT_MAX_ALLOCATION,
        )
    }
}

fn whole_shares(x: f64) -> u64 {
    if x.is_finite() && x > 0.0 {
        x.floor() as u64
    } else {
        0
    }
}

impl Sizer for AtrRiskSizer {
    fn size(&self, cash: f64, close: f64, atr: Option<f64>) -> u64 {
        if !(cash > 0.0) || !(close > 0.0) {
            return 0;
        }

        // Can't size without volatility
        let atr = match atr {
            Some(a) if a.is_finite() && a > 0.0 => a,
            _ => return 0,
        };

        let by_risk = whole_shares(cash * self.risk_pct / self.stop_distance(atr));
        let by_allocation = whole_shares(cash * self.max_allocation / close);

        by_risk.min(by_allocation)
    }

    fn stop_distance(&self, atr: f64) -> f64 {
        self.atr_multiplier * atr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_bound_wins() {
        let sizer = AtrRiskSizer::with_risk(0.02);

        // Risk: $2,000 / (2 * 5.0) = 200 shares
        // Cap: $20,000 / $50 = 400 shares
        assert_eq!(sizer.size(100_000.0, 50.0, Some(5.0)), 200);
    }

    #[test]
    fn test_allocation_cap_wins() {
        let sizer = AtrRiskSizer::with_risk(0.02);

        // Risk: $2,000 / (2 * 2.0) = 500 shares
        // Cap: $20,000 / $50 = 400 shares
        assert_eq!(sizer.size(100_000.0, 50.0, Some(2.0)), 400);
    }

    #[test]
    fn test_floors_fractional_shares() {
        let sizer = AtrRiskSizer::with_risk(0.02);

        // Risk: $2,000 / (2 * 3.0) = 333.3, capped at 200 when close is $100
        assert_eq!(sizer.size(100_000.0, 100.0, Some(3.0)), 200);
        assert_eq!(sizer.size(100_000.0, 10.0, Some(3.0)), 333);
    }

    #[test]
    fn test_zero_or_missing_atr_returns_zero() {
        let sizer = AtrRiskSizer::with_risk(0.02);
        assert_eq!(sizer.size(100_000.0, 50.0, None), 0);
        assert_eq!(sizer.size(100_000.0, 50.0, Some(0.0)), 0);
        assert_eq!(sizer.size(100_000.0, 50.0, Some(f64::NAN)), 0);
    }

    #[test]
    fn test_zero_price_or_cash_returns_zero() {
        let sizer = AtrRiskSizer::with_risk(0.02);
        assert_eq!(sizer.size(100_000.0, 0.0, Some(1.0)), 0);
        assert_eq!(sizer.size(0.0, 50.0, Some(1.0)), 0);
    }

    #[test]
    fn test_stop_distance() {
        let sizer = AtrRiskSizer::with_risk(0.02);
        assert_eq!(sizer.stop_distance(1.5), 3.0);
    }

    #[test]
    #[should_panic(expected = "risk_pct must be in (0, 1)")]
    fn test_rejects_bad_risk() {
        AtrRiskSizer::with_risk(1.5);
    }
}
