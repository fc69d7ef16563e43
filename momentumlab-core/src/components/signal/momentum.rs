//! Momentum entry signal.
//!
//! True when all three hold, each operand defined:
//! - rsi_14 > 50 (momentum)
//! - sma_50 > sma_200 (uptrend)
//! - distance_from_ath_5y >= -0.05 (within 5% of the 5-year high)

use super::predicate::{Comparison, Field, Predicate};
use super::SignalRule;
use crate::indicators::IndicatorRecord;

#[derive(Debug, Clone)]
pub struct MomentumSignal {
    predicate: Predicate,
}

impl MomentumSignal {
    /// `rsi_floor`: RSI must be strictly above this.
    /// `ath_tolerance`: maximum fractional distance below the 5y high (0.05 = 5%).
    pub fn new(rsi_floor: f64, ath_tolerance: f64) -> Self {
        assert!(ath_tolerance >= 0.0, "ath_tolerance must be >= 0");
        let predicate = Predicate::All(vec![
            Predicate::threshold(Field::Rsi14, Comparison::Gt, rsi_floor),
            Predicate::fields(Field::Sma50, Comparison::Gt, Field::Sma200),
            Predicate::threshold(Field::DistanceFromAth5y, Comparison::Ge, -ath_tolerance),
        ]);
        Self { predicate }
    }
}

impl Default for MomentumSignal {
    fn default() -> Self {
        Self::new(50.0, 0.05)
    }
}

impl SignalRule for MomentumSignal {
    fn name(&self) -> &str {
        "momentum"
    }

    fn evaluate(&self, record: &IndicatorRecord) -> bool {
        self.predicate.evaluate(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn strong() -> IndicatorRecord {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let mut r = IndicatorRecord::empty("DNP", date, 400.0);
        r.rsi_14 = Some(58.0);
        r.sma_50 = Some(380.0);
        r.sma_200 = Some(350.0);
        r.distance_from_ath_5y = Some(-0.02);
        r
    }

    #[test]
    fn all_conditions_met() {
        assert!(MomentumSignal::default().evaluate(&strong()));
    }

    #[test]
    fn boundaries() {
        let signal = MomentumSignal::default();

        let mut r = strong();
        r.rsi_14 = Some(50.0);
        assert!(!signal.evaluate(&r), "rsi must be strictly above 50");

        let mut r = strong();
        r.sma_50 = r.sma_200;
        assert!(!signal.evaluate(&r), "sma_50 must be strictly above sma_200");

        let mut r = strong();
        r.distance_from_ath_5y = Some(-0.05);
        assert!(signal.evaluate(&r), "exactly 5% below the high still qualifies");

        let mut r = strong();
        r.distance_from_ath_5y = Some(-0.0501);
        assert!(!signal.evaluate(&r));
    }

    #[test]
    fn any_missing_operand_is_false() {
        let signal = MomentumSignal::default();
        for clear in 0..3 {
            let mut r = strong();
            match clear {
                0 => r.rsi_14 = None,
                1 => r.sma_200 = None,
                _ => r.distance_from_ath_5y = None,
            }
            assert!(!signal.evaluate(&r));
        }
    }
}
