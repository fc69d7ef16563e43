//! Moving average crossover detection — golden cross and death cross.
//!
//! A stateless scan over adjacent records of one instrument. Nothing here
//! feeds the simulator; it is a derived view for reporting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossDirection {
    None,
    /// sma_50 moved from at-or-below sma_200 to above it.
    Golden,
    /// sma_50 moved from at-or-above sma_200 to below it.
    Death,
}

/// Classify the transition between two consecutive records.
///
/// Both records need sma_50 and sma_200 defined; otherwise `None`.
pub fn cross_direction(prev: &IndicatorRecord, curr: &IndicatorRecord) -> CrossDirection {
    let (Some(pf), Some(ps), Some(cf), Some(cs)) =
        (prev.sma_50, prev.sma_200, curr.sma_50, curr.sma_200)
    else {
        return CrossDirection::None;
    };

    if cf > cs && pf <= ps {
        CrossDirection::Golden
    } else if cf < cs && pf >= ps {
        CrossDirection::Death
    } else {
        CrossDirection::None
    }
}

/// A detected crossover on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub direction: CrossDirection,
    pub close: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub rsi_14: Option<f64>,
}

/// Every golden and death cross in one instrument's date-ordered records.
pub fn scan_crosses(records: &[IndicatorRecord]) -> Vec<CrossEvent> {
    records
        .windows(2)
        .filter_map(|w| {
            let direction = cross_direction(&w[0], &w[1]);
            if direction == CrossDirection::None {
                return None;
            }
            let curr = &w[1];
            Some(CrossEvent {
                symbol: curr.symbol.clone(),
                date: curr.date,
                direction,
                close: curr.close,
                sma_50: curr.sma_50?,
                sma_200: curr.sma_200?,
                rsi_14: curr.rsi_14,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(day: u32, fast: Option<f64>, slow: Option<f64>) -> IndicatorRecord {
        let date = NaiveDate::from_ymd_opt(2024, 4, day).unwrap();
        let mut r = IndicatorRecord::empty("LPP", date, 100.0);
        r.sma_50 = fast;
        r.sma_200 = slow;
        r
    }

    #[test]
    fn golden_cross_from_equal() {
        let prev = rec(1, Some(10.0), Some(10.0));
        let curr = rec(2, Some(10.5), Some(10.0));
        assert_eq!(cross_direction(&prev, &curr), CrossDirection::Golden);
    }

    #[test]
    fn death_cross() {
        let prev = rec(1, Some(11.0), Some(10.0));
        let curr = rec(2, Some(9.0), Some(10.0));
        assert_eq!(cross_direction(&prev, &curr), CrossDirection::Death);
    }

    #[test]
    fn no_cross_while_trend_persists() {
        let prev = rec(1, Some(11.0), Some(10.0));
        let curr = rec(2, Some(12.0), Some(10.0));
        assert_eq!(cross_direction(&prev, &curr), CrossDirection::None);
    }

    #[test]
    fn undefined_previous_is_not_a_cross() {
        let prev = rec(1, Some(9.0), None);
        let curr = rec(2, Some(12.0), Some(10.0));
        assert_eq!(cross_direction(&prev, &curr), CrossDirection::None);
    }

    #[test]
    fn scan_finds_every_transition() {
        let records = vec![
            rec(1, Some(9.0), Some(10.0)),
            rec(2, Some(11.0), Some(10.0)),
            rec(3, Some(12.0), Some(10.0)),
            rec(4, Some(9.5), Some(10.0)),
        ];
        let events = scan_crosses(&records);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].direction, CrossDirection::Golden);
        assert_eq!(events[0].date, records[1].date);
        assert_eq!(events[1].direction, CrossDirection::Death);
        assert_eq!(events[1].sma_50, 9.5);
    }
}
