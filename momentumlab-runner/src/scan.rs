//! Read-only scans over stored indicator history.
//!
//! - `latest_signals()`: instruments whose most recent record passes a rule,
//!   ranked the way the simulator ranks entry candidates.
//! - `near_ath_rule()`: a rule on the 5y-high distance alone, for listing
//!   instruments close to their highs regardless of trend or RSI.
//! - `signals_within()`: every record passing a rule within each
//!   instrument's last N records.
//! - `recent_crosses()`: golden/death crosses within each instrument's last
//!   N records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use momentumlab_core::components::signal::{
    scan_crosses, Comparison, CrossEvent, Field, Predicate,
};
use momentumlab_core::components::SignalRule;
use momentumlab_core::indicators::IndicatorRecord;

use crate::store::IndicatorStore;

/// One instrument whose latest record carries a true signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHit {
    pub rank: usize,
    pub record: IndicatorRecord,
}

/// Latest-record signal scan, closest to the 5y high first, ties by symbol.
pub fn latest_signals(store: &dyn IndicatorStore, rule: &dyn SignalRule) -> Vec<SignalHit> {
    let mut hits: Vec<IndicatorRecord> = store
        .symbols()
        .iter()
        .filter_map(|s| store.latest(s))
        .filter(|r| rule.evaluate(r))
        .collect();

    hits.sort_by(|a, b| match (a.distance_from_ath_5y, b.distance_from_ath_5y) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.symbol.cmp(&b.symbol)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.symbol.cmp(&b.symbol),
    });

    hits.into_iter()
        .enumerate()
        .map(|(i, record)| SignalHit { rank: i + 1, record })
        .collect()
}

/// True when the latest close is at most `threshold` (a fraction, 0.05 = 5%)
/// below the 5-year high. Records without a 5y high never match.
pub fn near_ath_rule(threshold: f64) -> Predicate {
    Predicate::threshold(Field::DistanceFromAth5y, Comparison::Ge, -threshold)
}

/// Records passing `rule` within the last `days` records of every
/// instrument, newest first, ties by symbol. Ranks follow that order.
pub fn signals_within(
    store: &dyn IndicatorStore,
    rule: &dyn SignalRule,
    days: usize,
) -> Vec<SignalHit> {
    let mut hits: Vec<IndicatorRecord> = store
        .symbols()
        .iter()
        .flat_map(|symbol| {
            let history = store.history(symbol);
            let start = history.len().saturating_sub(days);
            history.into_iter().skip(start)
        })
        .filter(|r| rule.evaluate(r))
        .collect();

    hits.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));

    hits.into_iter()
        .enumerate()
        .map(|(i, record)| SignalHit { rank: i + 1, record })
        .collect()
}

/// Crosses detected within the last `days` records of every instrument,
/// newest first.
///
/// The scan looks one record further back so a cross on the oldest record in
/// the window is still detected.
pub fn recent_crosses(store: &dyn IndicatorStore, days: usize) -> Vec<CrossEvent> {
    if days == 0 {
        return Vec::new();
    }

    let mut events: Vec<CrossEvent> = store
        .symbols()
        .iter()
        .flat_map(|symbol| {
            let history = store.history(symbol);
            let start = history.len().saturating_sub(days + 1);
            scan_crosses(&history[start..])
        })
        .collect();

    events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.symbol.cmp(&b.symbol)));
    events
}
