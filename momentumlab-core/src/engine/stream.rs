//! Building and slicing the merged market stream.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::{MarketRow, SimulationError, WARMUP_BARS};
use crate::components::SignalRule;
use crate::indicators::IndicatorRecord;

/// Merge per-instrument indicator histories into one stream ordered by
/// (date, symbol), attaching the signal for each row.
///
/// The first `WARMUP_BARS - 1` records of each history are left out. Past
/// that point every record is kept, so a warmed-up instrument whose RSI
/// turns undefined (a window without losses) stays in the stream with a
/// false signal instead of vanishing while held.
pub fn build_stream(
    histories: &[Vec<IndicatorRecord>],
    rule: &dyn SignalRule,
) -> Result<Vec<MarketRow>, SimulationError> {
    let mut rows = Vec::with_capacity(histories.iter().map(Vec::len).sum());

    for history in histories {
        for pair in history.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.date == prev.date {
                return Err(SimulationError::DuplicateRow {
                    symbol: curr.symbol.clone(),
                    date: curr.date,
                });
            }
            if curr.date < prev.date {
                return Err(SimulationError::UnsortedStream {
                    previous: prev.date,
                    date: curr.date,
                });
            }
        }

        rows.extend(
            history
                .iter()
                .skip(WARMUP_BARS - 1)
                .map(|r| MarketRow::from_record(r.clone(), rule.evaluate(r))),
        );
    }

    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));
    Ok(rows)
}

/// All rows sharing one date.
#[derive(Debug, Clone, Copy)]
pub struct DateSlice<'a> {
    pub date: NaiveDate,
    pub rows: &'a [MarketRow],
}

/// Split a date-ordered stream into per-date slices, validating it on the way.
///
/// Fails if dates go backwards, a symbol appears twice on one date, or a
/// close is not a positive finite number.
pub fn group_by_date(rows: &[MarketRow]) -> Result<Vec<DateSlice<'_>>, SimulationError> {
    let mut slices = Vec::new();
    let mut start = 0;

    while start < rows.len() {
        let date = rows[start].date;
        let mut end = start;
        let mut seen = BTreeSet::new();

        while end < rows.len() && rows[end].date == date {
            let row = &rows[end];
            if !(row.close.is_finite() && row.close > 0.0) {
                return Err(SimulationError::InvalidPrice {
                    symbol: row.symbol.clone(),
                    date,
                    close: row.close,
                });
            }
            if !seen.insert(row.symbol.as_str()) {
                return Err(SimulationError::DuplicateRow {
                    symbol: row.symbol.clone(),
                    date,
                });
            }
            end += 1;
        }

        if let Some(next) = rows.get(end) {
            if next.date < date {
                return Err(SimulationError::UnsortedStream {
                    previous: date,
                    date: next.date,
                });
            }
        }

        slices.push(DateSlice {
            date,
            rows: &rows[start..end],
        });
        start = end;
    }

    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::MomentumSignal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn rec(symbol: &str, d: u32, rsi: Option<f64>) -> IndicatorRecord {
        let mut r = IndicatorRecord::empty(symbol, day(d), 10.0);
        r.rsi_14 = rsi;
        r
    }

    fn row(symbol: &str, d: u32, close: f64) -> MarketRow {
        let mut r = IndicatorRecord::empty(symbol, day(d), close);
        r.rsi_14 = Some(55.0);
        MarketRow::from_record(r, false)
    }

    /// Daily records `1..=last` for one symbol with a fixed RSI.
    fn history(symbol: &str, last: u32, rsi: f64) -> Vec<IndicatorRecord> {
        (1..=last).map(|d| rec(symbol, d, Some(rsi))).collect()
    }

    #[test]
    fn merges_by_date_then_symbol() {
        let histories = vec![history("ZZZ", 15, 60.0), history("AAA", 15, 40.0)];
        let rows = build_stream(&histories, &MomentumSignal::default()).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| (r.date, r.symbol.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (day(14), "AAA"),
                (day(14), "ZZZ"),
                (day(15), "AAA"),
                (day(15), "ZZZ")
            ]
        );
    }

    #[test]
    fn skips_warmup_rows_only() {
        let mut records: Vec<_> = (1..=16).map(|d| rec("A", d, None)).collect();
        records[13].rsi_14 = Some(70.0);
        let rows = build_stream(&[records], &MomentumSignal::default()).unwrap();

        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(14), day(15), day(16)]);
        assert!(rows[1].indicators.rsi_14.is_none(), "kept after warmup");
        assert!(rows.iter().all(|r| !r.signal));
    }

    #[test]
    fn short_history_contributes_nothing() {
        let short = history("A", WARMUP_BARS as u32 - 1, 60.0);
        let rows = build_stream(&[short], &MomentumSignal::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn rejects_unsorted_history() {
        let histories = vec![vec![rec("A", 2, Some(50.0)), rec("A", 1, Some(50.0))]];
        assert!(matches!(
            build_stream(&histories, &MomentumSignal::default()),
            Err(SimulationError::UnsortedStream { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_history_date() {
        let histories = vec![vec![rec("A", 1, Some(50.0)), rec("A", 1, Some(50.0))]];
        assert!(matches!(
            build_stream(&histories, &MomentumSignal::default()),
            Err(SimulationError::DuplicateRow { .. })
        ));
    }

    #[test]
    fn groups_contiguous_dates() {
        let rows = vec![row("A", 1, 10.0), row("B", 1, 11.0), row("A", 3, 12.0)];
        let slices = group_by_date(&rows).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].rows.len(), 2);
        assert_eq!(slices[1].date, day(3));
    }

    #[test]
    fn grouping_validates_stream() {
        let backwards = vec![row("A", 2, 10.0), row("A", 1, 10.0)];
        assert!(matches!(
            group_by_date(&backwards),
            Err(SimulationError::UnsortedStream { .. })
        ));

        let dup = vec![row("A", 1, 10.0), row("A", 1, 10.0)];
        assert!(matches!(
            group_by_date(&dup),
            Err(SimulationError::DuplicateRow { .. })
        ));

        let bad_price = vec![row("A", 1, 0.0)];
        assert!(matches!(
            group_by_date(&bad_price),
            Err(SimulationError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn empty_stream_has_no_slices() {
        assert!(group_by_date(&[]).unwrap().is_empty());
    }
}
