//! The day-by-day simulation loop.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{
    group_by_date, MarketRow, PriceMarks, SimulationError, SimulationResult, SimulatorConfig,
    MAX_POSITION_ALLOCATION, STOP_ATR_MULTIPLE,
};
use crate::domain::{EquitySnapshot, ExitReason, Portfolio, Position, TradeRecord};
use crate::sizers::{AtrRiskSizer, Sizer};

/// Main backtest simulator
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    sizer: AtrRiskSizer,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let sizer = AtrRiskSizer::new(
            config.risk_percent,
            STOP_ATR_MULTIPLE,
            MAX_POSITION_ALLOCATION,
        );
        Ok(Self { config, sizer })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run the simulation over a (date, symbol)-ordered stream.
    ///
    /// The whole stream is validated before the first date is processed.
    /// Rows outside the configured date window are ignored.
    pub fn run(&self, stream: &[MarketRow]) -> Result<SimulationResult, SimulationError> {
        let slices: Vec<_> = group_by_date(stream)?
            .into_iter()
            .filter(|s| self.config.contains(s.date))
            .collect();

        let mut portfolio = Portfolio::new(self.config.initial_capital);
        let mut marks = PriceMarks::new();
        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut equity_curve = Vec::with_capacity(slices.len());

        for slice in &slices {
            let date = slice.date;
            let today: BTreeMap<&str, &MarketRow> =
                slice.rows.iter().map(|r| (r.symbol.as_str(), r)).collect();

            // 1. Mark-to-market
            marks.update(slice.rows);
            let total_equity = portfolio.equity(marks.as_map());
            equity_curve.push(EquitySnapshot {
                date,
                total_equity,
                cash: portfolio.cash,
            });
            trace!(%date, total_equity, cash = portfolio.cash, "snapshot");

            // 2. Exits
            for symbol in portfolio.symbols() {
                let Some(row) = today.get(symbol.as_str()) else {
                    continue;
                };
                let Some(position) = portfolio.get_position(&symbol) else {
                    continue;
                };
                let reason = if position.is_stopped_out(row.close) {
                    ExitReason::StopLoss
                } else if !row.signal {
                    ExitReason::SignalExit
                } else {
                    continue;
                };
                if let Some(trade) = portfolio.close(&symbol, date, row.close, reason) {
                    debug!(
                        symbol = %trade.symbol,
                        %date,
                        price = trade.exit_price,
                        pnl = trade.pnl,
                        reason = %trade.exit_reason,
                        "exit"
                    );
                    trades.push(trade);
                }
            }

            // 3. Entries
            let slots = self.config.max_positions.saturating_sub(portfolio.open_count());
            if slots == 0 {
                continue;
            }
            for row in rank_candidates(slice.rows, &portfolio).into_iter().take(slots) {
                let shares = self.sizer.size(portfolio.cash, row.close, row.atr());
                if shares == 0 {
                    trace!(symbol = %row.symbol, %date, "sized to zero");
                    continue;
                }
                let Some(atr) = row.atr() else {
                    continue;
                };
                let position = Position {
                    symbol: row.symbol.clone(),
                    shares,
                    entry_price: row.close,
                    entry_date: date,
                    stop_price: row.close - self.sizer.stop_distance(atr),
                };
                match portfolio.open(position) {
                    Ok(()) => debug!(
                        symbol = %row.symbol,
                        %date,
                        shares,
                        price = row.close,
                        cash = portfolio.cash,
                        "entry"
                    ),
                    Err(rejected) => trace!(
                        symbol = %rejected.symbol,
                        cost = rejected.cost_basis(),
                        cash = portfolio.cash,
                        "entry skipped: insufficient cash"
                    ),
                }
            }
        }

        // 4. Final liquidation
        if let Some(last) = slices.last() {
            for symbol in portfolio.symbols() {
                let Some(price) = marks
                    .get(&symbol)
                    .or_else(|| portfolio.get_position(&symbol).map(|p| p.entry_price))
                else {
                    continue;
                };
                if let Some(trade) = portfolio.close(&symbol, last.date, price, ExitReason::FinalExit)
                {
                    trades.push(trade);
                }
            }
        }

        debug!(
            dates = slices.len(),
            trades = trades.len(),
            final_cash = portfolio.cash,
            "simulation complete"
        );

        Ok(SimulationResult {
            trades,
            equity_curve,
            final_cash: portfolio.cash,
        })
    }
}

/// Signalled, not-yet-held rows ordered by distance from the 5-year high,
/// closest first. Undefined distances sort last; ties break by symbol.
fn rank_candidates<'a>(rows: &'a [MarketRow], portfolio: &Portfolio) -> Vec<&'a MarketRow> {
    let mut candidates: Vec<&MarketRow> = rows
        .iter()
        .filter(|r| r.signal && !portfolio.has_position(&r.symbol))
        .collect();

    candidates.sort_by(|a, b| {
        let by_distance = match (a.distance(), b.distance()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_distance.then_with(|| a.symbol.cmp(&b.symbol))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorRecord;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn row(symbol: &str, d: u32, close: f64, atr: f64, distance: f64, signal: bool) -> MarketRow {
        let mut r = IndicatorRecord::empty(symbol, day(d), close);
        r.rsi_14 = Some(60.0);
        r.atr_14 = Some(atr);
        r.distance_from_ath_5y = Some(distance);
        MarketRow::from_record(r, signal)
    }

    #[test]
    fn ranking_prefers_closest_to_high_then_symbol() {
        let rows = vec![
            row("CCC", 1, 10.0, 1.0, -0.03, true),
            row("BBB", 1, 10.0, 1.0, -0.01, true),
            row("AAA", 1, 10.0, 1.0, -0.03, true),
            row("DDD", 1, 10.0, 1.0, 0.0, false),
        ];
        let portfolio = Portfolio::new(1_000.0);
        let ranked: Vec<_> = rank_candidates(&rows, &portfolio)
            .into_iter()
            .map(|r| r.symbol.as_str())
            .collect();
        assert_eq!(ranked, vec!["BBB", "AAA", "CCC"]);
    }

    #[test]
    fn empty_stream_yields_empty_result() {
        let sim = Simulator::new(SimulatorConfig::default()).unwrap();
        let result = sim.run(&[]).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
        assert_eq!(result.final_cash, 100_000.0);
    }

    #[test]
    fn signal_exit_realizes_pnl() {
        let sim = Simulator::new(SimulatorConfig::default()).unwrap();
        let stream = vec![
            row("A", 1, 50.0, 5.0, -0.01, true),
            row("A", 2, 55.0, 5.0, -0.01, false),
        ];
        let result = sim.run(&stream).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        // 2000 / (2 * 5) = 200 shares, cap 20000 / 50 = 400
        assert_eq!(trade.shares, 200);
        assert_eq!(trade.exit_reason, ExitReason::SignalExit);
        assert_eq!(trade.pnl, 1_000.0);
        assert_eq!(result.final_cash, 101_000.0);
        assert_eq!(result.equity_curve.len(), 2);
        assert_eq!(result.equity_curve[1].total_equity, 101_000.0);
    }

    #[test]
    fn stopped_symbol_can_reenter_same_date() {
        let sim = Simulator::new(SimulatorConfig::default()).unwrap();
        // Stopped out on day 2 while the signal is still on: the freed symbol
        // is a candidate again the same day.
        let stream = vec![
            row("A", 1, 50.0, 5.0, -0.01, true),
            row("A", 2, 39.0, 5.0, -0.01, true),
        ];
        let result = sim.run(&stream).unwrap();
        assert_eq!(result.trades[0].exit_reason, ExitReason::StopLoss);
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[1].exit_reason, ExitReason::FinalExit);
        assert_eq!(result.trades[1].entry_date, day(2));
    }

    #[test]
    fn date_window_is_applied() {
        let config = SimulatorConfig {
            start_date: Some(day(2)),
            ..Default::default()
        };
        let sim = Simulator::new(config).unwrap();
        let stream = vec![
            row("A", 1, 50.0, 5.0, -0.01, true),
            row("A", 2, 52.0, 5.0, -0.01, true),
        ];
        let result = sim.run(&stream).unwrap();
        assert_eq!(result.equity_curve.len(), 1);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_date, day(2));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimulatorConfig {
            max_positions: 0,
            ..Default::default()
        };
        assert!(Simulator::new(config).is_err());
    }
}
