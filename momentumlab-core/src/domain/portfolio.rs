//! Portfolio — aggregate state of cash + all open positions.

use super::position::Position;
use super::trade::{ExitReason, TradeRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Aggregate portfolio state.
///
/// Positions are keyed by symbol in a `BTreeMap` so every iteration order is
/// deterministic. At most one position per symbol exists at a time.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    positions: BTreeMap<String, Position>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
        }
    }

    /// Total equity = cash + sum of all position market values.
    ///
    /// `marks` holds the price to value each symbol at. A position with no mark
    /// is valued at its entry price.
    pub fn equity(&self, marks: &BTreeMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = marks.get(&pos.symbol).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    /// Symbols with open positions, in symbol order.
    pub fn symbols(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    /// Open a position, paying its cost from cash.
    ///
    /// Returns the position back if the symbol is already held or the cost
    /// exceeds available cash; the portfolio is left unchanged in that case.
    pub fn open(&mut self, position: Position) -> Result<(), Position> {
        let cost = position.cost_basis();
        if self.positions.contains_key(&position.symbol) || cost > self.cash {
            return Err(position);
        }
        self.cash -= cost;
        self.positions.insert(position.symbol.clone(), position);
        Ok(())
    }

    /// Close the position in `symbol` at `price`, crediting the proceeds to cash.
    pub fn close(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        price: f64,
        reason: ExitReason,
    ) -> Option<TradeRecord> {
        let position = self.positions.remove(symbol)?;
        self.cash += position.market_value(price);
        Some(TradeRecord::close(position, date, price, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn position(symbol: &str, shares: u64, price: f64) -> Position {
        Position {
            symbol: symbol.into(),
            shares,
            entry_price: price,
            entry_date: date(),
            stop_price: price - 10.0,
        }
    }

    #[test]
    fn equity_with_no_positions() {
        let portfolio = Portfolio::new(100_000.0);
        assert_eq!(portfolio.equity(&BTreeMap::new()), 100_000.0);
    }

    #[test]
    fn open_debits_cash_and_equity_is_preserved() {
        let mut portfolio = Portfolio::new(100_000.0);
        portfolio.open(position("PKN", 100, 100.0)).unwrap();
        assert_eq!(portfolio.cash, 90_000.0);

        let mut marks = BTreeMap::new();
        marks.insert("PKN".to_string(), 110.0);
        // 90_000 + 100 * 110 = 101_000
        assert_eq!(portfolio.equity(&marks), 101_000.0);
    }

    #[test]
    fn unmarked_position_is_valued_at_entry() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.open(position("KGH", 10, 50.0)).unwrap();
        assert_eq!(portfolio.equity(&BTreeMap::new()), 10_000.0);
    }

    #[test]
    fn open_rejects_duplicate_symbol_and_overspend() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.open(position("PKN", 10, 100.0)).unwrap();
        assert!(portfolio.open(position("PKN", 1, 100.0)).is_err());
        assert!(portfolio.open(position("KGH", 1_000, 100.0)).is_err());
        assert_eq!(portfolio.open_count(), 1);
        assert_eq!(portfolio.cash, 9_000.0);
    }

    #[test]
    fn close_credits_proceeds() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.open(position("PKN", 10, 100.0)).unwrap();
        let trade = portfolio
            .close("PKN", date(), 120.0, ExitReason::SignalExit)
            .unwrap();
        assert_eq!(trade.pnl, 200.0);
        assert_eq!(portfolio.cash, 10_200.0);
        assert!(portfolio.is_flat());
        assert!(portfolio
            .close("PKN", date(), 120.0, ExitReason::SignalExit)
            .is_none());
    }
}
