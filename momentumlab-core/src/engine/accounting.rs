//! Last-known-close tracking for mark-to-market.

use std::collections::BTreeMap;

use crate::engine::MarketRow;

/// Most recent close seen per symbol.
///
/// A position whose instrument has no row on a given date is valued at the
/// last close it traded at, never dropped from equity.
#[derive(Debug, Clone, Default)]
pub struct PriceMarks {
    last_close: BTreeMap<String, f64>,
}

impl PriceMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, rows: &[MarketRow]) {
        for row in rows {
            self.last_close.insert(row.symbol.clone(), row.close);
        }
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.last_close.get(symbol).copied()
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.last_close
    }
}
