//! Indicator persistence keyed on (symbol, date).
//!
//! Writes are upserts: recomputing an instrument overwrites the stored values
//! for every date it covers and leaves other dates untouched.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use momentumlab_core::indicators::IndicatorRecord;

/// Storage collaborator for computed indicator records.
pub trait IndicatorStore: Send + Sync {
    /// Insert or overwrite records. Rows without any core indicator are
    /// skipped. Returns how many rows were written.
    fn upsert(&mut self, records: &[IndicatorRecord]) -> usize;

    /// Date-ordered history for one symbol (empty if unknown).
    fn history(&self, symbol: &str) -> Vec<IndicatorRecord>;

    /// Stored symbols, ascending.
    fn symbols(&self) -> Vec<String>;

    /// Most recent record for one symbol.
    fn latest(&self, symbol: &str) -> Option<IndicatorRecord>;

    /// Total stored rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store; nested ordered maps keep symbols and dates sorted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndicatorStore {
    rows: BTreeMap<String, BTreeMap<NaiveDate, IndicatorRecord>>,
}

impl InMemoryIndicatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored history, one per symbol in symbol order.
    pub fn histories(&self) -> Vec<Vec<IndicatorRecord>> {
        self.rows
            .values()
            .map(|by_date| by_date.values().cloned().collect())
            .collect()
    }

    /// Earliest and latest stored date across all symbols.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let earliest = self.rows.values().filter_map(|m| m.keys().next()).min()?;
        let latest = self
            .rows
            .values()
            .filter_map(|m| m.keys().next_back())
            .max()?;
        Some((*earliest, *latest))
    }
}

impl IndicatorStore for InMemoryIndicatorStore {
    fn upsert(&mut self, records: &[IndicatorRecord]) -> usize {
        let mut written = 0;
        for record in records.iter().filter(|r| r.has_core_values()) {
            self.rows
                .entry(record.symbol.clone())
                .or_default()
                .insert(record.date, record.clone());
            written += 1;
        }
        written
    }

    fn history(&self, symbol: &str) -> Vec<IndicatorRecord> {
        self.rows
            .get(symbol)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    fn symbols(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }

    fn latest(&self, symbol: &str) -> Option<IndicatorRecord> {
        self.rows
            .get(symbol)
            .and_then(|m| m.values().next_back())
            .cloned()
    }

    fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }
}
