//! Indicator trait and the per-instrument column frame.
//!
//! An indicator maps one instrument's bar history to one numeric column.
//! `IndicatorFrame` holds every column for that instrument and answers
//! "what is column X on bar i", with undefined warmup values read as `None`.

use std::collections::BTreeMap;

use crate::domain::Bar;

/// A single-column indicator.
///
/// `compute` returns exactly one value per input bar. Bars that do not yet
/// have enough history carry `f64::NAN`.
///
/// Causality: the value at bar t is a function of bars `0..=t` only. The
/// truncated-history tests in `tests/lookahead_test.rs` enforce this for
/// every indicator the engine runs.
pub trait Indicator: Send + Sync {
    /// Column name the value is stored under (e.g. "sma_50", "ath_5y").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a defined value.
    ///
    /// Zero for expanding statistics. Windowed statistics return their
    /// minimum period count minus one.
    fn first_defined(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Named indicator columns for one instrument, all of the same length.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    len: usize,
    columns: BTreeMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    /// Empty frame for a history of `len` bars.
    pub fn with_len(len: usize) -> Self {
        Self {
            len,
            columns: BTreeMap::new(),
        }
    }

    /// Run `indicator` over `bars` and store the column under its name.
    pub fn fill(&mut self, indicator: &dyn Indicator, bars: &[Bar]) {
        debug_assert_eq!(bars.len(), self.len, "frame length mismatch");
        self.columns
            .insert(indicator.name().to_string(), indicator.compute(bars));
    }

    /// Defined value of `column` on bar `index`.
    ///
    /// Missing columns, out-of-range indices, NaN and infinities are all
    /// `None`.
    pub fn at(&self, column: &str, index: usize) -> Option<f64> {
        self.columns
            .get(column)
            .and_then(|v| v.get(index).copied())
            .filter(|v| v.is_finite())
    }

    /// Number of bars the frame covers.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
