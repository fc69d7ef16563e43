//! History validation — the gate every price series passes before indicators.
//!
//! Two classes of problems are handled differently:
//! - Void bars (a missing or non-numeric OHLC value) are dropped silently.
//!   Partial history is expected; downstream windows simply see fewer bars.
//! - Structural problems (dates out of order, duplicate dates, non-positive
//!   prices, bars from another symbol) are fatal and rejected up front.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::domain::Bar;

/// Structural errors in a single instrument's price history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("{symbol}: dates out of order ({previous} followed by {date})")]
    Unsorted {
        symbol: String,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("{symbol}: duplicate bar for {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("{symbol}: non-positive price on {date}")]
    NonPositivePrice { symbol: String, date: NaiveDate },

    #[error("history for {expected} contains a bar for {found} on {date}")]
    SymbolMismatch {
        expected: String,
        found: String,
        date: NaiveDate,
    },
}

/// A validated, void-free price history.
#[derive(Debug, Clone, Default)]
pub struct CleanHistory {
    pub bars: Vec<Bar>,
    /// Number of void bars removed from the input.
    pub dropped: usize,
}

impl CleanHistory {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

/// Drop void bars and reject structurally invalid history.
pub fn clean_history(bars: &[Bar]) -> Result<CleanHistory, HistoryError> {
    let Some(first) = bars.first() else {
        return Ok(CleanHistory::default());
    };
    let symbol = first.symbol.as_str();

    let mut clean: Vec<Bar> = Vec::with_capacity(bars.len());
    let mut dropped = 0;

    for bar in bars {
        if bar.symbol != symbol {
            return Err(HistoryError::SymbolMismatch {
                expected: symbol.to_string(),
                found: bar.symbol.clone(),
                date: bar.date,
            });
        }
        if bar.is_void() {
            dropped += 1;
            continue;
        }
        if !bar.has_positive_prices() {
            return Err(HistoryError::NonPositivePrice {
                symbol: symbol.to_string(),
                date: bar.date,
            });
        }
        if let Some(prev) = clean.last() {
            if bar.date == prev.date {
                return Err(HistoryError::DuplicateDate {
                    symbol: symbol.to_string(),
                    date: bar.date,
                });
            }
            if bar.date < prev.date {
                return Err(HistoryError::Unsorted {
                    symbol: symbol.to_string(),
                    previous: prev.date,
                    date: bar.date,
                });
            }
        }
        clean.push(bar.clone());
    }

    if dropped > 0 {
        debug!(symbol, dropped, kept = clean.len(), "dropped void bars");
    }

    Ok(CleanHistory {
        bars: clean,
        dropped,
    })
}
