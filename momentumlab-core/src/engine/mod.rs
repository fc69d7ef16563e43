//! Backtest simulator — a deterministic day-by-day fold over a merged stream.
//!
//! The simulator consumes one date-ordered stream of `MarketRow`s covering
//! every instrument and runs four phases per date:
//!
//! 1. Mark-to-market: record an equity snapshot
//! 2. Exits: stop-loss first, then signal loss
//! 3. Entries: rank candidates by closeness to the 5-year high, size, buy
//! 4. After the last date: liquidate everything still open

pub mod accounting;
pub mod event_loop;
pub mod stream;

pub use accounting::PriceMarks;
pub use event_loop::Simulator;
pub use stream::{build_stream, group_by_date, DateSlice};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{EquitySnapshot, TradeRecord};
use crate::indicators::IndicatorRecord;

/// Stop-loss distance below entry, in multiples of ATR(14). Not configurable.
pub const STOP_ATR_MULTIPLE: f64 = 2.0;

/// Bars an instrument needs before its rows enter the stream (the RSI window).
pub const WARMUP_BARS: usize = 14;

/// Largest fraction of current cash a single entry may use.
pub const MAX_POSITION_ALLOCATION: f64 = 0.20;

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub initial_capital: f64,
    pub max_positions: usize,
    /// Fraction of cash risked per trade (0.02 = 2%).
    pub risk_percent: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            max_positions: 5,
            risk_percent: 0.02,
            start_date: None,
            end_date: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.max_positions == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_positions must be at least 1".into(),
            ));
        }
        if !(self.risk_percent > 0.0 && self.risk_percent < 1.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "risk_percent must be in (0, 1), got {}",
                self.risk_percent
            )));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(SimulationError::InvalidConfig(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        Ok(())
    }

    /// Whether `date` falls inside the configured window (bounds inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |s| date >= s) && self.end_date.map_or(true, |e| date <= e)
    }
}

/// One instrument on one date, as seen by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub indicators: IndicatorRecord,
    pub signal: bool,
}

impl MarketRow {
    pub fn from_record(indicators: IndicatorRecord, signal: bool) -> Self {
        Self {
            symbol: indicators.symbol.clone(),
            date: indicators.date,
            close: indicators.close,
            indicators,
            signal,
        }
    }

    pub fn atr(&self) -> Option<f64> {
        self.indicators.atr_14
    }

    pub fn distance(&self) -> Option<f64> {
        self.indicators.distance_from_ath_5y
    }
}

/// Everything a simulation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquitySnapshot>,
    pub final_cash: f64,
}

/// Structurally invalid input, rejected before any date is simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid simulator config: {0}")]
    InvalidConfig(String),

    #[error("stream out of order: {date} follows {previous}")]
    UnsortedStream {
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("duplicate row for {symbol} on {date}")]
    DuplicateRow { symbol: String, date: NaiveDate },

    #[error("invalid close {close} for {symbol} on {date}")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        close: f64,
    },
}
