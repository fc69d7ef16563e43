//! IndicatorRecord and the engine that produces one per bar.
//!
//! The engine is a pure transformation over one instrument's history: it
//! owns the series it computes and returns records aligned with the input
//! bars. Instruments never share state, so callers may fan the work out
//! across threads freely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ath::{distance_from_high, RollingHigh};
use super::{Atr, Ema, Macd, MacdLine, Rsi, Sma};
use crate::components::indicator::{Indicator, IndicatorFrame};
use crate::data::{clean_history, HistoryError};
use crate::domain::Bar;

/// Indicator values for one (symbol, date). `None` means not yet defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub rsi_14: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_20: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub atr_14: Option<f64>,
    pub volume_ma_20: Option<f64>,
    pub ath_1y: Option<f64>,
    pub ath_2y: Option<f64>,
    pub ath_5y: Option<f64>,
    pub ath_all_time: Option<f64>,
    pub distance_from_ath_5y: Option<f64>,
}

impl IndicatorRecord {
    /// A record with every indicator undefined.
    pub fn empty(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            close,
            rsi_14: None,
            sma_50: None,
            sma_200: None,
            ema_20: None,
            macd: None,
            macd_signal: None,
            macd_histogram: None,
            atr_14: None,
            volume_ma_20: None,
            ath_1y: None,
            ath_2y: None,
            ath_5y: None,
            ath_all_time: None,
            distance_from_ath_5y: None,
        }
    }

    /// True if at least one of the storage-relevant indicators is defined
    /// (rsi_14, sma_50, macd, atr_14, ath_1y).
    pub fn has_core_values(&self) -> bool {
        self.rsi_14.is_some()
            || self.sma_50.is_some()
            || self.macd.is_some()
            || self.atr_14.is_some()
            || self.ath_1y.is_some()
    }
}

/// Computes the fixed indicator set for one instrument.
pub struct IndicatorEngine {
    indicators: Vec<Box<dyn Indicator>>,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorEngine {
    pub fn new() -> Self {
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Rsi::new(14)),
            Box::new(Sma::close(50)),
            Box::new(Sma::close(200)),
            Box::new(Ema::new(20)),
            Box::new(Macd::standard(MacdLine::Line)),
            Box::new(Macd::standard(MacdLine::Signal)),
            Box::new(Macd::standard(MacdLine::Histogram)),
            Box::new(Atr::new(14)),
            Box::new(Sma::volume(20)),
            Box::new(RollingHigh::one_year()),
            Box::new(RollingHigh::two_year()),
            Box::new(RollingHigh::five_year()),
            Box::new(RollingHigh::all_time()),
        ];
        Self { indicators }
    }

    /// Validate raw history, drop void bars, then compute records.
    ///
    /// The output has one record per surviving bar.
    pub fn run(&self, bars: &[Bar]) -> Result<Vec<IndicatorRecord>, HistoryError> {
        let clean = clean_history(bars)?;
        Ok(self.compute(&clean.bars))
    }

    /// Compute records for an already-clean history (no void bars, dates
    /// strictly increasing).
    pub fn compute(&self, bars: &[Bar]) -> Vec<IndicatorRecord> {
        if bars.is_empty() {
            return Vec::new();
        }

        let mut frame = IndicatorFrame::with_len(bars.len());
        for indicator in &self.indicators {
            frame.fill(indicator.as_ref(), bars);
        }

        let records: Vec<IndicatorRecord> = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let ath_5y = frame.at("ath_5y", i);
                IndicatorRecord {
                    symbol: bar.symbol.clone(),
                    date: bar.date,
                    close: bar.close,
                    rsi_14: frame.at("rsi_14", i),
                    sma_50: frame.at("sma_50", i),
                    sma_200: frame.at("sma_200", i),
                    ema_20: frame.at("ema_20", i),
                    macd: frame.at("macd", i),
                    macd_signal: frame.at("macd_signal", i),
                    macd_histogram: frame.at("macd_histogram", i),
                    atr_14: frame.at("atr_14", i),
                    volume_ma_20: frame.at("volume_ma_20", i),
                    ath_1y: frame.at("ath_1y", i),
                    ath_2y: frame.at("ath_2y", i),
                    ath_5y,
                    ath_all_time: frame.at("ath_all_time", i),
                    distance_from_ath_5y: distance_from_high(bar.close, ath_5y)
                        .map(|d| d.min(0.0)),
                }
            })
            .collect();

        debug!(
            symbol = %bars[0].symbol,
            records = records.len(),
            "computed indicator records"
        );
        records
    }
}
