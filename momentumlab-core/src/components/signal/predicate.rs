//! Composable threshold predicates over an `IndicatorRecord`.
//!
//! A predicate never errors: any comparison that touches an undefined field
//! evaluates to false, and so does everything that depends on it through
//! `All`. `Any` is false only when no branch is true.

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorRecord;

/// A numeric column of an `IndicatorRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Close,
    Rsi14,
    Sma50,
    Sma200,
    Ema20,
    Macd,
    MacdSignal,
    MacdHistogram,
    Atr14,
    VolumeMa20,
    Ath1y,
    Ath2y,
    Ath5y,
    AthAllTime,
    DistanceFromAth5y,
}

impl Field {
    pub fn read(&self, record: &IndicatorRecord) -> Option<f64> {
        let value = match self {
            Field::Close => Some(record.close),
            Field::Rsi14 => record.rsi_14,
            Field::Sma50 => record.sma_50,
            Field::Sma200 => record.sma_200,
            Field::Ema20 => record.ema_20,
            Field::Macd => record.macd,
            Field::MacdSignal => record.macd_signal,
            Field::MacdHistogram => record.macd_histogram,
            Field::Atr14 => record.atr_14,
            Field::VolumeMa20 => record.volume_ma_20,
            Field::Ath1y => record.ath_1y,
            Field::Ath2y => record.ath_2y,
            Field::Ath5y => record.ath_5y,
            Field::AthAllTime => record.ath_all_time,
            Field::DistanceFromAth5y => record.distance_from_ath_5y,
        };
        value.filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Field(Field),
    Const(f64),
}

impl Operand {
    fn read(&self, record: &IndicatorRecord) -> Option<f64> {
        match self {
            Operand::Field(field) => field.read(record),
            Operand::Const(v) => Some(*v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Compare {
        left: Field,
        cmp: Comparison,
        right: Operand,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// `field <cmp> value`
    pub fn threshold(field: Field, cmp: Comparison, value: f64) -> Self {
        Predicate::Compare {
            left: field,
            cmp,
            right: Operand::Const(value),
        }
    }

    /// `left <cmp> right`
    pub fn fields(left: Field, cmp: Comparison, right: Field) -> Self {
        Predicate::Compare {
            left,
            cmp,
            right: Operand::Field(right),
        }
    }

    pub fn evaluate(&self, record: &IndicatorRecord) -> bool {
        match self {
            Predicate::Compare { left, cmp, right } => {
                match (left.read(record), right.read(record)) {
                    (Some(l), Some(r)) => cmp.holds(l, r),
                    _ => false,
                }
            }
            Predicate::All(parts) => parts.iter().all(|p| p.evaluate(record)),
            Predicate::Any(parts) => parts.iter().any(|p| p.evaluate(record)),
        }
    }
}
