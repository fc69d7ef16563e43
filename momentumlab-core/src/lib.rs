//! MomentumLab Core — indicators, signals, domain types, and the backtest simulator.
//!
//! This crate contains the numeric heart of the system:
//! - Domain types (bars, positions, portfolio, trades, equity snapshots)
//! - History validation (void bar removal, ordering checks)
//! - Indicator engine producing one `IndicatorRecord` per bar
//! - Signal rules over indicator records (momentum entry, crossovers)
//! - ATR risk position sizing
//! - Day-by-day simulator over a merged multi-instrument stream
//!
//! Nothing here performs I/O.

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod sizers;
