//! MomentumLab Runner — pipeline orchestration around `momentumlab-core`.
//!
//! This crate provides:
//! - Price series sources (CSV directory, in-memory, synthetic)
//! - Parallel indicator indexing into an upsert store
//! - Backtest runs with metrics and run fingerprinting
//! - Latest-signal and recent-crossover scans
//! - JSON/CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod scan;
pub mod store;

pub use config::{BacktestConfig, BacktestSection, ConfigError, RunId};
pub use data_loader::{
    load_universe, CsvDirectorySource, InMemorySource, LoadError, LoadedUniverse,
    PriceSeriesSource, SyntheticSource,
};
pub use metrics::PerformanceMetrics;
pub use runner::{
    index_universe, run_backtest, run_backtest_from_store, run_from_source, BacktestResult,
    IndicatorSummary, RunError, UniverseSummary, SCHEMA_VERSION,
};
pub use scan::{latest_signals, near_ath_rule, recent_crosses, signals_within, SignalHit};
pub use store::{InMemoryIndicatorStore, IndicatorStore};
