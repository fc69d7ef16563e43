//! Backtest runner — wires together data loading, indicators, the store,
//! the simulator and metrics.
//!
//! Entry points:
//! - `index_universe()`: computes indicators for every loaded instrument in
//!   parallel and upserts them into an `IndicatorStore`.
//! - `run_backtest()`: indexes a loaded universe into a fresh in-memory store
//!   and simulates over it. `run_backtest_from_store()` does the same against
//!   an already populated store, and `run_from_source()` loads first.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use momentumlab_core::components::MomentumSignal;
use momentumlab_core::data::{clean_history, HistoryError};
use momentumlab_core::domain::{Bar, EquitySnapshot, TradeRecord};
use momentumlab_core::engine::{build_stream, SimulationError, Simulator};
use momentumlab_core::indicators::{IndicatorEngine, IndicatorRecord};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_universe, LoadError, LoadedUniverse, PriceSeriesSource};
use crate::metrics::PerformanceMetrics;
use crate::store::{InMemoryIndicatorStore, IndicatorStore};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("no indicator history available to simulate")]
    NoData,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

// ─── Indicator indexing ─────────────────────────────────────────────

/// Processing report for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub symbol: String,
    pub bars_loaded: usize,
    /// Void bars removed before computation.
    pub dropped: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Records produced by the engine (one per surviving bar).
    pub records: usize,
    /// Records written to the store.
    pub stored: usize,
}

/// Universe-level outcome of an indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseSummary {
    pub instruments: Vec<IndicatorSummary>,
    /// Instruments rejected at load or validation, with the reason.
    pub failed: Vec<(String, String)>,
    pub total_records: usize,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

impl UniverseSummary {
    pub fn processed(&self) -> usize {
        self.instruments.len()
    }
}

/// Validate and compute one instrument's records.
pub fn compute_instrument(
    engine: &IndicatorEngine,
    symbol: &str,
    bars: &[Bar],
) -> Result<(IndicatorSummary, Vec<IndicatorRecord>), HistoryError> {
    let clean = clean_history(bars)?;
    let records = engine.compute(&clean.bars);
    let summary = IndicatorSummary {
        symbol: symbol.to_string(),
        bars_loaded: bars.len(),
        dropped: clean.dropped,
        first_date: clean.first_date(),
        last_date: clean.last_date(),
        records: records.len(),
        stored: 0,
    };
    Ok((summary, records))
}

/// Compute indicators for every instrument and upsert them into `store`.
///
/// Instruments are computed in parallel; writes happen sequentially in symbol
/// order. An instrument with structurally invalid history is logged, recorded
/// in `failed` and skipped.
pub fn index_universe(loaded: &LoadedUniverse, store: &mut dyn IndicatorStore) -> UniverseSummary {
    let engine = IndicatorEngine::new();
    let series: Vec<(&String, &Vec<Bar>)> = loaded.series.iter().collect();

    let computed: Vec<_> = series
        .par_iter()
        .map(|(symbol, bars)| (*symbol, compute_instrument(&engine, symbol, bars)))
        .collect();

    let mut summary = UniverseSummary {
        failed: loaded.failed.clone(),
        ..UniverseSummary::default()
    };

    for (symbol, outcome) in computed {
        match outcome {
            Ok((mut instrument, records)) => {
                instrument.stored = store.upsert(&records);
                info!(
                    symbol = %instrument.symbol,
                    bars = instrument.bars_loaded,
                    dropped = instrument.dropped,
                    records = instrument.records,
                    stored = instrument.stored,
                    "indexed instrument"
                );
                summary.total_records += instrument.stored;
                summary.earliest = min_date(summary.earliest, instrument.first_date);
                summary.latest = max_date(summary.latest, instrument.last_date);
                summary.instruments.push(instrument);
            }
            Err(e) => {
                warn!(%symbol, error = %e, "rejected instrument history");
                summary.failed.push((symbol.clone(), e.to_string()));
            }
        }
    }

    info!(
        processed = summary.processed(),
        failed = summary.failed.len(),
        records = summary.total_records,
        "indexing complete"
    );
    summary
}

fn min_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, y) => x.or(y),
    }
}

fn max_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

// ─── Backtest ───────────────────────────────────────────────────────

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub symbols: Vec<String>,
    pub dataset_hash: String,
    /// First and last simulated date (None if nothing was simulated).
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Stream rows seen by the simulator, and how many carried a true signal.
    pub row_count: usize,
    pub signal_count: usize,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquitySnapshot>,
    pub final_cash: f64,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load from `source`, then index and simulate.
pub fn run_from_source(
    config: &BacktestConfig,
    source: &dyn PriceSeriesSource,
    symbols: Option<&[String]>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_universe(source, symbols)?;
    info!(
        source = %loaded.source,
        symbols = loaded.series.len(),
        bars = loaded.bar_count(),
        "loaded universe"
    );
    run_backtest(config, &loaded)
}

/// Index a loaded universe into a fresh store, then simulate over it.
pub fn run_backtest(
    config: &BacktestConfig,
    loaded: &LoadedUniverse,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let mut store = InMemoryIndicatorStore::new();
    index_universe(loaded, &mut store);
    run_backtest_from_store(config, &store, &loaded.dataset_hash)
}

/// Simulate the momentum strategy over every instrument in `store`.
pub fn run_backtest_from_store(
    config: &BacktestConfig,
    store: &dyn IndicatorStore,
    dataset_hash: &str,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    if store.is_empty() {
        return Err(RunError::NoData);
    }

    let symbols = store.symbols();
    let histories: Vec<Vec<IndicatorRecord>> =
        symbols.iter().map(|s| store.history(s)).collect();

    let rule = MomentumSignal::default();
    let stream = build_stream(&histories, &rule)?;
    let signal_count = stream.iter().filter(|row| row.signal).count();

    let sim_config = config.simulator_config();
    let simulator = Simulator::new(sim_config.clone())?;
    let result = simulator.run(&stream)?;

    let metrics = PerformanceMetrics::compute(
        &result.trades,
        &result.equity_curve,
        sim_config.initial_capital,
        result.final_cash,
    );
    let run_id = config.run_id(dataset_hash);

    info!(
        run_id = %&run_id[..12],
        symbols = symbols.len(),
        rows = stream.len(),
        signals = signal_count,
        trades = metrics.total_trades,
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        symbols,
        dataset_hash: dataset_hash.to_string(),
        start_date: result.equity_curve.first().map(|s| s.date),
        end_date: result.equity_curve.last().map(|s| s.date),
        row_count: stream.len(),
        signal_count,
        metrics,
        trades: result.trades,
        equity_curve: result.equity_curve,
        final_cash: result.final_cash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::{compute_dataset_hash, generate_synthetic_bars};
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn universe(series: BTreeMap<String, Vec<Bar>>) -> LoadedUniverse {
        let dataset_hash = compute_dataset_hash(&series);
        LoadedUniverse {
            series,
            failed: Vec::new(),
            dataset_hash,
            source: "test".into(),
        }
    }

    fn synthetic(symbols: &[&str]) -> LoadedUniverse {
        let series = symbols
            .iter()
            .map(|s| {
                (
                    s.to_string(),
                    generate_synthetic_bars(s, d(2019, 1, 1), d(2022, 12, 31)),
                )
            })
            .collect();
        universe(series)
    }

    #[test]
    fn index_reports_each_instrument() {
        let loaded = synthetic(&["AAA", "BBB"]);
        let mut store = InMemoryIndicatorStore::new();
        let summary = index_universe(&loaded, &mut store);

        assert_eq!(summary.processed(), 2);
        assert!(summary.failed.is_empty());
        assert_eq!(summary.instruments[0].symbol, "AAA");
        assert_eq!(summary.total_records, store.len());
        assert_eq!(summary.earliest, store.date_range().map(|r| r.0));
        for inst in &summary.instruments {
            assert_eq!(inst.records, inst.bars_loaded - inst.dropped);
            // MACD is defined from the first bar, so every record is stored
            assert_eq!(inst.stored, inst.records);
        }
    }

    #[test]
    fn invalid_history_is_skipped_not_fatal() {
        let mut series = BTreeMap::new();
        let good = generate_synthetic_bars("GOOD", d(2020, 1, 1), d(2020, 6, 30));
        let mut bad = generate_synthetic_bars("BAD", d(2020, 1, 1), d(2020, 6, 30));
        bad.swap(3, 4);
        series.insert("GOOD".to_string(), good);
        series.insert("BAD".to_string(), bad);

        let mut store = InMemoryIndicatorStore::new();
        let summary = index_universe(&universe(series), &mut store);

        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "BAD");
        assert_eq!(store.symbols(), vec!["GOOD"]);
    }

    #[test]
    fn backtest_is_deterministic() {
        let loaded = synthetic(&["AAA", "BBB", "CCC"]);
        let config = BacktestConfig::default();
        let a = run_backtest(&config, &loaded).unwrap();
        let b = run_backtest(&config, &loaded).unwrap();

        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.trades, b.trades);
        assert_eq!(a.equity_curve, b.equity_curve);
        assert_eq!(a.schema_version, SCHEMA_VERSION);
        assert_eq!(a.symbols, vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn final_equity_equals_final_cash() {
        let loaded = synthetic(&["AAA", "BBB", "CCC", "DDD"]);
        let result = run_backtest(&BacktestConfig::default(), &loaded).unwrap();
        let last = result.equity_curve.last().unwrap();
        assert!(result.trades.iter().all(|t| t.shares > 0));
        let expected_cash = 100_000.0 + result.trades.iter().map(|t| t.pnl).sum::<f64>();
        assert!((result.final_cash - expected_cash).abs() < 1e-6);
        assert!((last.total_equity - result.final_cash).abs() < 1e-6);
    }

    #[test]
    fn empty_store_is_an_error() {
        let store = InMemoryIndicatorStore::new();
        let err = run_backtest_from_store(&BacktestConfig::default(), &store, "x").unwrap_err();
        assert!(matches!(err, RunError::NoData));
    }

    #[test]
    fn invalid_config_is_rejected_before_indexing() {
        let mut config = BacktestConfig::default();
        config.backtest.max_positions = 0;
        let err = run_backtest(&config, &synthetic(&["AAA"])).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn date_window_bounds_the_equity_curve() {
        let loaded = synthetic(&["AAA", "BBB"]);
        let mut config = BacktestConfig::default();
        config.backtest.start_date = Some(d(2021, 1, 1));
        config.backtest.end_date = Some(d(2021, 12, 31));
        let result = run_backtest(&config, &loaded).unwrap();

        assert!(result.start_date.unwrap() >= d(2021, 1, 1));
        assert!(result.end_date.unwrap() <= d(2021, 12, 31));
        assert!(result
            .trades
            .iter()
            .all(|t| t.exit_date <= d(2021, 12, 31)));
    }
}
