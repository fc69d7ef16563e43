//! Artifact export — JSON manifest plus CSV tapes.
//!
//! - **JSON**: full round-trip serialization of `BacktestResult` with schema
//!   versioning
//! - **CSV**: trade tape, equity curve and per-symbol indicator history for
//!   external analysis tools
//!
//! All persisted manifests include a `schema_version` field. Newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use momentumlab_core::domain::{EquitySnapshot, TradeRecord};
use momentumlab_core::indicators::IndicatorRecord;

use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::store::IndicatorStore;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: symbol, entry_date, entry_price, exit_date, exit_price, shares,
/// pnl, pnl_pct, exit_reason
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "shares",
        "pnl",
        "pnl_pct",
        "exit_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.as_str(),
            &t.entry_date.to_string(),
            &format!("{:.4}", t.entry_price),
            &t.exit_date.to_string(),
            &format!("{:.4}", t.exit_price),
            &t.shares.to_string(),
            &format!("{:.2}", t.pnl),
            &format!("{:.4}", t.pnl_pct),
            t.exit_reason.as_str(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export an equity curve as CSV with date, total_equity and cash columns.
pub fn export_equity_csv(equity_curve: &[EquitySnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "total_equity", "cash"])?;
    for snap in equity_curve {
        wtr.write_record([
            &snap.date.to_string(),
            &format!("{:.2}", snap.total_equity),
            &format!("{:.2}", snap.cash),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Export indicator records as CSV. Undefined values are empty cells.
pub fn export_indicators_csv(records: &[IndicatorRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "date",
        "close",
        "rsi_14",
        "sma_50",
        "sma_200",
        "ema_20",
        "macd",
        "macd_signal",
        "macd_histogram",
        "atr_14",
        "volume_ma_20",
        "ath_1y",
        "ath_2y",
        "ath_5y",
        "ath_all_time",
        "distance_from_ath_5y",
    ])?;

    for r in records {
        wtr.write_record([
            r.symbol.clone(),
            r.date.to_string(),
            format!("{:.6}", r.close),
            opt(r.rsi_14),
            opt(r.sma_50),
            opt(r.sma_200),
            opt(r.ema_20),
            opt(r.macd),
            opt(r.macd_signal),
            opt(r.macd_histogram),
            opt(r.atr_14),
            opt(r.volume_ma_20),
            opt(r.ath_1y),
            opt(r.ath_2y),
            opt(r.ath_5y),
            opt(r.ath_all_time),
            opt(r.distance_from_ath_5y),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `<SYMBOL>_indicators.csv` for every stored symbol.
pub fn save_indicator_csvs(store: &dyn IndicatorStore, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    for symbol in store.symbols() {
        let path = output_dir.join(format!("{symbol}_indicators.csv"));
        let csv = export_indicators_csv(&store.history(&symbol))?;
        std::fs::write(&path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `run_{first 12 chars of run_id}/` under
/// `output_dir` containing:
/// - `manifest.json` — the full `BacktestResult`
/// - `trades.csv` — trade tape
/// - `equity.csv` — daily equity curve
///
/// Saving the same run twice overwrites the same directory. Returns the path
/// to the directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let short: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("run_{short}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    let equity_csv = export_equity_csv(&result.equity_curve)?;
    std::fs::write(run_dir.join("equity.csv"), &equity_csv)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
