//! MomentumLab CLI — indicator, backtest, and scan commands.
//!
//! Commands:
//! - `indicators` — compute indicators for every instrument, print a summary
//! - `backtest` — run the momentum strategy from a TOML config (or defaults)
//! - `crosses` — list golden/death crosses within the last N records
//! - `signals` — list instruments whose latest record carries a true signal,
//!   or every signal in the last N records, optionally with a near-high rule
//!
//! Every command reads either a directory of `<SYMBOL>.csv` files or
//! synthetic histories.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use momentumlab_core::components::signal::CrossDirection;
use momentumlab_core::components::{MomentumSignal, SignalRule};
use momentumlab_runner::export::{save_artifacts, save_indicator_csvs};
use momentumlab_runner::{
    index_universe, latest_signals, load_universe, near_ath_rule, recent_crosses,
    run_backtest_from_store, signals_within, BacktestConfig, BacktestResult, CsvDirectorySource,
    InMemoryIndicatorStore, LoadedUniverse, PriceSeriesSource, SyntheticSource, UniverseSummary,
};

const DEFAULT_SYNTHETIC_SYMBOLS: [&str; 5] = ["SYNA", "SYNB", "SYNC", "SYND", "SYNE"];

#[derive(Parser)]
#[command(
    name = "momentumlab",
    about = "MomentumLab CLI — momentum indicators and portfolio backtests"
)]
struct Cli {
    /// Log filter (e.g. info, debug, momentumlab_runner=trace).
    /// MOMENTUMLAB_LOG takes precedence when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct DataArgs {
    /// Directory holding one `<SYMBOL>.csv` per instrument.
    #[arg(long, required_unless_present = "synthetic")]
    data_dir: Option<PathBuf>,

    /// Generate deterministic synthetic histories instead of reading files.
    #[arg(long, default_value_t = false, conflicts_with = "data_dir")]
    synthetic: bool,

    /// Symbols to load (comma separated). Defaults to every file in
    /// --data-dir, or a fixed synthetic set.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// First synthetic date (YYYY-MM-DD).
    #[arg(long, default_value = "2015-01-01")]
    synthetic_start: NaiveDate,

    /// Last synthetic date (YYYY-MM-DD).
    #[arg(long, default_value = "2024-12-31")]
    synthetic_end: NaiveDate,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators and print a per-instrument summary.
    Indicators {
        #[command(flatten)]
        data: DataArgs,

        /// Write `<SYMBOL>_indicators.csv` files into this directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Run the momentum backtest.
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        /// Path to a TOML config file with a [backtest] table.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Save manifest.json, trades.csv and equity.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print every closed trade.
        #[arg(long, default_value_t = false)]
        trades: bool,
    },
    /// List golden and death crosses in the last N records of each instrument.
    Crosses {
        #[command(flatten)]
        data: DataArgs,

        /// Window size in records.
        #[arg(long, default_value_t = 30)]
        days: usize,
    },
    /// List instruments whose latest record carries a true momentum signal.
    Signals {
        #[command(flatten)]
        data: DataArgs,

        /// Only require the close to be within this fraction of the 5-year
        /// high (0.05 = 5%), ignoring RSI and trend.
        #[arg(long)]
        near_ath: Option<f64>,

        /// List every matching record in the last N records of each
        /// instrument instead of the latest record only.
        #[arg(long)]
        days: Option<usize>,

        /// Show at most this many instruments.
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Indicators { data, out_dir } => run_indicators(&data, out_dir),
        Commands::Backtest {
            data,
            config,
            output_dir,
            trades,
        } => run_backtest_cmd(&data, config, output_dir, trades),
        Commands::Crosses { data, days } => run_crosses(&data, days),
        Commands::Signals {
            data,
            near_ath,
            days,
            limit,
        } => run_signals(&data, near_ath, days, limit),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = std::env::var("MOMENTUMLAB_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

// ─── Data loading ───────────────────────────────────────────────────

fn load(data: &DataArgs) -> Result<LoadedUniverse> {
    let source: Box<dyn PriceSeriesSource> = if data.synthetic {
        if data.synthetic_start > data.synthetic_end {
            bail!("--synthetic-start must not be after --synthetic-end");
        }
        let symbols = if data.symbols.is_empty() {
            DEFAULT_SYNTHETIC_SYMBOLS.iter().map(|s| s.to_string()).collect()
        } else {
            data.symbols.clone()
        };
        Box::new(SyntheticSource::new(
            symbols,
            data.synthetic_start,
            data.synthetic_end,
        ))
    } else {
        let dir = data
            .data_dir
            .clone()
            .ok_or_else(|| anyhow!("one of --data-dir or --synthetic is required"))?;
        if !dir.is_dir() {
            bail!("data directory does not exist: {}", dir.display());
        }
        Box::new(CsvDirectorySource::new(dir))
    };

    let wanted = (!data.symbols.is_empty()).then_some(data.symbols.as_slice());
    let loaded = load_universe(source.as_ref(), wanted)
        .with_context(|| format!("failed to list symbols from {} source", source.name()))?;

    if loaded.series.is_empty() {
        bail!("no price histories could be loaded");
    }
    Ok(loaded)
}

fn index(data: &DataArgs) -> Result<(LoadedUniverse, InMemoryIndicatorStore, UniverseSummary)> {
    let loaded = load(data)?;
    let mut store = InMemoryIndicatorStore::new();
    let summary = index_universe(&loaded, &mut store);
    Ok((loaded, store, summary))
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".into())
}

// ─── Commands ───────────────────────────────────────────────────────

fn run_indicators(data: &DataArgs, out_dir: Option<PathBuf>) -> Result<()> {
    let (_, store, summary) = index(data)?;

    println!(
        "{:<10} {:>7} {:>8} {:>8} {:>8} {:<12} {:<12}",
        "Symbol", "Bars", "Dropped", "Records", "Stored", "First", "Last"
    );
    println!("{}", "-".repeat(71));
    for inst in &summary.instruments {
        println!(
            "{:<10} {:>7} {:>8} {:>8} {:>8} {:<12} {:<12}",
            inst.symbol,
            inst.bars_loaded,
            inst.dropped,
            inst.records,
            inst.stored,
            fmt_date(inst.first_date),
            fmt_date(inst.last_date),
        );
    }
    print_universe(&summary);

    if let Some(dir) = out_dir {
        let written = save_indicator_csvs(&store, &dir)?;
        println!("Wrote {} indicator file(s) to {}", written.len(), dir.display());
    }
    Ok(())
}

fn print_universe(summary: &UniverseSummary) {
    println!();
    println!("Instruments processed: {}", summary.processed());
    println!("Instruments failed:    {}", summary.failed.len());
    println!("Records stored:        {}", summary.total_records);
    println!(
        "Date range:            {} to {}",
        fmt_date(summary.earliest),
        fmt_date(summary.latest)
    );
    for (symbol, reason) in &summary.failed {
        println!("  FAILED {symbol}: {reason}");
    }
}

fn run_backtest_cmd(
    data: &DataArgs,
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    show_trades: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => BacktestConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BacktestConfig::default(),
    };

    let (loaded, store, summary) = index(data)?;
    if !summary.failed.is_empty() {
        print_universe(&summary);
    }

    let result = run_backtest_from_store(&config, &store, &loaded.dataset_hash)?;
    print_summary(&result);
    if show_trades {
        print_trades(&result);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        tracing::debug!(run_id = %result.run_id, dir = %run_dir.display(), "saved artifacts");
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!("Run:            {}", &result.run_id[..12]);
    println!("Instruments:    {}", result.symbols.len());
    println!(
        "Period:         {} to {}",
        fmt_date(result.start_date),
        fmt_date(result.end_date)
    );
    println!("Rows:           {}", result.row_count);
    println!("Signals:        {}", result.signal_count);
    println!();
    println!("--- Performance ---");
    println!("Final Capital:  {:.2}", result.final_cash);
    println!("Total Return:   {:.2}%", m.total_return);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown);
    println!(
        "Trades:         {} ({} won, {} lost)",
        m.total_trades, m.winning_trades, m.losing_trades
    );
    println!("Win Rate:       {:.1}%", m.win_rate);
    println!("Avg Win:        {:.2}%", m.avg_win);
    println!("Avg Loss:       {:.2}%", m.avg_loss);
    println!();
}

fn print_trades(result: &BacktestResult) {
    println!(
        "{:<10} {:<12} {:>10} {:<12} {:>10} {:>5} {:>8} {:>12} {:>8}  {}",
        "Symbol", "Entry", "Price", "Exit", "Price", "Days", "Shares", "PnL", "PnL%", "Reason"
    );
    println!("{}", "-".repeat(106));
    for t in &result.trades {
        println!(
            "{:<10} {:<12} {:>10.2} {:<12} {:>10.2} {:>5} {:>8} {:>12.2} {:>8.2}  {}",
            t.symbol,
            t.entry_date.to_string(),
            t.entry_price,
            t.exit_date.to_string(),
            t.exit_price,
            t.days_held(),
            t.shares,
            t.pnl,
            t.pnl_pct,
            t.exit_reason
        );
    }
    println!();
}

fn run_crosses(data: &DataArgs, days: usize) -> Result<()> {
    let (_, store, _) = index(data)?;
    let events = recent_crosses(&store, days);

    if events.is_empty() {
        println!("No crosses in the last {days} records.");
        return Ok(());
    }

    println!(
        "{:<12} {:<10} {:<7} {:>10} {:>10} {:>10} {:>7}",
        "Date", "Symbol", "Cross", "Close", "SMA50", "SMA200", "RSI"
    );
    println!("{}", "-".repeat(72));
    for e in &events {
        let label = match e.direction {
            CrossDirection::Golden => "golden",
            CrossDirection::Death => "death",
            CrossDirection::None => continue,
        };
        println!(
            "{:<12} {:<10} {:<7} {:>10.2} {:>10.2} {:>10.2} {:>7}",
            e.date.to_string(),
            e.symbol,
            label,
            e.close,
            e.sma_50,
            e.sma_200,
            fmt_opt(e.rsi_14, 1)
        );
    }
    Ok(())
}

fn run_signals(
    data: &DataArgs,
    near_ath: Option<f64>,
    days: Option<usize>,
    limit: Option<usize>,
) -> Result<()> {
    let rule: Box<dyn SignalRule> = match near_ath {
        Some(t) if !(t.is_finite() && t >= 0.0) => {
            bail!("--near-ath must be a non-negative fraction, got {t}")
        }
        Some(t) => Box::new(near_ath_rule(t)),
        None => Box::new(MomentumSignal::default()),
    };

    let (_, store, _) = index(data)?;
    let hits = match days {
        Some(n) => signals_within(&store, rule.as_ref(), n),
        None => latest_signals(&store, rule.as_ref()),
    };

    if hits.is_empty() {
        match days {
            Some(n) => println!("No {} matches in the last {n} records.", rule.name()),
            None => println!("No instrument currently matches the {} rule.", rule.name()),
        }
        return Ok(());
    }

    println!(
        "{:>4} {:<10} {:<12} {:>10} {:>7} {:>10}",
        "Rank", "Symbol", "Date", "Close", "RSI", "vs 5y ATH"
    );
    println!("{}", "-".repeat(58));
    for hit in hits.iter().take(limit.unwrap_or(usize::MAX)) {
        let r = &hit.record;
        println!(
            "{:>4} {:<10} {:<12} {:>10.2} {:>7} {:>9}%",
            hit.rank,
            r.symbol,
            r.date.to_string(),
            r.close,
            fmt_opt(r.rsi_14, 1),
            fmt_opt(r.distance_from_ath_5y.map(|d| d * 100.0), 2)
        );
    }
    Ok(())
}
