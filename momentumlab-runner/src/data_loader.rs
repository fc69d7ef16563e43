//! Price history sources and universe loading.
//!
//! A `PriceSeriesSource` yields one bar history per symbol. Three sources:
//! 1. `CsvDirectorySource` — one `<SYMBOL>.csv` file per instrument
//! 2. `InMemorySource` — preloaded bars (tests, embedding)
//! 3. `SyntheticSource` — deterministic random walks for offline demos
//!
//! Loading a universe never fails on a single bad instrument: the symbol is
//! logged, recorded as failed, and the rest of the universe proceeds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

use momentumlab_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path} line {line}: unparseable date '{value}'")]
    BadDate {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path} line {line}: negative volume '{value}'")]
    NegativeVolume {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("no price history for '{0}'")]
    UnknownSymbol(String),
}

/// A provider of per-instrument price histories.
pub trait PriceSeriesSource: Send + Sync {
    /// Symbols this source can load, in ascending order.
    fn symbols(&self) -> Result<Vec<String>, LoadError>;

    /// Bars for one symbol, in file order. Validation happens downstream.
    fn load(&self, symbol: &str) -> Result<Vec<Bar>, LoadError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

// ─── CSV directory ──────────────────────────────────────────────────

/// Reads `<dir>/<SYMBOL>.csv` files with a header row containing
/// `date,open,high,low,close,volume` (any order, case-insensitive).
///
/// Dates use `YYYY-MM-DD`. Non-numeric price cells read as NaN so the
/// indicator engine drops the bar; an empty or non-numeric volume reads as
/// zero. A negative volume rejects the whole file.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl PriceSeriesSource for CsvDirectorySource {
    fn symbols(&self) -> Result<Vec<String>, LoadError> {
        let io_err = |source| LoadError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    fn load(&self, symbol: &str) -> Result<Vec<Bar>, LoadError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(LoadError::UnknownSymbol(symbol.to_string()));
        }
        read_bars_csv(&path, symbol)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, path: &Path) -> Result<Self, LoadError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &'static str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name,
            })
        };
        Ok(Self {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

fn parse_price(cell: Option<&str>) -> f64 {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Share count from a volume cell; `None` for a negative number.
fn parse_volume(cell: Option<&str>) -> Option<u64> {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return Some(0);
    };
    if let Ok(v) = cell.parse::<u64>() {
        return Some(v);
    }
    match cell.parse::<f64>() {
        Ok(v) if v < 0.0 => None,
        Ok(v) if v.is_finite() => Some(v.round() as u64),
        _ => Some(0),
    }
}

/// Read one symbol's bars from a CSV file.
pub fn read_bars_csv(path: &Path, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let columns = Columns::resolve(reader.headers().map_err(csv_err)?, path)?;

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());
        let raw_date = record.get(columns.date).unwrap_or("");
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            LoadError::BadDate {
                path: path.to_path_buf(),
                line,
                value: raw_date.to_string(),
            }
        })?;
        let raw_volume = columns.volume.and_then(|i| record.get(i));
        let volume = parse_volume(raw_volume).ok_or_else(|| LoadError::NegativeVolume {
            path: path.to_path_buf(),
            line,
            value: raw_volume.unwrap_or("").to_string(),
        })?;

        bars.push(Bar {
            symbol: symbol.to_string(),
            date,
            open: parse_price(record.get(columns.open)),
            high: parse_price(record.get(columns.high)),
            low: parse_price(record.get(columns.low)),
            close: parse_price(record.get(columns.close)),
            volume,
        });
    }

    debug!(symbol, path = %path.display(), bars = bars.len(), "read csv");
    Ok(bars)
}

// ─── In-memory ──────────────────────────────────────────────────────

/// Preloaded histories keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: BTreeMap<String, Vec<Bar>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.series.insert(symbol.into(), bars);
    }

    pub fn with(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }
}

impl PriceSeriesSource for InMemorySource {
    fn symbols(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.series.keys().cloned().collect())
    }

    fn load(&self, symbol: &str) -> Result<Vec<Bar>, LoadError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| LoadError::UnknownSymbol(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk histories for a fixed symbol list.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    symbols: Vec<String>,
    start: NaiveDate,
    end: NaiveDate,
}

impl SyntheticSource {
    pub fn new(symbols: Vec<String>, start: NaiveDate, end: NaiveDate) -> Self {
        let mut symbols = symbols;
        symbols.sort();
        symbols.dedup();
        Self {
            symbols,
            start,
            end,
        }
    }
}

impl PriceSeriesSource for SyntheticSource {
    fn symbols(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.symbols.clone())
    }

    fn load(&self, symbol: &str) -> Result<Vec<Bar>, LoadError> {
        if !self.symbols.iter().any(|s| s == symbol) {
            return Err(LoadError::UnknownSymbol(symbol.to_string()));
        }
        Ok(generate_synthetic_bars(symbol, self.start, self.end))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Generate synthetic bars for testing/development.
///
/// Produces a random walk with a slight upward drift from a starting price
/// of 100.0, weekdays only. The walk is seeded from the symbol name, so the
/// same symbol always yields the same history.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.025..0.0265);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            symbol: symbol.to_string(),
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

// ─── Universe loading ───────────────────────────────────────────────

/// Raw histories for a universe, plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    pub series: BTreeMap<String, Vec<Bar>>,
    /// Symbols that could not be read, with the reason.
    pub failed: Vec<(String, String)>,
    /// Dataset hash for fingerprinting (BLAKE3 over all bar data).
    pub dataset_hash: String,
    pub source: String,
}

impl LoadedUniverse {
    pub fn symbols(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    pub fn bar_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

/// Load every requested symbol (or every symbol the source offers).
///
/// Fails only if the symbol list itself cannot be obtained.
pub fn load_universe(
    source: &dyn PriceSeriesSource,
    symbols: Option<&[String]>,
) -> Result<LoadedUniverse, LoadError> {
    let symbols = match symbols {
        Some(list) => list.to_vec(),
        None => source.symbols()?,
    };

    let mut series = BTreeMap::new();
    let mut failed = Vec::new();
    for symbol in symbols {
        match source.load(&symbol) {
            Ok(bars) => {
                series.insert(symbol, bars);
            }
            Err(e) => {
                warn!(%symbol, source = source.name(), error = %e, "skipping symbol");
                failed.push((symbol, e.to_string()));
            }
        }
    }

    let dataset_hash = compute_dataset_hash(&series);
    Ok(LoadedUniverse {
        series,
        failed,
        dataset_hash,
        source: source.name().to_string(),
    })
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// The hash covers dates and all OHLCV values in sorted symbol order.
pub fn compute_dataset_hash(series: &BTreeMap<String, Vec<Bar>>) -> String {
    let mut hasher = blake3::Hasher::new();

    for (symbol, bars) in series {
        hasher.update(symbol.as_bytes());
        for bar in bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, body: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn reads_csv_with_reordered_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "ACME.csv",
            "Date,Close,Open,High,Low,Volume\n\
             2024-01-02,101,100,102,99,1000\n\
             2024-01-03,102,101,103,100,\n",
        );

        let source = CsvDirectorySource::new(dir.path());
        let bars = source.load("ACME").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].symbol, "ACME");
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].volume, 1000);
        assert_eq!(bars[1].volume, 0, "empty volume reads as zero");
    }

    #[test]
    fn non_numeric_price_reads_as_nan() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "GAP.csv",
            "date,open,high,low,close,volume\n2024-01-02,n/a,2,1,1.5,10\n",
        );
        let bars = CsvDirectorySource::new(dir.path()).load("GAP").unwrap();
        assert!(bars[0].open.is_nan());
        assert!(bars[0].is_void());
    }

    #[test]
    fn bad_date_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "BAD.csv",
            "date,open,high,low,close\n02/01/2024,1,2,0.5,1.5\n",
        );
        let err = CsvDirectorySource::new(dir.path()).load("BAD").unwrap_err();
        assert!(matches!(err, LoadError::BadDate { .. }));
    }

    #[test]
    fn negative_volume_rejects_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "NEG.csv",
            "date,open,high,low,close,volume\n\
             2024-01-02,1,2,0.5,1.5,100\n\
             2024-01-03,1,2,0.5,1.5,-5\n",
        );
        let err = CsvDirectorySource::new(dir.path()).load("NEG").unwrap_err();
        match err {
            LoadError::NegativeVolume { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "-5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_volume_reads_as_zero() {
        assert_eq!(parse_volume(Some("1.2e3")), Some(1200));
        assert_eq!(parse_volume(Some("n/a")), Some(0));
        assert_eq!(parse_volume(Some("-0.0")), Some(0));
        assert_eq!(parse_volume(None), Some(0));
        assert_eq!(parse_volume(Some("-1")), None);
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "NOC.csv", "date,open,high,low\n2024-01-02,1,2,0.5\n");
        let err = CsvDirectorySource::new(dir.path()).load("NOC").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "close", .. }));
    }

    #[test]
    fn lists_csv_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "ZED.csv", "date,open,high,low,close\n");
        write_file(dir.path(), "ABC.csv", "date,open,high,low,close\n");
        write_file(dir.path(), "notes.txt", "ignore me");
        let symbols = CsvDirectorySource::new(dir.path()).symbols().unwrap();
        assert_eq!(symbols, vec!["ABC", "ZED"]);
    }

    #[test]
    fn synthetic_bars_are_deterministic_weekdays() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let a = generate_synthetic_bars("SYN", start, end);
        let b = generate_synthetic_bars("SYN", start, end);
        assert_eq!(a, b);
        assert_eq!(a.len(), 23);
        assert!(a.iter().all(|bar| bar.date.weekday().number_from_monday() <= 5));
        assert!(a.iter().all(|bar| bar.low <= bar.close && bar.close <= bar.high));
        assert_ne!(a, generate_synthetic_bars("OTHER", start, end));
    }

    #[test]
    fn load_universe_records_failures() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let source = InMemorySource::new().with("AAA", generate_synthetic_bars("AAA", start, start));
        let wanted = vec!["AAA".to_string(), "MISSING".to_string()];
        let loaded = load_universe(&source, Some(&wanted)).unwrap();
        assert_eq!(loaded.symbols(), vec!["AAA"]);
        assert_eq!(loaded.failed.len(), 1);
        assert_eq!(loaded.failed[0].0, "MISSING");
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut series = BTreeMap::new();
        series.insert("A".to_string(), generate_synthetic_bars("A", start, end));
        let h1 = compute_dataset_hash(&series);
        assert_eq!(h1, compute_dataset_hash(&series));

        series.get_mut("A").unwrap()[3].close += 0.01;
        assert_ne!(h1, compute_dataset_hash(&series));
    }
}
