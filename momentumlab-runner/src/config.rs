//! Serializable backtest configuration.
//!
//! A config file holds one `[backtest]` table:
//!
//! ```toml
//! [backtest]
//! initial_capital = 100000.0
//! max_positions = 5
//! risk_percent = 0.02
//! start_date = "2020-01-01"
//! end_date = "2024-12-31"
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use momentumlab_core::engine::SimulatorConfig;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
}

/// The `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestSection {
    pub initial_capital: f64,
    pub max_positions: usize,
    pub risk_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        let sim = SimulatorConfig::default();
        Self {
            initial_capital: sim.initial_capital,
            max_positions: sim.max_positions,
            risk_percent: sim.risk_percent,
            start_date: sim.start_date,
            end_date: sim.end_date,
        }
    }
}

impl BacktestConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulator_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        let b = &self.backtest;
        SimulatorConfig {
            initial_capital: b.initial_capital,
            max_positions: b.max_positions,
            risk_percent: b.risk_percent,
            start_date: b.start_date,
            end_date: b.end_date,
        }
    }

    /// Deterministic hash of this config and the dataset it runs on.
    ///
    /// Two runs with identical configs over identical data share a RunId.
    pub fn run_id(&self, dataset_hash: &str) -> RunId {
        let b = &self.backtest;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&b.initial_capital.to_le_bytes());
        hasher.update(&(b.max_positions as u64).to_le_bytes());
        hasher.update(&b.risk_percent.to_le_bytes());
        for bound in [b.start_date, b.end_date] {
            match bound {
                Some(d) => hasher.update(d.to_string().as_bytes()),
                None => hasher.update(b"-"),
            };
        }
        hasher.update(dataset_hash.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
