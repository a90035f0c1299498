//! Run configuration loaded from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use barvault_core::domain::InstrumentSpec;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("data_dir must be an absolute path: {0}")]
    RelativeDataDir(PathBuf),

    #[error("config declares no instruments")]
    NoInstruments,

    #[error("instrument symbol must be non-empty uppercase: '{0}'")]
    BadSymbol(String),

    #[error("instrument '{0}' has an empty venue")]
    EmptyVenue(String),

    #[error("instrument '{0}' has an empty currency")]
    EmptyCurrency(String),
}

/// Configuration for a download run.
///
/// Immutable once loaded; every field the orchestrator consults comes from
/// here or from a compile-time constant.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Root directory of the bar store. Must be absolute so a run started
    /// from a different working directory cannot fork the archive.
    pub data_dir: PathBuf,

    /// Gateway bridge host.
    #[serde(default = "default_host")]
    pub gateway_host: String,

    /// Gateway bridge port.
    #[serde(default = "default_port")]
    pub gateway_port: u16,

    /// How far back the date range reaches, in calendar days before today.
    #[serde(default = "default_lookback")]
    pub max_lookback_days: u32,

    /// Symbol whose stored series anchors the regular-session trim for
    /// extended-hours leakers.
    #[serde(default = "default_anchor")]
    pub anchor_symbol: String,

    /// Instruments to download, processed in declaration order.
    pub instruments: Vec<InstrumentSpec>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7497
}

fn default_lookback() -> u32 {
    180
}

fn default_anchor() -> String {
    "SPY".to_string()
}

impl RunConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        config.dedupe_instruments();
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.data_dir.is_absolute() {
            return Err(ConfigError::RelativeDataDir(self.data_dir.clone()));
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        for spec in &self.instruments {
            let symbol = &spec.symbol;
            if symbol.is_empty() || symbol.chars().any(|c| c.is_ascii_lowercase()) {
                return Err(ConfigError::BadSymbol(symbol.clone()));
            }
            if spec.venue.is_empty() {
                return Err(ConfigError::EmptyVenue(symbol.clone()));
            }
            if spec.currency.is_empty() {
                return Err(ConfigError::EmptyCurrency(symbol.clone()));
            }
        }
        Ok(())
    }

    /// Duplicate symbols keep the first declaration; later ones are dropped.
    fn dedupe_instruments(&mut self) {
        let mut seen = Vec::new();
        self.instruments.retain(|spec| {
            if seen.contains(&spec.symbol) {
                false
            } else {
                seen.push(spec.symbol.clone());
                true
            }
        });
    }
}
