//! Write-once per-day bar store.
//!
//! Layout: `{root}/bars/{SYMBOL}/{YYYY-MM-DD}_{SYMBOL}.csv`
//!
//! The provider permanently forgets bars older than its lookback window, so
//! an overwritten file is unrecoverable data loss. Writes open the target
//! with `create_new`: an existing file fails the call before a single byte
//! is touched, independently of the caller's own `exists` check.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Bar, DaySeries};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bar file already exists and will not be overwritten: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("bar file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bar file format error: {0}")]
    Csv(#[from] csv::Error),
}

/// The per-day bar file store.
pub struct BarStore {
    root: PathBuf,
}

impl BarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for a (symbol, date) file. No I/O.
    pub fn day_path(&self, symbol: &str, date: NaiveDate) -> PathBuf {
        self.root
            .join("bars")
            .join(symbol)
            .join(format!("{date}_{symbol}.csv"))
    }

    /// Whether the (symbol, date) file is already on disk.
    pub fn exists(&self, symbol: &str, date: NaiveDate) -> bool {
        self.day_path(symbol, date).exists()
    }

    /// Write a day series to its canonical path, creating parent directories.
    ///
    /// Bars are written in ascending timestamp order under the fixed
    /// `timestamp,open,high,low,close,volume` header. Fails with
    /// `AlreadyExists` if the target is present; the existing file is left
    /// untouched.
    pub fn write(&self, series: &DaySeries) -> Result<PathBuf, StoreError> {
        let path = self.day_path(&series.symbol, series.date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists { path });
            }
            Err(e) => return Err(e.into()),
        };

        let mut sorted = series.bars.clone();
        sorted.sort_by_key(|b| b.timestamp);

        let mut writer = csv::Writer::from_writer(file);
        for bar in &sorted {
            writer.serialize(bar)?;
        }
        writer.flush().map_err(StoreError::Io)?;

        Ok(path)
    }

    /// Read the (symbol, date) file back into a day series.
    pub fn read(&self, symbol: &str, date: NaiveDate) -> Result<DaySeries, StoreError> {
        let path = self.day_path(symbol, date);
        if !path.exists() {
            return Err(StoreError::NotFound { path });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut bars: Vec<Bar> = Vec::new();
        for record in reader.deserialize() {
            bars.push(record?);
        }

        Ok(DaySeries::new(symbol, date, bars))
    }
}
