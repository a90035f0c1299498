//! Per-item outcomes and the whole-run summary.

use std::path::PathBuf;

use chrono::NaiveDate;

/// What happened to one (symbol, date) work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    /// A new day file was written.
    Written,
    /// The day file already existed and was left untouched.
    SkippedExisting,
    /// The item failed; the run continued with the next item.
    Failed,
}

/// Result record for one (symbol, date) work item.
#[derive(Debug, Clone)]
pub struct DayResult {
    pub symbol: String,
    pub date: NaiveDate,
    pub outcome: DayOutcome,
    /// Bars in the written file. Zero unless `outcome` is `Written`.
    pub bars_written: usize,
    /// Path of the written file.
    pub path: Option<PathBuf>,
    /// Failure description.
    pub error: Option<String>,
}

impl DayResult {
    pub fn written(symbol: &str, date: NaiveDate, bars_written: usize, path: PathBuf) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            outcome: DayOutcome::Written,
            bars_written,
            path: Some(path),
            error: None,
        }
    }

    pub fn skipped(symbol: &str, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            outcome: DayOutcome::SkippedExisting,
            bars_written: 0,
            path: None,
            error: None,
        }
    }

    pub fn failed(symbol: &str, date: NaiveDate, error: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            outcome: DayOutcome::Failed,
            bars_written: 0,
            path: None,
            error: Some(error),
        }
    }
}

/// Summary of a completed run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<DayResult>,
}

impl RunSummary {
    pub fn written(&self) -> usize {
        self.count(DayOutcome::Written)
    }

    pub fn skipped(&self) -> usize {
        self.count(DayOutcome::SkippedExisting)
    }

    pub fn failed(&self) -> usize {
        self.count(DayOutcome::Failed)
    }

    /// Failed items, for the end-of-run report.
    pub fn failures(&self) -> impl Iterator<Item = &DayResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == DayOutcome::Failed)
    }

    fn count(&self, outcome: DayOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}
