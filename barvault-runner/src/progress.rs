//! Progress reporting for download runs.

use chrono::NaiveDate;

use barvault_core::gap::GapReport;

use crate::result::{DayOutcome, DayResult, RunSummary};

/// Observer for run progress. The orchestrator drives it; implementations
/// decide what to surface.
pub trait RunProgress {
    /// Connection attempt is starting.
    fn on_connecting(&self, host: &str, port: u16) {
        let _ = (host, port);
    }

    /// The date range has been computed.
    fn on_range(&self, first: Option<NaiveDate>, last: Option<NaiveDate>, count: usize) {
        let _ = (first, last, count);
    }

    /// One (symbol, date) item is starting.
    fn on_item_start(&self, symbol: &str, date: NaiveDate) {
        let _ = (symbol, date);
    }

    /// The anchor day file exists but could not be read; the date proceeds
    /// without an anchor.
    fn on_anchor_unreadable(&self, symbol: &str, date: NaiveDate, error: &str) {
        let _ = (symbol, date, error);
    }

    /// A gap report for a fetched series, before it is written.
    fn on_gap_report(&self, report: &GapReport) {
        let _ = report;
    }

    /// One (symbol, date) item finished.
    fn on_item_done(&self, result: &DayResult) {
        let _ = result;
    }

    /// The run is over.
    fn on_run_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// Prints progress to stdout. Used by the CLI.
pub struct StdoutProgress;

impl RunProgress for StdoutProgress {
    fn on_connecting(&self, host: &str, port: u16) {
        println!("Connecting to gateway at {host}:{port}...");
    }

    fn on_range(&self, first: Option<NaiveDate>, last: Option<NaiveDate>, count: usize) {
        match (first, last) {
            (Some(first), Some(last)) => {
                println!("Processing {count} trading dates: {first} through {last}");
            }
            _ => println!("No trading dates in range; nothing to do"),
        }
    }

    fn on_item_start(&self, symbol: &str, date: NaiveDate) {
        println!("  {date} {symbol}: fetching...");
    }

    fn on_anchor_unreadable(&self, symbol: &str, date: NaiveDate, error: &str) {
        eprintln!("  {date} {symbol}: WARNING anchor unreadable, trimming without it: {error}");
    }

    fn on_gap_report(&self, report: &GapReport) {
        if report.has_gaps {
            println!(
                "  {} {}: WARNING {} bars ({} expected), {} gap(s)",
                report.date,
                report.symbol,
                report.bar_count,
                report.expected_bars,
                report.gaps.len()
            );
        }
    }

    fn on_item_done(&self, result: &DayResult) {
        match result.outcome {
            DayOutcome::Written => {
                println!(
                    "  {} {}: wrote {} bars",
                    result.date, result.symbol, result.bars_written
                );
            }
            DayOutcome::SkippedExisting => {
                println!("  {} {}: exists, skipped", result.date, result.symbol);
            }
            DayOutcome::Failed => {
                let reason = result.error.as_deref().unwrap_or("unknown error");
                eprintln!("  {} {}: FAILED: {reason}", result.date, result.symbol);
            }
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        println!(
            "Done: {} written, {} skipped, {} failed",
            summary.written(),
            summary.skipped(),
            summary.failed()
        );
        for failure in summary.failures() {
            let reason = failure.error.as_deref().unwrap_or("unknown error");
            println!("  failed: {} {}: {reason}", failure.date, failure.symbol);
        }
    }
}

/// Reports nothing. Used by tests.
pub struct SilentProgress;

impl RunProgress for SilentProgress {}
