//! Gap detection for a single day's bar sequence — pure, no I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::DaySeries;

/// Expected spacing between consecutive bars.
pub const BAR_INTERVAL_SECS: i64 = 5;

/// 5-second bars across a 6.5-hour regular session.
pub const EXPECTED_SESSION_BARS: usize = 4680;

/// One missing interval between two consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapInterval {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    pub missing_seconds: i64,
    pub missing_bars: i64,
}

/// Gap-check result for one (symbol, date).
///
/// `has_gaps` is set when any interval was found or the day fell short of the
/// expected bar count. The report is logged by the orchestrator and never
/// blocks persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapReport {
    pub symbol: String,
    pub date: NaiveDate,
    pub has_gaps: bool,
    pub gaps: Vec<GapInterval>,
    pub bar_count: usize,
    pub expected_bars: usize,
    pub bar_count_delta: i64,
}

/// Detect gaps in a day's 5-second bar sequence.
///
/// The input should already be sorted; sorting here is defensive.
pub fn check_gaps(series: &DaySeries) -> GapReport {
    let mut sorted = series.bars.clone();
    sorted.sort_by_key(|b| b.timestamp);

    let mut gaps = Vec::new();
    for pair in sorted.windows(2) {
        let diff = pair[1].timestamp - pair[0].timestamp;
        if diff > BAR_INTERVAL_SECS {
            let missing_seconds = diff - BAR_INTERVAL_SECS;
            gaps.push(GapInterval {
                start_timestamp: pair[0].timestamp,
                end_timestamp: pair[1].timestamp,
                missing_seconds,
                missing_bars: missing_seconds / BAR_INTERVAL_SECS,
            });
        }
    }

    let bar_count = sorted.len();
    let has_gaps = !gaps.is_empty() || bar_count < EXPECTED_SESSION_BARS;

    GapReport {
        symbol: series.symbol.clone(),
        date: series.date,
        has_gaps,
        gaps,
        bar_count,
        expected_bars: EXPECTED_SESSION_BARS,
        bar_count_delta: bar_count as i64 - EXPECTED_SESSION_BARS as i64,
    }
}
