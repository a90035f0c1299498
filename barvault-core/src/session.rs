//! Session-window handling: request end boundary, request duration, and
//! trimming of extended-hours bleed.
//!
//! The provider interprets the end boundary in UTC, but the regular session
//! closes at 16:00 exchange-local time, so the offset has to be derived from
//! the local calendar date rather than a fixed UTC offset — otherwise every
//! request within a few weeks of a DST transition lands an hour off.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;

use crate::domain::{Bar, DaySeries};
use crate::gap::EXPECTED_SESSION_BARS;

/// Instruments that return extended-hours bars when extended hours are
/// requested broadly; their series must be trimmed to the regular session.
const EXTENDED_HOURS_LEAKERS: [&str; 2] = ["VIX", "SPX"];

/// SPX needs a wider window than one day to reliably span its full session.
const FULL_INDEX_SESSION_SYMBOL: &str = "SPX";

/// Request duration understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationToken {
    /// Standard one-day request.
    OneDay,
    /// Wide custom window for the full index session.
    FullIndexSession,
}

impl DurationToken {
    /// The provider's duration string.
    pub fn wire_str(self) -> &'static str {
        match self {
            DurationToken::OneDay => "1 D",
            DurationToken::FullIndexSession => "24000 S",
        }
    }

    /// Wide requests stream far more data and get a longer timeout.
    pub fn is_wide(self) -> bool {
        matches!(self, DurationToken::FullIndexSession)
    }
}

/// Duration to request for this symbol.
pub fn duration_for(symbol: &str) -> DurationToken {
    if symbol == FULL_INDEX_SESSION_SYMBOL {
        DurationToken::FullIndexSession
    } else {
        DurationToken::OneDay
    }
}

/// 16:00 America/New_York on `date`, converted to UTC and formatted as the
/// provider's end-boundary string (`%Y%m%d-%H:%M:%S`).
///
/// Example: 2024-01-02 → `20240102-21:00:00` (EST); 2024-07-01 →
/// `20240701-20:00:00` (EDT).
pub fn session_end_boundary(date: NaiveDate) -> String {
    let close_local = New_York
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 16, 0, 0)
        .single()
        .expect("16:00 America/New_York never falls in a DST transition");
    close_local
        .with_timezone(&Utc)
        .format("%Y%m%d-%H:%M:%S")
        .to_string()
}

/// Trim a fetched series to the regular session.
///
/// Symbols known to leak extended-hours bars are trimmed to the anchor
/// series' timestamp range when a same-day anchor is available, and
/// center-trimmed to the expected session bar count otherwise (an odd excess
/// loses the extra bar from the end). Every other symbol passes through
/// unchanged, sorted.
pub fn normalize(symbol: &str, mut bars: Vec<Bar>, anchor: Option<&DaySeries>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.timestamp);

    if !EXTENDED_HOURS_LEAKERS.contains(&symbol) {
        return bars;
    }

    if let Some((start, end)) = anchor.and_then(|a| a.timestamp_range()) {
        return bars
            .into_iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .collect();
    }

    if bars.len() > EXPECTED_SESSION_BARS {
        let start_idx = (bars.len() - EXPECTED_SESSION_BARS) / 2;
        bars.drain(start_idx + EXPECTED_SESSION_BARS..);
        bars.drain(..start_idx);
    }
    bars
}
