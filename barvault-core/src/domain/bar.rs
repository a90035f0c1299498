//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One 5-second OHLCV bar.
///
/// The timestamp is absolute epoch seconds, as delivered by the provider.
/// Volume is fractional because index instruments report synthetic volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// All bars for one instrument on one trading day.
///
/// A non-empty series is ascending by timestamp; `sort_bars` restores the
/// order after ingesting provider output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySeries {
    pub symbol: String,
    pub date: NaiveDate,
    pub bars: Vec<Bar>,
}

impl DaySeries {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            bars,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Sort bars ascending by timestamp.
    pub fn sort_bars(&mut self) {
        self.bars.sort_by_key(|b| b.timestamp);
    }

    /// Timestamp range [first, last] of the series, if non-empty.
    pub fn timestamp_range(&self) -> Option<(i64, i64)> {
        let first = self.bars.first()?.timestamp;
        let last = self.bars.last()?.timestamp;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar(ts: i64) -> Bar {
        Bar {
            timestamp: ts,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1000.0,
        }
    }

    #[test]
    fn bar_count_matches_len() {
        let series = DaySeries::new(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            vec![sample_bar(1704207600), sample_bar(1704207605)],
        );
        assert_eq!(series.bar_count(), 2);
    }

    #[test]
    fn sort_restores_ascending_order() {
        let mut series = DaySeries::new(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            vec![
                sample_bar(1704207610),
                sample_bar(1704207600),
                sample_bar(1704207605),
            ],
        );
        series.sort_bars();
        let ts: Vec<i64> = series.bars.iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![1704207600, 1704207605, 1704207610]);
        assert_eq!(series.timestamp_range(), Some((1704207600, 1704207610)));
    }

    #[test]
    fn empty_series_has_no_range() {
        let series = DaySeries::new("SPY", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), vec![]);
        assert_eq!(series.timestamp_range(), None);
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar(1704207600);
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
