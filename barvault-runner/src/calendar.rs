//! US trading calendar: weekends and exchange holidays.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// NYSE/CBOE full-closure holidays, 2024 through 2026. Early-close half days
/// are regular trading days here; the session trim handles the short tape.
const US_MARKET_HOLIDAYS: [(i32, u32, u32); 30] = [
    // 2024
    (2024, 1, 1),
    (2024, 1, 15),
    (2024, 2, 19),
    (2024, 3, 29),
    (2024, 5, 27),
    (2024, 6, 19),
    (2024, 7, 4),
    (2024, 9, 2),
    (2024, 11, 28),
    (2024, 12, 25),
    // 2025
    (2025, 1, 1),
    (2025, 1, 20),
    (2025, 2, 17),
    (2025, 4, 18),
    (2025, 5, 26),
    (2025, 6, 19),
    (2025, 7, 4),
    (2025, 9, 1),
    (2025, 11, 27),
    (2025, 12, 25),
    // 2026
    (2026, 1, 1),
    (2026, 1, 19),
    (2026, 2, 16),
    (2026, 4, 3),
    (2026, 5, 25),
    (2026, 6, 19),
    (2026, 7, 3),
    (2026, 9, 7),
    (2026, 11, 26),
    (2026, 12, 25),
];

/// Whether `date` is a full market holiday.
pub fn is_market_holiday(date: NaiveDate) -> bool {
    US_MARKET_HOLIDAYS
        .iter()
        .any(|&(y, m, d)| date.year() == y && date.month() == m && date.day() == d)
}

/// Whether `date` is a weekday that is not a holiday.
pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_market_holiday(date)
}

/// Trading dates in `[today - lookback_days, yesterday]`, ascending.
///
/// Today itself is excluded: its session may still be open, and a partial
/// day written once can never be completed.
pub fn trading_dates(today: NaiveDate, lookback_days: u32) -> Vec<NaiveDate> {
    let earliest = today - Days::new(u64::from(lookback_days));
    let latest = today - Days::new(1);

    let mut dates = Vec::new();
    let mut date = earliest;
    while date <= latest {
        if is_trading_day(date) {
            dates.push(date);
        }
        date = date + Days::new(1);
    }
    dates
}
