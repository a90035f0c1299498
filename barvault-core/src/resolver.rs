//! Contract resolution: instrument spec + target date → concrete contract.
//!
//! Equities and indexes pass through unchanged, with one hard override: VIX
//! is always resolved as an index on CBOE, whatever the config says, because
//! the provider cannot disambiguate the venue otherwise. Rolling futures
//! resolve an expiry month from the family's roll rule. The roll day itself
//! counts as already rolled — requests on the roll date use the next
//! contract.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use thiserror::Error;

use crate::domain::{ContractKind, InstrumentKind, InstrumentSpec, ResolvedContract};

/// VIX must always use Index/CBOE regardless of what the config says.
const VIX_SYMBOL: &str = "VIX";
const VIX_VENUE: &str = "CBOE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no contract resolution rule for {symbol} ({kind:?})")]
    UnsupportedInstrumentKind {
        symbol: String,
        kind: InstrumentKind,
    },
}

/// Expiry cadence of a rolling futures family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuturesFamily {
    /// Rolls on the 3rd Friday of Mar/Jun/Sep/Dec.
    Quarterly,
    /// Rolls on the 3rd Wednesday of every month.
    Monthly,
}

/// Roll rule for the rolling futures we know how to resolve.
fn family_for(symbol: &str) -> Option<FuturesFamily> {
    match symbol {
        "ES" => Some(FuturesFamily::Quarterly),
        "VXM" => Some(FuturesFamily::Monthly),
        _ => None,
    }
}

/// Build the concrete contract for `spec` as of `date`.
pub fn resolve(spec: &InstrumentSpec, date: NaiveDate) -> Result<ResolvedContract, ResolveError> {
    if spec.symbol == VIX_SYMBOL {
        return Ok(ResolvedContract {
            symbol: VIX_SYMBOL.to_string(),
            kind: ContractKind::Index,
            venue: VIX_VENUE.to_string(),
            currency: spec.currency.clone(),
            expiry: None,
            include_expired: false,
        });
    }

    let kind = match spec.kind {
        InstrumentKind::Equity => ContractKind::Equity,
        InstrumentKind::Index => ContractKind::Index,
        InstrumentKind::RollingFuture => {
            let family = family_for(&spec.symbol).ok_or_else(|| {
                ResolveError::UnsupportedInstrumentKind {
                    symbol: spec.symbol.clone(),
                    kind: spec.kind,
                }
            })?;
            let expiry = match family {
                FuturesFamily::Quarterly => active_quarterly_month(date),
                FuturesFamily::Monthly => active_monthly_month(date),
            };
            return Ok(ResolvedContract {
                symbol: spec.symbol.clone(),
                kind: ContractKind::Future,
                venue: spec.venue.clone(),
                currency: spec.currency.clone(),
                expiry: Some(expiry),
                include_expired: true,
            });
        }
    };

    Ok(ResolvedContract {
        symbol: spec.symbol.clone(),
        kind,
        venue: spec.venue.clone(),
        currency: spec.currency.clone(),
        expiry: None,
        include_expired: false,
    })
}

/// Active quarterly contract month (`YYYYMM`) for `date`.
///
/// Quarterly contracts expire on the 3rd Friday of Mar/Jun/Sep/Dec; on or
/// after that Friday the next quarterly month is active.
pub fn active_quarterly_month(date: NaiveDate) -> String {
    for month in [3u32, 6, 9, 12] {
        if month < date.month() {
            continue;
        }
        let roll = third_weekday(date.year(), month, Weekday::Fri);
        if date < roll {
            return format_month(date.year(), month);
        }
    }
    // Past the December roll — next March.
    format_month(date.year() + 1, 3)
}

/// Active monthly contract month (`YYYYMM`) for `date`.
///
/// Monthly contracts expire on the 3rd Wednesday; on or after that Wednesday
/// the next calendar month is active.
pub fn active_monthly_month(date: NaiveDate) -> String {
    let roll = third_weekday(date.year(), date.month(), Weekday::Wed);
    if date < roll {
        return format_month(date.year(), date.month());
    }
    if date.month() == 12 {
        format_month(date.year() + 1, 1)
    } else {
        format_month(date.year(), date.month() + 1)
    }
}

fn third_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .expect("valid year/month from chrono date parts");
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    first
        .checked_add_days(Days::new(u64::from(offset) + 14))
        .expect("third weekday is always within the month")
}

fn format_month(year: i32, month: u32) -> String {
    format!("{year}{month:02}")
}
