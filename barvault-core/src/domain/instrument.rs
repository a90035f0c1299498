//! Instrument specifications and resolved contracts.

use serde::{Deserialize, Serialize};

/// What kind of instrument a configured spec describes.
///
/// A `RollingFuture` does not name a specific expiry; the resolver picks the
/// contract that was active on the requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Equity,
    Index,
    RollingFuture,
}

/// An instrument as declared in the run configuration. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: String,
    pub kind: InstrumentKind,
    pub venue: String,
    pub currency: String,
}

impl InstrumentSpec {
    pub fn new(
        symbol: impl Into<String>,
        kind: InstrumentKind,
        venue: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            venue: venue.into(),
            currency: currency.into(),
        }
    }
}

/// Concrete tradable kind after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Equity,
    Index,
    Future,
}

/// A concrete contract the provider can serve data for.
///
/// `expiry` is a `YYYYMM` month token, present only for futures.
/// `include_expired` keeps expired contracts queryable for back-dated
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedContract {
    pub symbol: String,
    pub kind: ContractKind,
    pub venue: String,
    pub currency: String,
    pub expiry: Option<String>,
    pub include_expired: bool,
}
