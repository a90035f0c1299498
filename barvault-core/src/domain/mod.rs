//! Domain types: bars, day series, instrument specs, resolved contracts.

pub mod bar;
pub mod instrument;

pub use bar::{Bar, DaySeries};
pub use instrument::{ContractKind, InstrumentKind, InstrumentSpec, ResolvedContract};
