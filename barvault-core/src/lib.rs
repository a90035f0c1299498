//! BarVault Core — instrument resolution, session windows, gap checking,
//! write-once persistence, and the paced feed client.
//!
//! This crate contains everything below the batch orchestrator:
//! - Domain types (bars, day series, instrument specs, resolved contracts)
//! - Contract resolver with rolling-futures expiry rules
//! - Session-window boundary and extended-hours trimming
//! - Pure gap detection against the 5-second cadence
//! - Per-day CSV bar store that never overwrites
//! - Blocking feed client with request pacing and the gateway transport

pub mod domain;
pub mod feed;
pub mod gap;
pub mod resolver;
pub mod session;
pub mod store;

pub use domain::{Bar, ContractKind, DaySeries, InstrumentKind, InstrumentSpec, ResolvedContract};
pub use feed::{FeedClient, FeedError, FeedTransport, TcpTransport};
pub use gap::{check_gaps, GapInterval, GapReport, BAR_INTERVAL_SECS, EXPECTED_SESSION_BARS};
pub use resolver::{resolve, ResolveError};
pub use session::{duration_for, normalize, session_end_boundary, DurationToken};
pub use store::{BarStore, StoreError};
