//! BarVault Runner — batch orchestration on top of `barvault-core`.
//!
//! This crate owns everything between the config file and the bar store:
//! - TOML run configuration with validation
//! - US trading calendar and the lookback date range
//! - The download loop (one connection, per-item failure isolation)
//! - Progress reporting and the end-of-run summary

pub mod calendar;
pub mod config;
pub mod progress;
pub mod result;
pub mod runner;

pub use calendar::{is_market_holiday, is_trading_day, trading_dates};
pub use config::{ConfigError, RunConfig};
pub use progress::{RunProgress, SilentProgress, StdoutProgress};
pub use result::{DayOutcome, DayResult, RunSummary};
pub use runner::{run_download, RunOptions};
