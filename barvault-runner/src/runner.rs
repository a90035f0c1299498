//! Download orchestrator: one connection, dates ascending, instruments in
//! declared order, per-item failure isolation.

use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use thiserror::Error;

use barvault_core::domain::{DaySeries, InstrumentSpec};
use barvault_core::feed::{FeedClient, FeedError, FeedTransport, PACING_DELAY};
use barvault_core::gap::check_gaps;
use barvault_core::resolver::{resolve, ResolveError};
use barvault_core::session::{duration_for, normalize, session_end_boundary};
use barvault_core::store::{BarStore, StoreError};

use crate::calendar::trading_dates;
use crate::config::RunConfig;
use crate::progress::RunProgress;
use crate::result::{DayResult, RunSummary};

/// Pause between trading dates, on top of per-request pacing.
const DATE_PAUSE: Duration = Duration::from_secs(1);

/// Knobs the CLI leaves at their defaults; tests override them.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Reference date the lookback range is computed from.
    pub today: NaiveDate,
    /// Pause between trading dates.
    pub date_pause: Duration,
    /// Minimum spacing between remote calls.
    pub pacing: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            today: Local::now().date_naive(),
            date_pause: DATE_PAUSE,
            pacing: PACING_DELAY,
        }
    }
}

/// Failure of a single work item. Converted to a `DayResult` record; only
/// the connection failure in `run_download` itself aborts a run.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run a full download pass over the configured instruments and date range.
///
/// Connects once; a connection failure is the only error that aborts the
/// run. Every per-item failure is recorded in the summary and the run moves
/// on. The same configuration can be re-run safely: existing day files are
/// skipped, never rewritten.
pub fn run_download(
    config: &RunConfig,
    transport: &dyn FeedTransport,
    progress: &dyn RunProgress,
    options: &RunOptions,
) -> Result<RunSummary, FeedError> {
    let dates = trading_dates(options.today, config.max_lookback_days);

    progress.on_connecting(&config.gateway_host, config.gateway_port);
    let mut client = FeedClient::connect(transport, &config.gateway_host, config.gateway_port)?
        .with_pacing(options.pacing);
    progress.on_range(dates.first().copied(), dates.last().copied(), dates.len());

    let store = BarStore::new(config.data_dir.clone());
    let mut summary = RunSummary::default();

    for (i, &date) in dates.iter().enumerate() {
        // The anchor trims extended-hours leakers; absent means the leakers
        // fall back to the center trim. An unreadable anchor does too, but
        // gets reported.
        let anchor = match store.read(&config.anchor_symbol, date) {
            Ok(series) => Some(series),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => {
                progress.on_anchor_unreadable(&config.anchor_symbol, date, &e.to_string());
                None
            }
        };

        for spec in &config.instruments {
            progress.on_item_start(&spec.symbol, date);

            let result = if store.exists(&spec.symbol, date) {
                DayResult::skipped(&spec.symbol, date)
            } else {
                process_item(&mut client, &store, spec, date, anchor.as_ref(), progress)
            };

            progress.on_item_done(&result);
            summary.results.push(result);
        }

        if i + 1 < dates.len() {
            thread::sleep(options.date_pause);
        }
    }

    client.disconnect();
    progress.on_run_complete(&summary);
    Ok(summary)
}

/// Outcome of one fetch-normalize-write attempt.
enum FetchOutcome {
    Written {
        bars_written: usize,
        path: std::path::PathBuf,
    },
    /// The provider had no data for the window.
    NoData,
    /// Normalization dropped every bar.
    EmptySession,
}

fn process_item(
    client: &mut FeedClient,
    store: &BarStore,
    spec: &InstrumentSpec,
    date: NaiveDate,
    anchor: Option<&DaySeries>,
    progress: &dyn RunProgress,
) -> DayResult {
    match fetch_and_write(client, store, spec, date, anchor, progress) {
        Ok(FetchOutcome::Written { bars_written, path }) => {
            DayResult::written(&spec.symbol, date, bars_written, path)
        }
        Ok(FetchOutcome::NoData) => {
            DayResult::failed(&spec.symbol, date, "no bars returned".to_string())
        }
        Ok(FetchOutcome::EmptySession) => {
            DayResult::failed(&spec.symbol, date, "no bars in regular session".to_string())
        }
        // Lost the write race against a concurrent run; the file is there,
        // which is all this item was for.
        Err(ItemError::Store(StoreError::AlreadyExists { .. })) => {
            DayResult::skipped(&spec.symbol, date)
        }
        Err(e) => DayResult::failed(&spec.symbol, date, e.to_string()),
    }
}

fn fetch_and_write(
    client: &mut FeedClient,
    store: &BarStore,
    spec: &InstrumentSpec,
    date: NaiveDate,
    anchor: Option<&DaySeries>,
    progress: &dyn RunProgress,
) -> Result<FetchOutcome, ItemError> {
    let contract = resolve(spec, date)?;
    let end_boundary = session_end_boundary(date);
    let duration = duration_for(&spec.symbol);

    let raw = client.fetch_bars(&contract, &end_boundary, duration)?;
    if raw.is_empty() {
        return Ok(FetchOutcome::NoData);
    }

    let bars = normalize(&spec.symbol, raw, anchor);
    // Trimming can consume the whole series (e.g. a leaker disjoint from
    // the anchor range). Writing it would pin an empty immutable file to
    // this (symbol, date) forever; failing lets the next run retry.
    if bars.is_empty() {
        return Ok(FetchOutcome::EmptySession);
    }

    let series = DaySeries::new(&spec.symbol, date, bars);
    progress.on_gap_report(&check_gaps(&series));

    let path = store.write(&series)?;
    Ok(FetchOutcome::Written {
        bars_written: series.bar_count(),
        path,
    })
}
