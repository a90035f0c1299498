//! BarVault CLI — bar archive download and inspection commands.
//!
//! Commands:
//! - `download` — run a full download pass from a TOML config file
//! - `status` — report per-symbol file counts and date ranges in the archive
//! - `check` — gap-check one stored (symbol, date) file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use barvault_core::feed::TcpTransport;
use barvault_core::gap::check_gaps;
use barvault_core::store::BarStore;
use barvault_runner::{run_download, RunConfig, RunOptions, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "barvault",
    about = "BarVault CLI — write-once intraday bar archive"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full download pass from a TOML config file.
    Download {
        /// Path to the run configuration.
        #[arg(long)]
        config: PathBuf,
    },
    /// Report per-symbol file counts and date ranges in the archive.
    Status {
        /// Root directory of the bar store.
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Gap-check one stored (symbol, date) file.
    Check {
        /// Root directory of the bar store.
        #[arg(long)]
        data_dir: PathBuf,

        /// Symbol to check.
        symbol: String,

        /// Date to check (YYYY-MM-DD).
        date: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Download { config } => cmd_download(&config),
        Commands::Status { data_dir } => cmd_status(&data_dir),
        Commands::Check {
            data_dir,
            symbol,
            date,
        } => cmd_check(&data_dir, &symbol, &date),
    }
}

fn cmd_download(config_path: &Path) -> Result<()> {
    let config = RunConfig::from_file(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    // Connection failure is the only error the run loop surfaces. Per-item
    // failures are already in the summary; the run still exits cleanly so
    // scheduled reruns pick up the leftovers.
    if let Err(e) = run_download(&config, &TcpTransport, &StdoutProgress, &RunOptions::default()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_status(data_dir: &Path) -> Result<()> {
    let bars_dir = data_dir.join("bars");
    if !bars_dir.exists() {
        println!("Archive is empty: {}", data_dir.display());
        return Ok(());
    }

    let mut rows: Vec<(String, usize, String)> = Vec::new();
    for entry in std::fs::read_dir(&bars_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let symbol = entry.file_name().to_string_lossy().to_string();

        let mut dates: Vec<NaiveDate> = Vec::new();
        for file in std::fs::read_dir(entry.path())? {
            let name = file?.file_name().to_string_lossy().to_string();
            // Files are named {YYYY-MM-DD}_{SYMBOL}.csv.
            let Some(date_part) = name.split('_').next() else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
                dates.push(date);
            }
        }
        if dates.is_empty() {
            continue;
        }
        dates.sort();
        let range = format!(
            "{} to {}",
            dates.first().map(|d| d.to_string()).unwrap_or_default(),
            dates.last().map(|d| d.to_string()).unwrap_or_default()
        );
        rows.push((symbol, dates.len(), range));
    }

    if rows.is_empty() {
        println!("Archive is empty: {}", data_dir.display());
        return Ok(());
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));

    println!("Archive: {}", data_dir.display());
    println!();
    println!("{:<8} {:>6} {:<25}", "Symbol", "Days", "Date Range");
    println!("{}", "-".repeat(41));
    for (symbol, days, range) in &rows {
        println!("{symbol:<8} {days:>6} {range:<25}");
    }
    Ok(())
}

fn cmd_check(data_dir: &Path, symbol: &str, date: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date}', expected YYYY-MM-DD"))?;

    let store = BarStore::new(data_dir);
    let series = store
        .read(symbol, date)
        .with_context(|| format!("reading {symbol} for {date}"))?;

    let report = check_gaps(&series);
    println!(
        "{} {}: {} bars ({} expected, delta {})",
        report.date, report.symbol, report.bar_count, report.expected_bars, report.bar_count_delta
    );
    if report.gaps.is_empty() {
        println!("No intra-session gaps");
    } else {
        println!("{} gap(s):", report.gaps.len());
        for gap in &report.gaps {
            println!(
                "  {} -> {}: {} missing bars ({} seconds)",
                gap.start_timestamp, gap.end_timestamp, gap.missing_bars, gap.missing_seconds
            );
        }
    }
    if report.has_gaps {
        println!("Status: INCOMPLETE");
    } else {
        println!("Status: complete");
    }
    Ok(())
}
