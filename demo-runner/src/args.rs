//! Command-line arguments of the demo binary.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Runs an in-memory strategy tree over simulated business days and,
/// optionally, a paper session driven by the router's background worker.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file with `[router]` and `[scheduler]` sections
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// First simulated day (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-02")]
    pub start: NaiveDate,

    /// Number of calendar days to simulate
    #[arg(long, default_value_t = 30)]
    pub days: u32,

    /// Start the background worker after the simulation and wait for Ctrl-C
    #[arg(long)]
    pub live: bool,

    /// Stop the live session after this many seconds instead of waiting
    /// for Ctrl-C
    #[arg(long)]
    pub live_seconds: Option<u64>,

    /// Seed of the random price walk
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
}
