//! Runs a small strategy tree through simulated business days, then
//! optionally keeps the router's background worker alive for a paper
//! session.

mod args;
mod universe;

use anyhow::Result;
use args::Args;
use chrono::{Duration, NaiveTime};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;
use trading::{CashUpdateMessage, Clock, Portfolio, Strategy};
use universe::{Universe, ROOT};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Starting demo-runner v{}", env!("CARGO_PKG_VERSION"));

    let universe = Universe::build(args.config.as_deref(), args.start, args.days, args.seed)?;
    simulate(&universe, &args);
    report(&universe);

    if args.live {
        run_live(&universe, &args).await?;
    }

    info!("demo-runner finished");
    Ok(())
}

/// Processes the tree at the close of every business day in the window.
fn simulate(universe: &Universe, args: &Args) {
    let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default();
    let mut processed = 0;
    for offset in 0..args.days {
        let date = args.start.and_time(close) + Duration::days(offset as i64);
        if !universe.is_business_day(date) {
            continue;
        }
        universe.clock.set(date);
        match universe.scheduler.process(ROOT, date) {
            Ok(()) => processed += 1,
            Err(e) => error!("Processing {} failed: {}", date, e),
        }
    }
    info!("Processed {} business days", processed);
}

fn report(universe: &Universe) {
    let last = universe.clock.now();
    info!("NAV of {} on {}: {:.2}", universe.root.name(), last, universe.root.aum(last));
    for portfolio in &universe.portfolios {
        let totals = universe.router.totals(portfolio.id());
        info!(
            "{}: value {:.2}, costs {:.2}, notional {:.2}, contracts {}",
            portfolio.name(),
            portfolio.value(last),
            totals.costs,
            totals.notional,
            totals.contracts
        );
    }
}

/// Books simulator fills in the background until Ctrl-C or the
/// configured timeout.
async fn run_live(universe: &Universe, args: &Args) -> Result<()> {
    let master: Arc<dyn Portfolio> = universe.portfolios[0].clone();
    let strategy: Arc<dyn Strategy> = universe.root.clone();
    universe.router.add_portfolio(master, strategy);
    universe.router.start()?;

    let treasury: Arc<dyn Portfolio> = universe.portfolios[1].clone();
    universe
        .router
        .enqueue_cash(CashUpdateMessage::new(treasury, 10_000.0, "USD"));

    match args.live_seconds {
        Some(seconds) => {
            info!("Live session running for {}s", seconds);
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(seconds)) => {}
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Ctrl-C handler failed: {}", e);
                    }
                }
            }
        }
        None => {
            info!("Live session running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
        }
    }

    info!("Shutting down the market router");
    universe.router.shutdown();
    Ok(())
}
