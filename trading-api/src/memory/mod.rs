//! In-process implementations of the collaborator contracts.
//!
//! Nothing here persists; a universe lives as long as the `Arc`s that hold
//! it. Used by the simulation binary and by the test suites of the router
//! and the scheduler.

pub mod calendar;
pub mod clock;
pub mod market;
pub mod portfolio;
pub mod strategy;

pub use calendar::WeekdayCalendar;
pub use clock::FixedClock;
pub use market::MemoryMarketData;
pub use portfolio::MemoryPortfolio;
pub use strategy::{Journal, MemoryStrategy, StrategyLogic};

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1_000_000);

/// Allocates ids for duplicated strategies and portfolios.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
