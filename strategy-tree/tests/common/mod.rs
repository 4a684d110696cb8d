#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use execution_engine::{Instruction, MarketRouter, RouterConfig};
use std::sync::Arc;
use strategy_tree::{SchedulerConfig, TreeScheduler};
use trading::memory::{FixedClock, Journal, MemoryMarketData, MemoryPortfolio, MemoryStrategy, WeekdayCalendar};
use trading::{InstrumentInfo, InstrumentKind, Strategy};

pub const ACME: u64 = 10;

/// March 2024: the 1st is a Friday, the 4th a Monday, the 9th a Saturday.
pub fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// One in-memory universe: prices, a router filling through the
/// "Simulator" client and a scheduler attached to it.
pub struct Universe {
    pub market: Arc<MemoryMarketData>,
    pub clock: Arc<FixedClock>,
    pub router: Arc<MarketRouter>,
    pub scheduler: Arc<TreeScheduler>,
    pub journal: Journal,
}

impl Universe {
    pub fn new() -> Self {
        let market = Arc::new(MemoryMarketData::new());
        market.add_instrument(InstrumentInfo::new(ACME, "ACME", InstrumentKind::Equity, "USD"));
        market.set_last(ACME, at(1, 0), 100.0);

        let clock = Arc::new(FixedClock::new(at(4, 10)));
        let config = RouterConfig::default().with_instruction(
            Instruction::new(0, 0, Instruction::SIMULATOR).with_route("Default", "Paper"),
        );
        let router = Arc::new(
            MarketRouter::new(config, market.clone(), Arc::new(WeekdayCalendar), clock.clone())
                .unwrap(),
        );
        let scheduler = TreeScheduler::new(SchedulerConfig::default(), router.clone(), clock.clone());
        Self {
            market,
            clock,
            router,
            scheduler,
            journal: Journal::new(),
        }
    }

    pub fn portfolio(&self, id: u64) -> Arc<MemoryPortfolio> {
        Arc::new(
            MemoryPortfolio::new(id, format!("P{}", id), "USD", self.market.clone())
                .with_journal(self.journal.clone()),
        )
    }

    /// A strategy without a portfolio, recording into the journal.
    pub fn index(&self, id: u64) -> MemoryStrategy {
        MemoryStrategy::new(id, format!("S{}", id), Arc::new(WeekdayCalendar))
            .with_journal(self.journal.clone())
    }

    /// A strategy owning a fresh portfolio with the same id.
    pub fn trading(&self, id: u64) -> MemoryStrategy {
        self.index(id).with_portfolio(self.portfolio(id))
    }

    /// Registers `strategy` as the root of a tree and initializes it.
    pub fn root(&self, strategy: MemoryStrategy) -> Arc<MemoryStrategy> {
        let strategy = Arc::new(strategy);
        self.scheduler.get_or_create(strategy.clone());
        strategy.initialize().unwrap();
        strategy
    }

    pub fn child(&self, parent: u64, strategy: MemoryStrategy) -> Arc<MemoryStrategy> {
        let strategy = Arc::new(strategy);
        self.scheduler.add_child(parent, strategy.clone()).unwrap();
        strategy
    }

    pub fn residual(&self, parent: u64, strategy: MemoryStrategy) -> Arc<MemoryStrategy> {
        let strategy = Arc::new(strategy);
        self.scheduler.set_residual(parent, strategy.clone()).unwrap();
        strategy
    }

    /// Whether `first` was journaled before `second`.
    pub fn before(&self, first: &str, second: &str) -> bool {
        match (self.journal.position(first), self.journal.position(second)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }
}
