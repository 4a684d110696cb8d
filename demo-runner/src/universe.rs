//! In-memory universe the demo trades in: two random-walk equities, a
//! root strategy with two trading children and a residual book.

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use execution_engine::{MarketRouter, RouterConfig};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use strategy_tree::{SchedulerConfig, TreeScheduler};
use trading::memory::{FixedClock, MemoryMarketData, MemoryPortfolio, MemoryStrategy, StrategyLogic, WeekdayCalendar};
use trading::{
    Calendar, ExecutionContext, InstrumentId, InstrumentInfo, InstrumentKind, MarketData,
    OrderType, Portfolio, RollType, SeriesField, Strategy, StrategyId,
};

pub const ACME: InstrumentId = 10;
pub const BOLT: InstrumentId = 11;

pub const ROOT: StrategyId = 1;
pub const TREND: StrategyId = 2;
pub const SMALL: StrategyId = 3;
pub const RESIDUAL: StrategyId = 4;

const SEED_CASH: f64 = 1_000_000.0;
const TREND_LOT: f64 = 100.0;
const SMALL_LOT: f64 = 10.0;

pub struct Universe {
    pub calendar: Arc<WeekdayCalendar>,
    pub clock: Arc<FixedClock>,
    pub router: Arc<MarketRouter>,
    pub scheduler: Arc<TreeScheduler>,
    pub root: Arc<MemoryStrategy>,
    pub portfolios: Vec<Arc<MemoryPortfolio>>,
}

impl Universe {
    /// Builds the universe with prices for `days` calendar days from
    /// `start`, plus a short warm-up before it.
    pub fn build(config: Option<&Path>, start: NaiveDate, days: u32, seed: u64) -> Result<Self> {
        let router_config = RouterConfig::load(config)?;
        let scheduler_config = SchedulerConfig::load(config)?;

        let start = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid start date {}", start))?;
        let market = Arc::new(MemoryMarketData::new());
        market.add_instrument(InstrumentInfo::new(ACME, "ACME", InstrumentKind::Equity, "USD"));
        market.add_instrument(InstrumentInfo::new(BOLT, "BOLT", InstrumentKind::Equity, "USD"));
        let mut rng = StdRng::seed_from_u64(seed);
        random_walk(&market, &mut rng, ACME, 100.0, start - Duration::days(7), days + 7);
        random_walk(&market, &mut rng, BOLT, 40.0, start - Duration::days(7), days + 7);

        let calendar = Arc::new(WeekdayCalendar);
        let clock = Arc::new(FixedClock::new(start));
        let router = Arc::new(MarketRouter::new(
            router_config,
            market.clone(),
            calendar.clone(),
            clock.clone(),
        )?);
        let scheduler = TreeScheduler::new(scheduler_config, router.clone(), clock.clone());

        let portfolio = |id: StrategyId| {
            Arc::new(MemoryPortfolio::new(
                id,
                format!("book-{}", id),
                "USD",
                market.clone(),
            ))
        };
        let portfolios: Vec<Arc<MemoryPortfolio>> =
            [ROOT, TREND, SMALL, RESIDUAL].into_iter().map(portfolio).collect();
        portfolios[1].deposit("USD", SEED_CASH);
        portfolios[2].deposit("USD", SEED_CASH / 10.0);

        let strategy = |id: StrategyId, name: &str, book: &Arc<MemoryPortfolio>| {
            let book: Arc<dyn Portfolio> = book.clone();
            MemoryStrategy::new(id, name, calendar.clone())
                .with_dates(start - Duration::days(7), NaiveDateTime::MAX)
                .with_portfolio(book)
        };

        let root = Arc::new(strategy(ROOT, "master", &portfolios[0]));
        scheduler.get_or_create(root.clone());
        root.initialize()?;

        let trend = strategy(TREND, "trend", &portfolios[1]).with_logic(follow_trend(market.clone(), calendar.clone(), BOLT));
        scheduler.add_child(ROOT, Arc::new(trend))?;
        let small = strategy(SMALL, "small", &portfolios[2]).with_logic(accumulate(ACME, SMALL_LOT));
        scheduler.add_child(ROOT, Arc::new(small))?;
        scheduler.set_residual(ROOT, Arc::new(strategy(RESIDUAL, "residual", &portfolios[3])))?;

        info!(
            "Universe ready: {} strategies, prices from {}",
            scheduler.len(),
            start.date()
        );
        Ok(Self {
            calendar,
            clock,
            router,
            scheduler,
            root,
            portfolios,
        })
    }

    pub fn is_business_day(&self, date: NaiveDateTime) -> bool {
        self.calendar.business_day(date).is_some()
    }
}

/// Writes a +/- 1% daily random walk for `days` calendar days.
fn random_walk(
    market: &MemoryMarketData,
    rng: &mut StdRng,
    id: InstrumentId,
    start_price: f64,
    from: NaiveDateTime,
    days: u32,
) {
    let mut price = start_price;
    for day in 0..days {
        let change_pct = rng.gen_range(-0.01..0.01);
        price = (price * (1.0 + change_pct)).max(0.01);
        let date = from + Duration::days(day as i64);
        market.set_last(id, date, price);
        market.set_value(id, date, SeriesField::Volume, rng.gen_range(50_000.0..150_000.0));
    }
}

/// Long `TREND_LOT` while the last close is above the previous one, flat
/// otherwise.
fn follow_trend(market: Arc<MemoryMarketData>, calendar: Arc<WeekdayCalendar>, id: InstrumentId) -> StrategyLogic {
    Arc::new(move |s: &MemoryStrategy, ctx: &ExecutionContext| {
        let portfolio = s
            .portfolio()
            .ok_or_else(|| anyhow!("strategy {} has no portfolio", s.id()))?;
        let previous = calendar.add_business_days(ctx.order_date, -1);
        let last = market.value(id, ctx.order_date, SeriesField::Last, RollType::Last);
        let before = market.value(id, previous, SeriesField::Last, RollType::Last);
        if last.is_nan() || before.is_nan() {
            return Ok(());
        }
        let held = portfolio.position_unit(id, ctx.order_date, false);
        let target = if last > before { TREND_LOT } else { 0.0 };
        if target != held {
            debug!("{} moves {} from {} to {}", s.name(), id, held, target);
            portfolio.create_order(id, ctx.order_date, target - held, OrderType::Market, 0.0)?;
        }
        Ok(())
    })
}

/// Buys `unit` every day, below the routing minimum, so its flow is
/// parked in the residual book.
fn accumulate(id: InstrumentId, unit: f64) -> StrategyLogic {
    Arc::new(move |s: &MemoryStrategy, ctx: &ExecutionContext| {
        let portfolio = s
            .portfolio()
            .ok_or_else(|| anyhow!("strategy {} has no portfolio", s.id()))?;
        if portfolio.open_orders(ctx.order_date, false).is_empty() {
            portfolio.create_order(id, ctx.order_date, unit, OrderType::Market, 0.0)?;
        }
        Ok(())
    })
}
