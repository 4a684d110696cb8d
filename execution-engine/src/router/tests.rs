use super::*;
use crate::broker::recording::RecordingBroker;
use crate::broker::Broker;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use trading::memory::{FixedClock, MemoryMarketData, MemoryPortfolio, MemoryStrategy, WeekdayCalendar};
use trading::{InstrumentKind, Order, OrderStatus, OrderType, OrderUpdate, Routing, SeriesField};

const ACME: u64 = 10;
const BUND: u64 = 20;
const BUND_JUN: u64 = 21;

fn at(d: u32, h: u32) -> NaiveDateTime {
    // March 2024: the 4th is a Monday, the 9th a Saturday.
    NaiveDate::from_ymd_opt(2024, 3, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

struct Fixture {
    market: Arc<MemoryMarketData>,
    clock: Arc<FixedClock>,
    router: Arc<MarketRouter>,
    master: Arc<MemoryPortfolio>,
    strategy: Arc<MemoryStrategy>,
}

impl Fixture {
    fn new(config: RouterConfig, simulating: bool) -> Self {
        let market = Arc::new(MemoryMarketData::new());
        market.add_instrument(InstrumentInfo::new(ACME, "ACME", InstrumentKind::Equity, "USD"));
        market.add_instrument(InstrumentInfo::new(BUND, "BUND", InstrumentKind::Index, "USD"));
        market.add_instrument(
            InstrumentInfo::new(
                BUND_JUN,
                "FGBL Jun24",
                InstrumentKind::Future { underlying: BUND },
                "USD",
            )
            .with_point_size(10.0),
        );
        market.set_last(ACME, at(1, 0), 100.0);
        market.set_last(BUND_JUN, at(1, 0), 130.0);

        let clock = Arc::new(FixedClock::new(at(4, 10)));
        let router = Arc::new(
            MarketRouter::new(
                config,
                market.clone(),
                Arc::new(WeekdayCalendar),
                clock.clone(),
            )
            .unwrap(),
        );
        let master = Arc::new(MemoryPortfolio::new(1, "Master", "USD", market.clone()));
        let strategy = Arc::new(
            MemoryStrategy::new(1, "Root", Arc::new(WeekdayCalendar))
                .with_portfolio(master.clone())
                .with_simulating(simulating),
        );
        Self {
            market,
            clock,
            router,
            master,
            strategy,
        }
    }

    fn simulator() -> Self {
        let config = RouterConfig::default()
            .with_instruction(Instruction::new(0, 0, Instruction::SIMULATOR).with_route("Default", "Paper"));
        Self::new(config, false)
    }

    fn order(&self, unit: f64, date: NaiveDateTime) -> Order {
        self.master
            .create_order(ACME, date, unit, OrderType::Market, 0.0)
            .unwrap()
    }

    fn stored(&self, order: &Order) -> Order {
        self.master
            .orders()
            .into_iter()
            .find(|o| o.id() == order.id())
            .unwrap()
    }

    fn monitor(&self) {
        self.router
            .add_portfolio(self.master.clone(), self.strategy.clone());
    }
}

#[test]
fn test_zero_unit_order_executes_at_last_price() {
    let fx = Fixture::simulator();
    let order = fx
        .master
        .create_order(BUND_JUN, at(4, 10), 0.0, OrderType::Market, 0.0)
        .unwrap();

    assert!(fx.router.submit(&order, fx.strategy.as_ref()).unwrap().is_none());

    let stored = fx.stored(&order);
    assert_eq!(stored.status(), OrderStatus::Executed);
    assert!((stored.execution_level() - 1300.0).abs() < 1e-9, "130 x point size 10");
    assert_eq!(stored.client(), "Simulator");
    assert_eq!(stored.destination(), "Model");
    assert_eq!(stored.account(), "NA");
}

#[test]
fn test_zero_unit_order_without_price_is_not_executed() {
    let fx = Fixture::simulator();
    let order = fx
        .master
        .create_order(BUND, at(4, 10), 0.0, OrderType::Market, 0.0)
        .unwrap();

    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();
    assert_eq!(fx.stored(&order).status(), OrderStatus::NotExecuted);
}

#[test]
fn test_submit_routes_dispatches_and_publishes() {
    let fx = Fixture::simulator();
    let broker = Arc::new(RecordingBroker::new());
    fx.router.add_connection(ClientConnection::new(
        "Simulator",
        vec!["Default".to_string()],
        Some(broker.clone() as Arc<dyn Broker>),
    ));
    let published = Arc::new(AtomicUsize::new(0));
    let counter = published.clone();
    fx.router.add_update_event(
        Some(1),
        Arc::new(move |record: &OrderRecord| {
            assert_eq!(record.status, OrderStatus::New);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );

    let order = fx.order(5.0, at(4, 10));
    let record = fx
        .router
        .submit(&order, fx.strategy.as_ref())
        .unwrap()
        .expect("live orders publish a record");

    let stored = fx.stored(&order);
    assert_eq!(stored.status(), OrderStatus::Submitted);
    assert_eq!(stored.routing(), Routing::new("Simulator", "Default", "Paper"));

    let sent = broker.orders();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].status(), OrderStatus::Submitted);
    assert_eq!(sent[0].client(), "Simulator");

    assert_eq!(record.root_portfolio_id, 1);
    assert_eq!(record.root_portfolio_name, "Root");
    assert_eq!(record.name, "ACME");
    assert!(fx.router.order_record(order.id()).is_some());
    assert_eq!(published.load(Ordering::SeqCst), 1);
}

#[test]
fn test_submit_is_a_no_op_once_submitted() {
    let fx = Fixture::simulator();
    let broker = Arc::new(RecordingBroker::new());
    fx.router.add_connection(ClientConnection::new(
        "Simulator",
        Vec::new(),
        Some(broker.clone() as Arc<dyn Broker>),
    ));

    let order = fx.order(5.0, at(4, 10));
    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();
    let again = fx.stored(&order);
    assert!(fx.router.submit(&again, fx.strategy.as_ref()).unwrap().is_none());
    assert_eq!(broker.orders().len(), 1);
}

#[test]
fn test_broker_failure_does_not_abort_submission() {
    let fx = Fixture::simulator();
    fx.router.add_connection(ClientConnection::new(
        "Simulator",
        Vec::new(),
        Some(Arc::new(RecordingBroker::rejecting()) as Arc<dyn Broker>),
    ));

    let order = fx.order(5.0, at(4, 10));
    assert!(fx.router.submit(&order, fx.strategy.as_ref()).unwrap().is_some());
    assert_eq!(fx.stored(&order).status(), OrderStatus::Submitted);
}

#[test]
fn test_preassigned_client_keeps_its_route() {
    let fx = Fixture::simulator();
    let order = fx
        .master
        .create_order(ACME, at(4, 10), 5.0, OrderType::Market, 0.0)
        .unwrap();
    // Orders created with a route skip the cascade.
    let routed = order.clone().with_routing(Routing::new("IB", "SMART", "U1"));

    fx.router.submit(&routed, fx.strategy.as_ref()).unwrap();
    let stored = fx.stored(&order);
    assert_eq!(stored.status(), OrderStatus::Submitted);
    assert_eq!(stored.client(), "");
}

#[test]
fn test_simulation_skips_broker_and_records() {
    let config = RouterConfig::default();
    let fx = Fixture::new(config, true);
    let broker = Arc::new(RecordingBroker::new());
    fx.router.add_connection(ClientConnection::new(
        "Inherit",
        Vec::new(),
        Some(broker.clone() as Arc<dyn Broker>),
    ));

    let order = fx.order(5.0, at(4, 10));
    assert!(fx.router.submit(&order, fx.strategy.as_ref()).unwrap().is_none());

    let stored = fx.stored(&order);
    assert_eq!(stored.status(), OrderStatus::Submitted);
    assert_eq!(stored.client(), "Inherit", "no instruction falls back to the sentinel");
    assert!(broker.orders().is_empty());
    assert!(fx.router.order_records().is_empty());
}

fn netting_fixture() -> (Fixture, Arc<MemoryPortfolio>, Arc<MemoryPortfolio>) {
    let config = RouterConfig::default().with_instruction(
        Instruction::new(0, 0, Instruction::SIMULATOR).with_sizes(5.0, 1.0),
    );
    let fx = Fixture::new(config, true);
    let master: Arc<dyn Portfolio> = fx.master.clone();
    let owner = Arc::new(MemoryPortfolio::new(2, "Trend", "USD", fx.market.clone()));
    let residual = Arc::new(MemoryPortfolio::new(3, "Residual", "USD", fx.market.clone()));
    let subs: [Arc<dyn Portfolio>; 2] = [owner.clone(), residual.clone()];
    for sub in subs {
        sub.set_parent(Some(&master));
        master.add_sub_portfolio(sub);
    }
    owner.set_residual(Some(residual.clone()));
    (fx, owner, residual)
}

#[test]
fn test_small_order_is_parked_in_residual() {
    let (fx, owner, residual) = netting_fixture();
    owner
        .create_order(ACME, at(4, 10), 2.0, OrderType::Market, 0.0)
        .unwrap();

    let submitted = fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();
    assert_eq!(submitted, 2, "intent plus the residual order");

    let parked = residual.orders();
    assert_eq!(parked.len(), 1);
    assert!((parked[0].unit() + 2.0).abs() < 1e-9);
    assert_eq!(parked[0].status(), OrderStatus::Submitted);
    assert_eq!(parked[0].order_type(), OrderType::Market);
    assert_eq!(owner.orders()[0].status(), OrderStatus::Submitted);
}

#[test]
fn test_full_lot_posts_no_residual() {
    let (fx, owner, residual) = netting_fixture();
    owner
        .create_order(ACME, at(4, 10), 12.0, OrderType::Market, 0.0)
        .unwrap();

    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();
    assert!(residual.orders().is_empty());
}

#[test]
fn test_fill_applies_fee_in_trade_direction() {
    let config = RouterConfig::default()
        .with_instruction(Instruction::new(1, 0, "Inherit").with_fees(0.5, 0.0, 0.0));
    let fx = Fixture::new(config, true);
    let buy = fx.order(10.0, at(4, 10));
    let sell = fx.order(-10.0, at(4, 10));
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    let executed = fx.router.receive_execution_levels(at(4, 10), &master).unwrap();
    assert_eq!(executed, 2);

    assert!((fx.stored(&buy).execution_level() - 100.5).abs() < 1e-9);
    assert!((fx.stored(&sell).execution_level() - 99.5).abs() < 1e-9);
    assert!((fx.router.costs(1) - 10.0).abs() < 1e-9);
    assert!((fx.router.notional(1) - 2000.0).abs() < 1e-9);
    assert!((fx.router.contracts(1) - 20.0).abs() < 1e-9);
}

#[test]
fn test_fill_refused_by_the_ledger_records_no_costs() {
    let config = RouterConfig::default()
        .with_instruction(Instruction::new(1, 0, "Inherit").with_fees(0.5, 0.0, 0.0));
    let fx = Fixture::new(config, true);
    let order = fx.order(10.0, at(4, 10));
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    // A broker confirmation lands while the simulated fill is being priced.
    let ledger = fx.master.clone();
    let id = order.id();
    fx.router.set_impact_model(Some(Arc::new(
        move |date: NaiveDateTime, _: trading::InstrumentId| {
            ledger
                .update_order(id, &OrderUpdate::executed(100.0, date))
                .unwrap();
            0.0
        },
    )));

    let master: Arc<dyn Portfolio> = fx.master.clone();
    let executed = fx.router.receive_execution_levels(at(4, 10), &master).unwrap();
    assert_eq!(executed, 0);
    assert!((fx.stored(&order).execution_level() - 100.0).abs() < 1e-9);
    assert_eq!(fx.router.costs(1), 0.0);
    assert_eq!(fx.router.contracts(1), 0.0);
}

#[test]
fn test_future_fee_comes_from_underlying_instruction() {
    let config = RouterConfig::default()
        .with_instruction(Instruction::new(0, BUND, "Inherit").with_fees(-0.001, 5.0, 0.0));
    let fx = Fixture::new(config, true);
    let order = fx
        .master
        .create_order(BUND_JUN, at(4, 10), 2.0, OrderType::Market, 0.0)
        .unwrap();
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    fx.router.receive_execution_levels(at(4, 10), &master).unwrap();

    // 1.3 per unit is below the 5.0 minimum over 2 units.
    assert!((fx.stored(&order).execution_level() - 1302.5).abs() < 1e-9);
    assert!((fx.router.costs(1) - 5.0).abs() < 1e-9);
}

#[test]
fn test_missing_price_is_not_executed() {
    let fx = Fixture::new(RouterConfig::default(), true);
    let order = fx
        .master
        .create_order(BUND, at(4, 10), 3.0, OrderType::Market, 0.0)
        .unwrap();
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    assert_eq!(fx.router.receive_execution_levels(at(4, 10), &master).unwrap(), 0);
    assert_eq!(fx.stored(&order).status(), OrderStatus::NotExecuted);
}

#[test]
fn test_no_fills_outside_business_days() {
    let fx = Fixture::new(RouterConfig::default(), true);
    let order = fx.order(3.0, at(9, 10));
    fx.router.submit_orders(at(9, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    assert_eq!(fx.router.receive_execution_levels(at(9, 10), &master).unwrap(), 0);
    assert_eq!(fx.stored(&order).status(), OrderStatus::Submitted);
}

#[test]
fn test_fill_price_is_floored() {
    let config = RouterConfig::default()
        .with_instruction(Instruction::new(0, 0, "Inherit").with_fees(150.0, 0.0, 0.0));
    let fx = Fixture::new(config, true);
    let order = fx.order(-1.0, at(4, 10));
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    fx.router.receive_execution_levels(at(4, 10), &master).unwrap();
    assert!((fx.stored(&order).execution_level() - 0.001).abs() < 1e-12);
}

#[test]
fn test_fractional_units_pay_no_fees() {
    let config = RouterConfig::default()
        .with_instruction(Instruction::new(0, 0, "Inherit").with_fees(1.0, 0.0, 0.0));
    let fx = Fixture::new(config, true);
    let order = fx.order(0.5, at(4, 10));
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    fx.router.receive_execution_levels(at(4, 10), &master).unwrap();
    assert!((fx.stored(&order).execution_level() - 100.0).abs() < 1e-9);
    assert_eq!(fx.router.contracts(1), 0.0);
}

#[test]
fn test_market_impact_scales_with_traded_share_of_volume() {
    let fx = Fixture::new(RouterConfig::default(), true);
    // Seeded before the whole ten-day window.
    let early = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    fx.market.set_last(ACME, early, 100.0);
    fx.market.set_value(ACME, early, SeriesField::Volume, 1000.0);
    fx.router
        .set_impact_model(Some(Arc::new(|_: NaiveDateTime, _: trading::InstrumentId| 1.0)));
    let order = fx.order(10.0, at(4, 10));
    fx.router.submit_orders(at(4, 10), fx.strategy.as_ref()).unwrap();

    let master: Arc<dyn Portfolio> = fx.master.clone();
    fx.router.receive_execution_levels(at(4, 10), &master).unwrap();

    // Trade notional 1_000 over an average daily value of 100_000.
    assert!((fx.stored(&order).execution_level() - 101.0).abs() < 1e-9);
}

#[test]
fn test_live_booking_fills_simulator_orders() {
    let fx = Fixture::simulator();
    fx.monitor();
    let order = fx.order(4.0, at(4, 10));
    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    fx.router.add_update_event(
        None,
        Arc::new(move |record: &OrderRecord| {
            assert_eq!(record.status, OrderStatus::Executed);
            assert!((record.price - 100.0).abs() < 1e-9);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );

    assert_eq!(fx.router.book_orders(at(4, 10)), 1);
    let stored = fx.stored(&order);
    assert_eq!(stored.status(), OrderStatus::Executed);
    assert!((fx.master.position_unit(ACME, at(4, 10), false) - 4.0).abs() < 1e-9);
    assert!(fx.router.order_record(order.id()).is_none());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(fx.master.saves(), 1);
    assert!((fx.router.contracts(1) - 4.0).abs() < 1e-9);
}

#[test]
fn test_live_booking_leaves_uncrossed_limits_working() {
    let fx = Fixture::simulator();
    fx.monitor();
    let order = fx
        .master
        .create_order(ACME, at(4, 10), 4.0, OrderType::Limit, 90.0)
        .unwrap();
    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();

    assert_eq!(fx.router.book_orders(at(4, 10)), 0);
    assert_eq!(fx.stored(&order).status(), OrderStatus::Submitted);
}

#[test]
fn test_live_booking_skips_busy_strategy_only() {
    let fx = Fixture::simulator();
    fx.monitor();
    let other_master = Arc::new(MemoryPortfolio::new(7, "Other", "USD", fx.market.clone()));
    let other = Arc::new(
        MemoryStrategy::new(7, "Other", Arc::new(WeekdayCalendar))
            .with_portfolio(other_master.clone()),
    );
    fx.router.add_portfolio(other_master.clone(), other.clone());

    let busy_order = fx.order(4.0, at(4, 10));
    fx.router.submit(&busy_order, fx.strategy.as_ref()).unwrap();
    let free_order = other_master
        .create_order(ACME, at(4, 10), 2.0, OrderType::Market, 0.0)
        .unwrap();
    fx.router.submit(&free_order, other.as_ref()).unwrap();

    let guard = fx.strategy.gate().try_enter().unwrap();
    assert_eq!(fx.router.book_orders(at(4, 10)), 1);
    assert_eq!(fx.stored(&busy_order).status(), OrderStatus::Submitted);
    drop(guard);

    assert_eq!(fx.router.book_orders(at(4, 10)), 1);
    assert_eq!(fx.stored(&busy_order).status(), OrderStatus::Executed);
}

#[test]
fn test_cash_waits_for_idle_strategy() {
    let fx = Fixture::simulator();
    fx.monitor();
    let master: Arc<dyn Portfolio> = fx.master.clone();

    let guard = fx.strategy.gate().try_enter().unwrap();
    fx.router
        .enqueue_cash(CashUpdateMessage::new(master.clone(), 250.0, "USD"));
    fx.router
        .enqueue_cash(CashUpdateMessage::new(master.clone(), 50.0, "USD"));
    assert_eq!(fx.router.drain_cash(), 0);
    assert_eq!(fx.router.pending_cash(), 2);
    drop(guard);

    assert_eq!(fx.router.drain_cash(), 2);
    assert_eq!(fx.router.pending_cash(), 0);
    assert!((fx.master.cash("USD") - 300.0).abs() < 1e-9);
}

#[test]
fn test_cash_for_unmonitored_portfolio_is_dropped() {
    let fx = Fixture::simulator();
    let master: Arc<dyn Portfolio> = fx.master.clone();
    fx.router
        .enqueue_cash(CashUpdateMessage::new(master, 250.0, "USD"));

    assert_eq!(fx.router.drain_cash(), 0);
    assert_eq!(fx.router.pending_cash(), 0);
    assert_eq!(fx.master.cash("USD"), 0.0);
}

#[test]
fn test_worker_start_and_shutdown_are_idempotent() {
    let fx = Fixture::new(
        RouterConfig::default().with_tick_interval(Duration::from_millis(10)),
        false,
    );
    fx.monitor();
    fx.router.start().unwrap();
    fx.router.start().unwrap();
    assert!(fx.router.is_running());

    let master: Arc<dyn Portfolio> = fx.master.clone();
    fx.router
        .enqueue_cash(CashUpdateMessage::new(master, 75.0, "USD"));
    for _ in 0..200 {
        if (fx.master.cash("USD") - 75.0).abs() < 1e-9 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!((fx.master.cash("USD") - 75.0).abs() < 1e-9);

    fx.router.shutdown();
    fx.router.shutdown();
    assert!(!fx.router.is_running());
}

#[test]
fn test_frequent_cash_does_not_starve_live_booking() {
    let config = RouterConfig::default()
        .with_instruction(Instruction::new(0, 0, Instruction::SIMULATOR).with_route("Default", "Paper"))
        .with_tick_interval(Duration::from_millis(100));
    let fx = Fixture::new(config, false);
    fx.monitor();
    let order = fx.order(4.0, at(4, 10));
    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();
    fx.router.start().unwrap();

    // Wakes arrive faster than the tick interval.
    let master: Arc<dyn Portfolio> = fx.master.clone();
    for _ in 0..15 {
        fx.router
            .enqueue_cash(CashUpdateMessage::new(master.clone(), 1.0, "USD"));
        std::thread::sleep(Duration::from_millis(60));
    }
    fx.router.shutdown();

    assert_eq!(fx.stored(&order).status(), OrderStatus::Executed);
    assert!((fx.master.position_unit(ACME, at(4, 10), false) - 4.0).abs() < 1e-9);
}

#[test]
fn test_record_fill_value_publishes_execution() {
    let fx = Fixture::simulator();
    fx.monitor();
    let order = fx.order(3.0, at(4, 10));
    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();
    fx.clock.set(at(4, 11));

    assert!(fx.router.record_fill_value(&order, at(4, 11), 99.0).unwrap());
    let stored = fx.stored(&order);
    assert_eq!(stored.status(), OrderStatus::Executed);
    assert_eq!(stored.execution_date(), Some(at(4, 11)));
    assert!(fx.router.order_record(order.id()).is_none());
    assert!((fx.router.notional(1) - 297.0).abs() < 1e-9);
}

#[test]
fn test_clients_destinations_include_builtins() {
    let fx = Fixture::simulator();
    fx.router
        .add_connection(ClientConnection::new("IB", Vec::new(), None));

    let clients = fx.router.clients_destinations();
    assert_eq!(clients["IB"], vec!["Empty".to_string()]);
    assert_eq!(clients["Simulator"], vec!["Default".to_string()]);
    assert_eq!(clients["Inherit"], vec![" ".to_string()]);

    assert!(fx.router.remove_connection("IB").is_some());
    assert!(!fx.router.clients_destinations().contains_key("IB"));
}

#[test]
fn test_adding_portfolio_resets_counters() {
    let fx = Fixture::simulator();
    fx.monitor();
    let order = fx.order(4.0, at(4, 10));
    fx.router.submit(&order, fx.strategy.as_ref()).unwrap();
    fx.router.book_orders(at(4, 10));
    assert!(fx.router.contracts(1) > 0.0);

    fx.monitor();
    assert_eq!(fx.router.totals(1), CostTotals::default());
    assert!(fx.router.remove_portfolio(1).is_ok());
    assert!(matches!(
        fx.router.remove_portfolio(1),
        Err(RouterError::UnknownPortfolio(1))
    ));
}

#[test]
fn test_point_size_override_by_name_prefix() {
    let config = RouterConfig::default().with_point_size("FGBL", 1000.0);
    let fx = Fixture::new(config, true);
    let info = fx.market.instrument(BUND_JUN).unwrap();
    assert_eq!(fx.router.point_size(&info), 1000.0);
    let acme = fx.market.instrument(ACME).unwrap();
    assert_eq!(fx.router.point_size(&acme), 1.0);
}
