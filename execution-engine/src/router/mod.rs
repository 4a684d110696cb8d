//! The market router.
//!
//! [`MarketRouter`] is the explicit context holding every registry the
//! execution side needs: instructions, client connections, monitored
//! portfolios, cost counters, cached order records and subscribers. It is
//! constructed once, shared behind an `Arc`, and torn down with
//! [`MarketRouter::shutdown`] (or on drop).

mod booking;
mod fills;
mod submit;
mod worker;

use crate::broker::ClientConnection;
use crate::error::{Result, RouterError};
use crate::fees::ImpactModel;
use crate::instructions::InstructionTable;
use crate::models::{CostTotals, Instruction, RouterConfig};
use crate::notify::{Notifier, SubscriptionId, UpdateCallback};
use chrono::NaiveDateTime;
use dashmap::DashMap;
use log::{error, info};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock, Weak};
use trading::{
    CashUpdateMessage, Calendar, Clock, InstrumentInfo, MarketData, OrderId, OrderRecord,
    Portfolio, PortfolioId, Strategy, StrategyId,
};

use worker::Worker;

/// Callbacks into the strategy trees the router serves.
///
/// Implemented by the tree scheduler. The router holds it weakly so the
/// scheduler can own the router without a reference cycle.
pub trait TreeHost: Send + Sync {
    /// Books executed orders across the tree rooted at `strategy`.
    /// Returns the number of positions that changed.
    fn book_tree(&self, strategy: StrategyId, date: NaiveDateTime) -> anyhow::Result<usize>;

    /// Recomputes NAV for the tree at `date` and persists it.
    fn revalue(&self, strategy: StrategyId, date: NaiveDateTime) -> anyhow::Result<()>;

    /// Refreshes positions across the tree after a cash movement.
    fn update_positions(&self, strategy: StrategyId, date: NaiveDateTime) -> anyhow::Result<()>;
}

/// A master portfolio taking part in live booking.
#[derive(Clone)]
pub(crate) struct Monitored {
    pub portfolio: Arc<dyn Portfolio>,
    pub strategy: Arc<dyn Strategy>,
}

pub struct MarketRouter {
    config: RouterConfig,
    market: Arc<dyn MarketData>,
    calendar: Arc<dyn Calendar>,
    clock: Arc<dyn Clock>,
    instructions: InstructionTable,
    connections: DashMap<String, ClientConnection>,
    monitored: DashMap<PortfolioId, Monitored>,
    counters: DashMap<PortfolioId, CostTotals>,
    records: DashMap<OrderId, OrderRecord>,
    notifier: Notifier,
    impact: RwLock<Option<Arc<dyn ImpactModel>>>,
    host: RwLock<Option<Weak<dyn TreeHost>>>,
    // Serializes whole submission batches.
    batch_lock: Mutex<()>,
    // Serializes resolve-then-dispatch of single orders.
    dispatch_lock: Mutex<()>,
    pending_cash: Mutex<VecDeque<CashUpdateMessage>>,
    worker: Mutex<Option<Worker>>,
}

impl MarketRouter {
    /// Client that fills orders inside the router during live sessions.
    pub const SIMULATOR: &'static str = Instruction::SIMULATOR;

    pub fn new(
        config: RouterConfig,
        market: Arc<dyn MarketData>,
        calendar: Arc<dyn Calendar>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let instructions = InstructionTable::from_instructions(config.instructions());
        let connections = DashMap::new();
        for client in config.clients() {
            let connection = ClientConnection::new(&client.name, client.destinations.clone(), None);
            connections.insert(client.name.clone(), connection);
        }
        info!(
            "Market router ready: {} instructions, {} clients",
            instructions.len(),
            connections.len()
        );
        Ok(Self {
            config,
            market,
            calendar,
            clock,
            instructions,
            connections,
            monitored: DashMap::new(),
            counters: DashMap::new(),
            records: DashMap::new(),
            notifier: Notifier::new(),
            impact: RwLock::new(None),
            host: RwLock::new(None),
            batch_lock: Mutex::new(()),
            dispatch_lock: Mutex::new(()),
            pending_cash: Mutex::new(VecDeque::new()),
            worker: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn market(&self) -> &Arc<dyn MarketData> {
        &self.market
    }

    /// Registers the tree scheduler the router calls back into.
    pub fn attach_host(&self, host: Weak<dyn TreeHost>) {
        if let Ok(mut slot) = self.host.write() {
            *slot = Some(host);
        }
    }

    pub(crate) fn host(&self) -> Option<Arc<dyn TreeHost>> {
        self.host
            .read()
            .ok()
            .and_then(|h| h.as_ref().and_then(Weak::upgrade))
    }

    pub fn set_impact_model(&self, model: Option<Arc<dyn ImpactModel>>) {
        if let Ok(mut slot) = self.impact.write() {
            *slot = model;
        }
    }

    pub(crate) fn impact_model(&self) -> Option<Arc<dyn ImpactModel>> {
        self.impact.read().ok().and_then(|m| m.clone())
    }

    // ---------------------------------------------------------------------
    // Instructions

    pub fn add_instruction(&self, instruction: Instruction) {
        self.instructions.upsert(instruction);
    }

    pub fn remove_instruction(
        &self,
        portfolio: PortfolioId,
        instrument: trading::InstrumentId,
    ) -> Option<Instruction> {
        self.instructions.remove(portfolio, instrument)
    }

    pub fn instructions(&self) -> Vec<Instruction> {
        self.instructions.all()
    }

    /// Most specific instruction for a master portfolio and instrument,
    /// the "Inherit" sentinel when nothing matches.
    pub fn get_instruction(
        &self,
        portfolio: PortfolioId,
        instrument: trading::InstrumentId,
    ) -> Instruction {
        let underlying = self
            .market
            .instrument(instrument)
            .and_then(|info| info.kind().underlying());
        self.instructions.resolve(portfolio, instrument, underlying)
    }

    // ---------------------------------------------------------------------
    // Client connections

    pub fn add_connection(&self, connection: ClientConnection) {
        info!(
            "Client {} connected with destinations {:?}",
            connection.name(),
            connection.destinations()
        );
        self.connections
            .insert(connection.name().to_string(), connection);
    }

    pub fn remove_connection(&self, name: &str) -> Option<ClientConnection> {
        self.connections.remove(name).map(|(_, c)| c)
    }

    pub fn connection(&self, name: &str) -> Option<ClientConnection> {
        self.connections.get(name).map(|c| c.value().clone())
    }

    /// Every registered client with its destinations, plus the built-in
    /// "Simulator" and "Inherit" clients.
    pub fn clients_destinations(&self) -> BTreeMap<String, Vec<String>> {
        let mut clients: BTreeMap<String, Vec<String>> = self
            .connections
            .iter()
            .map(|c| (c.key().clone(), c.value().destinations().to_vec()))
            .collect();
        clients.insert(Self::SIMULATOR.to_string(), vec!["Default".to_string()]);
        clients.insert(Instruction::INHERIT.to_string(), vec![" ".to_string()]);
        clients
    }

    // ---------------------------------------------------------------------
    // Monitored portfolios and counters

    /// Adds a master portfolio to live booking and resets its counters.
    pub fn add_portfolio(&self, portfolio: Arc<dyn Portfolio>, strategy: Arc<dyn Strategy>) {
        let id = portfolio.id();
        self.counters.insert(id, CostTotals::default());
        self.monitored.insert(id, Monitored { portfolio, strategy });
        info!("Portfolio {} added to live booking", id);
    }

    pub fn remove_portfolio(&self, id: PortfolioId) -> Result<()> {
        self.monitored
            .remove(&id)
            .map(|_| ())
            .ok_or(RouterError::UnknownPortfolio(id))
    }

    pub fn is_monitored(&self, id: PortfolioId) -> bool {
        self.monitored.contains_key(&id)
    }

    pub(crate) fn monitored(&self, id: PortfolioId) -> Option<Monitored> {
        self.monitored.get(&id).map(|m| m.value().clone())
    }

    pub(crate) fn monitored_snapshot(&self) -> Vec<Monitored> {
        self.monitored.iter().map(|m| m.value().clone()).collect()
    }

    pub fn totals(&self, id: PortfolioId) -> CostTotals {
        self.counters.get(&id).map(|c| *c).unwrap_or_default()
    }

    pub fn costs(&self, id: PortfolioId) -> f64 {
        self.totals(id).costs
    }

    pub fn notional(&self, id: PortfolioId) -> f64 {
        self.totals(id).notional
    }

    pub fn contracts(&self, id: PortfolioId) -> f64 {
        self.totals(id).contracts
    }

    pub(crate) fn record_costs(&self, id: PortfolioId, fee_per_unit: f64, level: f64, unit: f64) {
        self.counters
            .entry(id)
            .or_default()
            .record(fee_per_unit, level, unit);
    }

    // ---------------------------------------------------------------------
    // Notifications

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn add_update_event(
        &self,
        portfolio: Option<PortfolioId>,
        callback: UpdateCallback,
    ) -> SubscriptionId {
        self.notifier.add_update_event(portfolio, callback)
    }

    pub fn remove_update_event(&self, portfolio: PortfolioId) {
        self.notifier.remove_update_event(portfolio);
    }

    /// Cached snapshot of a same-day order, if still working.
    pub fn order_record(&self, id: OrderId) -> Option<OrderRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    pub fn order_records(&self) -> Vec<OrderRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    fn cache_record(&self, record: OrderRecord) {
        self.notifier.update_record(&record);
        self.records.insert(record.order_id, record);
    }

    /// Publishes the executed state of a cached record and drops it from
    /// the cache.
    fn publish_fill(&self, id: OrderId, level: f64) {
        if let Some((_, mut record)) = self.records.remove(&id) {
            record.mark_executed(level);
            self.notifier.update_record(&record);
        }
    }

    // ---------------------------------------------------------------------
    // Instrument helpers

    /// Contract multiplier of `info`, a configured name-prefix override
    /// taking precedence over reference data.
    pub fn point_size(&self, info: &InstrumentInfo) -> f64 {
        self.config
            .point_size_override(info.name())
            .unwrap_or_else(|| info.point_size())
    }
}

impl fmt::Debug for MarketRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketRouter")
            .field("instructions", &self.instructions.len())
            .field("connections", &self.connections.len())
            .field("monitored", &self.monitored.len())
            .field("records", &self.records.len())
            .finish()
    }
}

impl Drop for MarketRouter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs one independent unit of work, logging instead of propagating its
/// failure or panic.
pub(crate) fn isolate<T>(
    what: impl fmt::Display,
    work: impl FnOnce() -> anyhow::Result<T>,
) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!("{} failed: {:#}", what, e);
            None
        }
        Err(_) => {
            error!("{} panicked", what);
            None
        }
    }
}

#[cfg(test)]
mod tests;
