use super::next_id;
use super::strategy::Journal;
use crate::model::identity::{InstrumentId, OrderId, PortfolioId};
use crate::model::instrument::{RollType, SeriesField};
use crate::model::order::{Order, OrderStatus, OrderType, OrderUpdate};
use crate::model::position::{Position, ReserveLeg};
use crate::traits::market_data::MarketData;
use crate::traits::portfolio::Portfolio;
use anyhow::{Result, anyhow};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Ledger kept entirely in memory.
pub struct MemoryPortfolio {
    id: PortfolioId,
    name: String,
    currency: String,
    market: Arc<dyn MarketData>,
    parent: RwLock<Option<Weak<dyn Portfolio>>>,
    subs: RwLock<Vec<Arc<dyn Portfolio>>>,
    residual: RwLock<Option<Arc<dyn Portfolio>>>,
    orders: RwLock<Vec<Order>>,
    booked: RwLock<HashSet<OrderId>>,
    positions: RwLock<BTreeMap<InstrumentId, Position>>,
    cash: RwLock<HashMap<String, f64>>,
    reserves: RwLock<Vec<ReserveLeg>>,
    can_save: AtomicBool,
    saves: AtomicUsize,
    simulated: bool,
    journal: Option<Journal>,
}

impl MemoryPortfolio {
    pub fn new(
        id: PortfolioId,
        name: impl Into<String>,
        currency: impl Into<String>,
        market: Arc<dyn MarketData>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            currency: currency.into(),
            market,
            parent: RwLock::new(None),
            subs: RwLock::new(Vec::new()),
            residual: RwLock::new(None),
            orders: RwLock::new(Vec::new()),
            booked: RwLock::new(HashSet::new()),
            positions: RwLock::new(BTreeMap::new()),
            cash: RwLock::new(HashMap::new()),
            reserves: RwLock::new(Vec::new()),
            can_save: AtomicBool::new(true),
            saves: AtomicUsize::new(0),
            simulated: false,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn deposit(&self, currency: &str, amount: f64) {
        if let Ok(mut cash) = self.cash.write() {
            *cash.entry(currency.to_string()).or_insert(0.0) += amount;
        }
    }

    pub fn cash(&self, currency: &str) -> f64 {
        self.cash
            .read()
            .ok()
            .and_then(|c| c.get(currency).copied())
            .unwrap_or(0.0)
    }

    /// Every order this portfolio itself holds, any date or status.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    fn record(&self, entry: impl Into<String>) {
        if let Some(journal) = &self.journal {
            journal.record(entry);
        }
    }

    fn subs(&self) -> Vec<Arc<dyn Portfolio>> {
        self.subs.read().map(|s| s.clone()).unwrap_or_default()
    }

    fn to_base(&self, amount: f64, date: NaiveDateTime, currency: &str) -> f64 {
        self.market.convert(amount, date, currency, &self.currency)
    }
}

impl Portfolio for MemoryPortfolio {
    fn id(&self) -> PortfolioId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn master_id(&self) -> PortfolioId {
        let parent = self
            .parent
            .read()
            .ok()
            .and_then(|p| p.as_ref().and_then(Weak::upgrade));
        match parent {
            Some(parent) => parent.master_id(),
            None => self.id,
        }
    }

    fn currency(&self) -> String {
        self.currency.clone()
    }

    fn value(&self, date: NaiveDateTime) -> f64 {
        let mut total = 0.0;
        if let Ok(cash) = self.cash.read() {
            for (currency, amount) in cash.iter() {
                total += self.to_base(*amount, date, currency);
            }
        }
        if let Ok(positions) = self.positions.read() {
            for position in positions.values() {
                if position.unit == 0.0 {
                    continue;
                }
                let Some(info) = self.market.instrument(position.instrument) else {
                    return f64::NAN;
                };
                let last =
                    self.market
                        .value(position.instrument, date, SeriesField::Last, RollType::Last);
                let local = position.unit * last * info.point_size();
                total += self.to_base(local, date, info.currency());
            }
        }
        for sub in self.subs() {
            total += sub.value(date);
        }
        total
    }

    fn residual(&self) -> Option<Arc<dyn Portfolio>> {
        self.residual.read().ok().and_then(|r| r.clone())
    }

    fn set_residual(&self, residual: Option<Arc<dyn Portfolio>>) {
        if let Ok(mut slot) = self.residual.write() {
            *slot = residual;
        }
    }

    fn set_parent(&self, parent: Option<&Arc<dyn Portfolio>>) {
        if let Ok(mut slot) = self.parent.write() {
            *slot = parent.map(Arc::downgrade);
        }
    }

    fn add_sub_portfolio(&self, child: Arc<dyn Portfolio>) {
        if let Ok(mut subs) = self.subs.write() {
            if !subs.iter().any(|s| s.id() == child.id()) {
                subs.push(child);
            }
        }
    }

    fn remove_sub_portfolio(&self, id: PortfolioId) {
        if let Ok(mut subs) = self.subs.write() {
            subs.retain(|s| s.id() != id);
        }
    }

    fn sub_portfolio(&self, id: PortfolioId) -> Option<Arc<dyn Portfolio>> {
        for sub in self.subs() {
            if sub.id() == id {
                return Some(sub);
            }
            if let Some(found) = sub.sub_portfolio(id) {
                return Some(found);
            }
        }
        None
    }

    fn open_orders(&self, date: NaiveDateTime, aggregated: bool) -> Vec<Order> {
        let day = date.date();
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .map(|o| {
                o.iter()
                    .filter(|order| order.date().date() == day)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if aggregated {
            for sub in self.subs() {
                orders.extend(sub.open_orders(date, true));
            }
        }
        orders
    }

    fn update_order(&self, id: OrderId, update: &OrderUpdate) -> Result<bool> {
        {
            let mut orders = self
                .orders
                .write()
                .map_err(|_| anyhow!("order book of portfolio {} is poisoned", self.id))?;
            if let Some(order) = orders.iter_mut().find(|o| o.id() == id) {
                return Ok(order.apply(update));
            }
        }
        for sub in self.subs() {
            if let Ok(changed) = sub.update_order(id, update) {
                return Ok(changed);
            }
        }
        Err(anyhow!("order {} not found in portfolio {}", id, self.id))
    }

    fn create_order(
        &self,
        instrument: InstrumentId,
        date: NaiveDateTime,
        unit: f64,
        order_type: OrderType,
        limit: f64,
    ) -> Result<Order> {
        let order = Order::new(self.id, instrument, date, unit, order_type, limit);
        self.orders
            .write()
            .map_err(|_| anyhow!("order book of portfolio {} is poisoned", self.id))?
            .push(order.clone());
        Ok(order)
    }

    fn position_unit(&self, instrument: InstrumentId, date: NaiveDateTime, aggregated: bool) -> f64 {
        let own = self
            .positions
            .read()
            .ok()
            .and_then(|p| p.get(&instrument).map(|pos| pos.unit))
            .unwrap_or(0.0);
        if !aggregated {
            return own;
        }
        own + self
            .subs()
            .iter()
            .map(|s| s.position_unit(instrument, date, true))
            .sum::<f64>()
    }

    fn clear_orders(&self, date: NaiveDateTime) {
        let day = date.date();
        if let Ok(mut orders) = self.orders.write() {
            orders.retain(|o| o.date().date() != day || o.status() == OrderStatus::Executed);
        }
    }

    fn book_orders(&self, date: NaiveDateTime) -> Result<Vec<Position>> {
        let day = date.date();
        let orders = self.orders();
        let mut booked = self
            .booked
            .write()
            .map_err(|_| anyhow!("booking state of portfolio {} is poisoned", self.id))?;
        let mut positions = self
            .positions
            .write()
            .map_err(|_| anyhow!("positions of portfolio {} are poisoned", self.id))?;
        let mut changed = Vec::new();

        let pending: Vec<&Order> = orders
            .iter()
            .filter(|o| {
                o.status() == OrderStatus::Executed
                    && o.date().date() <= day
                    && !booked.contains(&o.id())
            })
            .collect();
        for order in pending {
            let position = positions
                .entry(order.instrument())
                .or_insert_with(|| Position::new(order.instrument(), 0.0, 0.0, date));
            position.unit += order.unit();
            position.strike = order.execution_level();
            position.date = date;
            changed.push(position.clone());
            booked.insert(order.id());

            let currency = self
                .market
                .instrument(order.instrument())
                .map(|i| i.currency().to_string())
                .unwrap_or_else(|| self.currency.clone());
            let paid = order.unit() * order.execution_level();
            self.deposit(&currency, -paid);
        }
        if !changed.is_empty() {
            self.record(format!("book:{}", self.id));
        }
        Ok(changed)
    }

    fn manage_corporate_actions(&self, _date: NaiveDateTime) -> Result<()> {
        self.record(format!("corporate_actions:{}", self.id));
        Ok(())
    }

    fn margin_futures(&self, _date: NaiveDateTime) -> Result<()> {
        self.record(format!("margin:{}", self.id));
        Ok(())
    }

    fn update_positions(&self, _date: NaiveDateTime) -> Result<()> {
        self.record(format!("update_positions:{}", self.id));
        Ok(())
    }

    fn update_reserve_position(&self, _date: NaiveDateTime, value: f64, currency: &str) -> Result<()> {
        if value.is_nan() {
            return Err(anyhow!("cannot reserve NaN {} in portfolio {}", currency, self.id));
        }
        self.deposit(currency, value);
        Ok(())
    }

    fn can_save(&self) -> bool {
        self.can_save.load(Ordering::Acquire)
    }

    fn set_can_save(&self, can_save: bool) {
        self.can_save.store(can_save, Ordering::Release);
    }

    fn save_new_positions(&self) -> Result<()> {
        if self.can_save() {
            self.saves.fetch_add(1, Ordering::Relaxed);
            self.record(format!("save_positions:{}", self.id));
        }
        Ok(())
    }

    fn reserves(&self) -> Vec<ReserveLeg> {
        self.reserves.read().map(|r| r.clone()).unwrap_or_default()
    }

    fn add_reserve(&self, leg: ReserveLeg) {
        if let Ok(mut reserves) = self.reserves.write() {
            reserves.retain(|r| r.currency != leg.currency);
            reserves.push(leg);
        }
    }

    fn duplicate(&self, simulated: bool) -> Result<Arc<dyn Portfolio>> {
        let mut copy = MemoryPortfolio::new(
            next_id(),
            self.name.clone(),
            self.currency.clone(),
            self.market.clone(),
        );
        copy.simulated = simulated;
        copy.journal = self.journal.clone();
        if let (Ok(mut dst), Ok(src)) = (copy.positions.write(), self.positions.read()) {
            *dst = src.clone();
        }
        if let (Ok(mut dst), Ok(src)) = (copy.cash.write(), self.cash.read()) {
            *dst = src.clone();
        }
        Ok(Arc::new(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMarketData;
    use crate::model::instrument::{InstrumentInfo, InstrumentKind};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn market() -> Arc<MemoryMarketData> {
        let md = Arc::new(MemoryMarketData::new());
        md.add_instrument(InstrumentInfo::new(10, "ACME", InstrumentKind::Equity, "USD"));
        md.set_last(10, day(4), 50.0);
        md
    }

    #[test]
    fn test_book_orders_moves_cash_into_positions() -> Result<()> {
        let p = MemoryPortfolio::new(1, "Root", "USD", market());
        p.deposit("USD", 1_000.0);
        let order = p.create_order(10, day(4), 4.0, OrderType::Market, 0.0)?;
        p.update_order(order.id(), &OrderUpdate::submitted())?;
        p.update_order(order.id(), &OrderUpdate::executed(50.0, day(4)))?;

        let booked = p.book_orders(day(4))?;
        assert_eq!(booked.len(), 1);
        assert_eq!(p.position_unit(10, day(4), false), 4.0);
        assert!((p.cash("USD") - 800.0).abs() < 1e-9);
        assert!((p.value(day(4)) - 1_000.0).abs() < 1e-9);

        // Booking is idempotent per order.
        assert!(p.book_orders(day(4))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_book_orders_books_every_pending_fill_once() -> Result<()> {
        let md = market();
        md.set_last(10, day(5), 55.0);
        let p = MemoryPortfolio::new(1, "Root", "USD", md);
        let fill = |date: NaiveDateTime, unit: f64, level: f64| -> Result<()> {
            let order = p.create_order(10, date, unit, OrderType::Market, 0.0)?;
            p.update_order(order.id(), &OrderUpdate::submitted())?;
            p.update_order(order.id(), &OrderUpdate::executed(level, date))?;
            Ok(())
        };
        fill(day(4), 4.0, 50.0)?;
        fill(day(4), -1.0, 50.0)?;
        fill(day(5), 2.0, 55.0)?;

        assert_eq!(p.book_orders(day(4))?.len(), 2);
        assert_eq!(p.position_unit(10, day(4), false), 3.0);
        assert_eq!(p.book_orders(day(5))?.len(), 1, "only the later fill is left");
        assert_eq!(p.position_unit(10, day(5), false), 5.0);
        assert!((p.cash("USD") + 260.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_update_order_reaches_sub_portfolios() -> Result<()> {
        let md = market();
        let root: Arc<dyn Portfolio> = Arc::new(MemoryPortfolio::new(1, "Root", "USD", md.clone()));
        let child: Arc<dyn Portfolio> = Arc::new(MemoryPortfolio::new(2, "Child", "USD", md));
        root.add_sub_portfolio(child.clone());
        child.set_parent(Some(&root));

        let order = child.create_order(10, day(4), 1.0, OrderType::Market, 0.0)?;
        assert!(root.update_order(order.id(), &OrderUpdate::submitted())?);
        assert!(!root.update_order(order.id(), &OrderUpdate::submitted())?);
        assert_eq!(child.master_id(), 1);
        assert_eq!(root.open_orders(day(4), true).len(), 1);
        assert!(root.open_orders(day(4), false).is_empty());
        Ok(())
    }
}
