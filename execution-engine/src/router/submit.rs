use super::{isolate, MarketRouter};
use crate::error::{Result, RouterError};
use crate::models::Instruction;
use crate::netting::{net_residual, Netting};
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError};
use trading::{
    InstrumentInfo, Order, OrderRecord, OrderStatus, OrderType, OrderUpdate, Portfolio,
    PortfolioId, Routing, Strategy,
};

impl MarketRouter {
    /// Submits every New order of the strategy's portfolio tree stamped on
    /// the day of `date`.
    ///
    /// A failing order is logged and skipped. Residual orders created by
    /// netting are submitted in a second pass of the same batch.
    ///
    /// # Returns
    ///
    /// The number of orders that went through [`MarketRouter::submit`].
    pub fn submit_orders(&self, date: NaiveDateTime, strategy: &dyn Strategy) -> Result<usize> {
        let master = strategy
            .portfolio()
            .ok_or(RouterError::NoPortfolio(strategy.id()))?;
        let _batch = self
            .batch_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut seen = HashSet::new();
        let mut submitted = 0;
        for _ in 0..2 {
            let mut orders: Vec<Order> = master
                .open_orders(date, true)
                .into_iter()
                .filter(|o| o.status() == OrderStatus::New && seen.insert(o.id()))
                .collect();
            if orders.is_empty() {
                break;
            }
            if strategy.is_simulating() {
                // Sells first so proceeds are available to the buys.
                orders.sort_by(|a, b| a.unit().total_cmp(&b.unit()));
            }
            for order in &orders {
                let outcome = isolate(format!("Submission of order {}", order.id()), || {
                    self.submit(order, strategy).map_err(anyhow::Error::from)
                });
                if outcome.is_some() {
                    submitted += 1;
                }
            }
        }
        debug!(
            "Submitted {} orders for strategy {} on {}",
            submitted,
            strategy.id(),
            date
        );
        Ok(submitted)
    }

    /// Routes one order.
    ///
    /// Does nothing unless the order is New. A zero-unit order is executed
    /// on the spot at the last price. Otherwise the order is given a route
    /// from the instruction cascade when it has none, netted against its
    /// portfolio's residual sibling, marked Submitted and, outside of
    /// simulations, handed to the client's broker.
    ///
    /// # Returns
    ///
    /// The published record, `None` when nothing was published.
    pub fn submit(&self, order: &Order, strategy: &dyn Strategy) -> Result<Option<OrderRecord>> {
        let master = strategy
            .portfolio()
            .ok_or(RouterError::NoPortfolio(strategy.id()))?;
        let _dispatch = self
            .dispatch_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if order.status() != OrderStatus::New {
            return Ok(None);
        }
        let info = self.market.instrument(order.instrument());

        if order.unit() == 0.0 {
            self.execute_flat(master.as_ref(), order, info.as_ref())?;
            return Ok(None);
        }

        let mut update = OrderUpdate::submitted();
        if order.client().trim().is_empty() || order.client() == Instruction::INHERIT {
            let underlying = info.as_ref().and_then(|i| i.kind().underlying());
            let instruction =
                self.instructions
                    .resolve_route(master.id(), order.instrument(), underlying);
            let owner = owner_of(&master, order.portfolio_id())?;
            if let Some(residual) = owner.residual() {
                self.post_residual(owner.as_ref(), residual.as_ref(), order, info.as_ref(), &instruction)?;
            }
            update = update.with_routing(instruction.routing());
        }
        master.update_order(order.id(), &update)?;

        if strategy.is_simulating() {
            return Ok(None);
        }

        let mut finalized = order.clone();
        finalized.apply(&update);
        let name = info
            .as_ref()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| order.instrument().to_string());
        let record = OrderRecord::from_order(&finalized, name, master.id(), strategy.name());

        if let Some(broker) = self.connection(finalized.client()).and_then(|c| c.broker()) {
            isolate(
                format!("Broker {} on order {}", finalized.client(), finalized.id()),
                || broker.submit(&finalized),
            );
        }

        if finalized.date().date() == self.clock.now().date() {
            self.cache_record(record.clone());
        }
        Ok(Some(record))
    }

    fn execute_flat(
        &self,
        master: &dyn Portfolio,
        order: &Order,
        info: Option<&InstrumentInfo>,
    ) -> Result<()> {
        let level = self.last_level(order.instrument(), order.date(), info);
        let update = if level.is_nan() {
            warn!(
                "No price for instrument {} on {}, flat order {} not executed",
                order.instrument(),
                order.date(),
                order.id()
            );
            OrderUpdate::not_executed(order.date())
        } else {
            OrderUpdate::executed(level, order.date())
        };
        master.update_order(
            order.id(),
            &update.with_routing(Routing::new(Self::SIMULATOR, "Model", "NA")),
        )?;
        Ok(())
    }

    /// Posts the rounding remainder of `order` to the residual portfolio as
    /// a market order of opposite sign.
    fn post_residual(
        &self,
        owner: &dyn Portfolio,
        residual: &dyn Portfolio,
        order: &Order,
        info: Option<&InstrumentInfo>,
        instruction: &Instruction,
    ) -> Result<Netting> {
        let instrument = order.instrument();
        let date = order.date();
        let (existing, aggregated) = if info.map(|i| i.kind().owns_portfolio()).unwrap_or(false) {
            (0.0, 0.0)
        } else {
            (
                residual.position_unit(instrument, date, true),
                owner.position_unit(instrument, date, true),
            )
        };
        let netting = net_residual(
            order.unit(),
            existing,
            aggregated,
            instruction.min_size,
            instruction.min_step,
        );
        if netting.residual != 0.0 {
            residual.create_order(instrument, date, -netting.residual, OrderType::Market, 0.0)?;
        }
        debug!(
            "Order {} netted: {} routed, {} left in residual portfolio {}",
            order.id(),
            netting.rounded,
            netting.residual,
            residual.id()
        );
        Ok(netting)
    }
}

fn owner_of(master: &Arc<dyn Portfolio>, id: PortfolioId) -> Result<Arc<dyn Portfolio>> {
    if master.id() == id {
        return Ok(master.clone());
    }
    master
        .sub_portfolio(id)
        .ok_or(RouterError::UnknownPortfolio(id))
}
