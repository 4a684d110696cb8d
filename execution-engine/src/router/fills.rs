use super::MarketRouter;
use crate::error::{Result, RouterError};
use crate::fees::ImpactInputs;
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::sync::Arc;
use trading::{
    InstrumentId, InstrumentInfo, Order, OrderStatus, OrderUpdate, Portfolio, RollType,
    SeriesField,
};

impl MarketRouter {
    /// Fills every Submitted order of `portfolio`'s tree stamped on the day
    /// of `date` from market data.
    ///
    /// Orders are executed at the last price, scaled by point size and
    /// adjusted by fees and market impact in the direction of the trade.
    /// An order without a price becomes NotExecuted. Nothing happens when
    /// `date` is not a business day.
    ///
    /// # Returns
    ///
    /// The number of orders executed.
    pub fn receive_execution_levels(
        &self,
        date: NaiveDateTime,
        portfolio: &Arc<dyn Portfolio>,
    ) -> Result<usize> {
        if self.calendar.business_day(date).is_none() {
            debug!("{} is not a business day, simulated fills deferred", date);
            return Ok(0);
        }
        let master_id = portfolio.master_id();
        let currency = portfolio.currency();
        let mut executed = 0;

        for order in portfolio
            .open_orders(date, true)
            .into_iter()
            .filter(|o| o.status() == OrderStatus::Submitted)
        {
            let (update, costs) = self.simulated_fill(&order, date, master_id, &currency);
            if !portfolio.update_order(order.id(), &update)? {
                continue;
            }
            if let Some((fee, level)) = costs {
                self.record_costs(master_id, fee, level, order.unit());
            }
            if update.status == OrderStatus::Executed {
                executed += 1;
            }
        }
        Ok(executed)
    }

    /// Prices one fill. Alongside the update comes the per-unit fee and the
    /// pre-fee level to charge once the ledger accepts it.
    fn simulated_fill(
        &self,
        order: &Order,
        date: NaiveDateTime,
        master_id: trading::PortfolioId,
        currency: &str,
    ) -> (OrderUpdate, Option<(f64, f64)>) {
        let info = self.market.instrument(order.instrument());
        let mut level = self.last_level(order.instrument(), date, info.as_ref());
        let Some(info) = info.filter(|_| !level.is_nan()) else {
            warn!(
                "No price for instrument {} on {}, order {} not executed",
                order.instrument(),
                date,
                order.id()
            );
            return (OrderUpdate::not_executed(date), None);
        };

        let unit = order.unit();
        let mut costs = None;
        if unit.abs() >= 1.0 && info.kind().charges_execution_fees() {
            let fee = self
                .instructions
                .resolve(master_id, info.id(), info.kind().underlying())
                .fees()
                .per_unit(level, unit);
            costs = Some((fee, level));
            let impact = self.market_impact(&info, date, unit, level, currency);
            level = signed_adjustment(level, unit, fee + impact).max(self.config.price_floor());
        }
        (OrderUpdate::executed(level, date), costs)
    }

    fn market_impact(
        &self,
        info: &InstrumentInfo,
        date: NaiveDateTime,
        unit: f64,
        level: f64,
        currency: &str,
    ) -> f64 {
        let Some(model) = self.impact_model() else {
            return 0.0;
        };
        let inputs = ImpactInputs {
            market: self.market.as_ref(),
            calendar: self.calendar.as_ref(),
            instrument: info,
            point_size: self.point_size(info),
            portfolio_currency: currency,
            window: self.config.volume_window(),
        };
        inputs.impact(date, unit, level, model.factor(date, info.id()))
    }

    /// Last traded price of `instrument` at `date` times its point size,
    /// NaN when either is unknown.
    pub(crate) fn last_level(
        &self,
        instrument: InstrumentId,
        date: NaiveDateTime,
        info: Option<&InstrumentInfo>,
    ) -> f64 {
        let Some(info) = info else {
            return f64::NAN;
        };
        self.market
            .value(instrument, date, SeriesField::Last, RollType::Last)
            * self.point_size(info)
    }

    /// Applies a broker fill confirmation.
    ///
    /// The order must belong to a monitored master portfolio. Its cached
    /// record, if any, is published as executed and dropped.
    pub fn record_fill_value(&self, order: &Order, time: NaiveDateTime, value: f64) -> Result<bool> {
        let owner = order.portfolio_id();
        let master = self
            .monitored_snapshot()
            .into_iter()
            .find(|m| m.portfolio.id() == owner || m.portfolio.sub_portfolio(owner).is_some())
            .ok_or(RouterError::UnknownPortfolio(owner))?;

        if !master
            .portfolio
            .update_order(order.id(), &OrderUpdate::executed(value, time))?
        {
            return Ok(false);
        }
        self.record_costs(master.portfolio.id(), 0.0, value, order.unit());
        self.publish_fill(order.id(), value);
        Ok(true)
    }
}

/// Moves `level` against the trader by `amount`: up for buys, down for
/// sells.
pub(crate) fn signed_adjustment(level: f64, unit: f64, amount: f64) -> f64 {
    if unit > 0.0 {
        level + amount
    } else if unit < 0.0 {
        level - amount
    } else {
        level
    }
}
