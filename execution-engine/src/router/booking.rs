use super::fills::signed_adjustment;
use super::{isolate, MarketRouter, Monitored};
use anyhow::anyhow;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use rayon::prelude::*;
use trading::{Order, OrderStatus, OrderType, OrderUpdate, RollType, SeriesField};

impl MarketRouter {
    /// Live booking pass over every monitored portfolio, in parallel.
    ///
    /// A portfolio whose strategy is simulating or currently executing is
    /// skipped until the next tick. Failures are logged per portfolio.
    ///
    /// # Returns
    ///
    /// The number of orders filled across all portfolios.
    pub fn book_orders(&self, now: NaiveDateTime) -> usize {
        let monitored: Vec<Monitored> = self
            .monitored_snapshot()
            .into_iter()
            .filter(|m| {
                let id = m.portfolio.id();
                if m.portfolio.master_id() == id {
                    return true;
                }
                warn!("Portfolio {} is no longer a master portfolio, unmonitored", id);
                self.monitored.remove(&id);
                false
            })
            .collect();

        monitored
            .par_iter()
            .filter_map(|m| {
                isolate(format!("Live booking of portfolio {}", m.portfolio.id()), || {
                    self.book_portfolio(m, now)
                })
            })
            .sum()
    }

    fn book_portfolio(&self, monitored: &Monitored, now: NaiveDateTime) -> anyhow::Result<usize> {
        let Monitored { portfolio, strategy } = monitored;
        if strategy.is_simulating() {
            return Ok(0);
        }
        let Some(_gate) = strategy.gate().try_enter() else {
            debug!("Strategy {} is executing, booking skipped", strategy.id());
            return Ok(0);
        };

        let today = now.date();
        let mut fills = 0;
        for order in portfolio.open_orders(now, true).into_iter().filter(|o| {
            o.status() == OrderStatus::Submitted
                && o.client() == Self::SIMULATOR
                && o.date().date() == today
        }) {
            let filled = isolate(format!("Live fill of order {}", order.id()), || {
                self.live_fill(monitored, &order, now)
            });
            if filled.unwrap_or(false) {
                fills += 1;
            }
        }

        let booked = match self.host() {
            Some(host) => host.book_tree(strategy.id(), now)?,
            None => portfolio.book_orders(now)?.len(),
        };
        if fills > 0 || booked > 0 {
            match self.host() {
                Some(host) => host.revalue(strategy.id(), now)?,
                None => {
                    strategy.nav_calculation(now)?;
                    strategy.save()?;
                    portfolio.save_new_positions()?;
                }
            }
            info!(
                "Portfolio {} booked {} fills, {} positions changed",
                portfolio.id(),
                fills,
                booked
            );
        }
        Ok(fills)
    }

    /// Fills one "Simulator" order against the current touch. Returns
    /// `false` when the price is missing or a limit does not cross.
    fn live_fill(&self, monitored: &Monitored, order: &Order, now: NaiveDateTime) -> anyhow::Result<bool> {
        let info = self
            .market
            .instrument(order.instrument())
            .ok_or_else(|| anyhow!("unknown instrument {}", order.instrument()))?;
        let last = self
            .market
            .value(info.id(), now, SeriesField::Last, RollType::Last);
        if last.is_nan() {
            return Ok(false);
        }
        // No quote feed: both sides of the touch sit at the last trade.
        let (bid, ask) = (last, last);
        let unit = order.unit();
        let crosses = match order.order_type() {
            OrderType::Market => true,
            OrderType::Limit => {
                (unit > 0.0 && order.limit() >= ask) || (unit < 0.0 && order.limit() <= bid)
            }
        };
        if !crosses {
            return Ok(false);
        }

        let point_size = self.point_size(&info);
        let touch = if unit < 0.0 { bid } else { ask };
        let level = touch * point_size;
        let master_id = monitored.portfolio.id();
        let fee = self
            .instructions
            .resolve(master_id, info.id(), info.kind().underlying())
            .fees()
            .per_unit(level, unit);
        let filled_at = signed_adjustment(level, unit, fee);

        if !monitored
            .portfolio
            .update_order(order.id(), &OrderUpdate::executed(filled_at, now))?
        {
            return Ok(false);
        }
        self.record_costs(master_id, fee, level, unit);
        self.publish_fill(order.id(), filled_at / point_size);
        Ok(true)
    }
}
