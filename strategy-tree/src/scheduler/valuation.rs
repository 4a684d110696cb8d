use super::TreeScheduler;
use crate::error::Result;
use crate::node::TreeNode;
use chrono::NaiveDateTime;
use log::debug;
use std::sync::Arc;
use trading::StrategyId;

impl TreeScheduler {
    /// Values the tree rooted at `id` on `date`, children first.
    ///
    /// Each node is valued at most once per business date: a second call
    /// returns the cached figures without touching the strategies. A date
    /// that is not a business day for the root values to `0.0`.
    pub fn nav_calculation(&self, id: StrategyId, date: NaiveDateTime) -> Result<f64> {
        let node = self.require(id)?;
        self.nav(&node, date)
    }

    /// Values the portfolio-less nodes of the tree rooted at `id`, whose
    /// figures feed the portfolio valuations of the same tick.
    pub fn pre_nav_calculation(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        let node = self.require(id)?;
        self.pre_nav(&node, date)
    }

    pub(crate) fn nav(&self, node: &Arc<TreeNode>, date: NaiveDateTime) -> Result<f64> {
        let strategy = node.strategy();
        let business_day = strategy.calendar().business_day(date);
        if let Some(cached) = business_day.and_then(|day| self.nav_cache.get(day, node.id())) {
            return Ok(cached);
        }

        let (residual, children): (Vec<_>, Vec<_>) = self
            .child_nodes(node)
            .into_iter()
            .filter(|child| child.is_valued_on(date))
            .partition(|child| child.is_residual());
        self.fork(&children, "Valuation", |child| self.nav(child, date));

        let Some(day) = business_day else {
            return Ok(0.0);
        };
        let value = strategy.nav_calculation(day)?;
        let value = self.nav_cache.insert_if_absent(day, node.id(), value);
        debug!("Strategy {} valued at {} on {}", node.id(), value, day);

        self.fork(&residual, "Residual valuation", |child| self.nav(child, date));
        Ok(value)
    }

    pub(crate) fn pre_nav(&self, node: &Arc<TreeNode>, date: NaiveDateTime) -> Result<()> {
        let children: Vec<_> = self
            .child_nodes(node)
            .into_iter()
            .filter(|child| child.is_valued_on(date))
            .collect();
        self.fork(&children, "Pre-valuation", |child| self.pre_nav(child, date));

        if node.portfolio().is_some() {
            return Ok(());
        }
        let strategy = node.strategy();
        if let Some(day) = strategy.calendar().business_day(date) {
            if self.nav_cache.get(day, node.id()).is_none() {
                let value = strategy.nav_calculation(day)?;
                self.nav_cache.insert_if_absent(day, node.id(), value);
            }
        }
        Ok(())
    }
}
