use super::{SaveSuspension, TreeScheduler};
use crate::error::{Result, TreeError};
use crate::node::TreeNode;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::sync::Arc;
use trading::StrategyId;

impl TreeScheduler {
    /// Runs one full tick of the tree rooted at `id` for `date`.
    ///
    /// Stages run in a fixed order. Logic, post-logic and order submission
    /// happen at `date`; pre-valuation, fills, corporate actions, booking,
    /// valuation, margining and sub-strategy maintenance happen a small
    /// offset later. The root portfolio does not persist during the tick,
    /// and the tree is saved once at the end only if every stage succeeded.
    ///
    /// Fails with [`TreeError::Busy`] without doing anything while the root
    /// is executing.
    pub fn process(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        let node = self.require(id)?;
        let strategy = node.strategy().clone();
        let Some(_gate) = strategy.gate().try_enter() else {
            return Err(TreeError::Busy(id));
        };
        let suspension = strategy.portfolio().map(SaveSuspension::new);

        self.run_stages(&node, date)?;

        drop(suspension);
        self.save_node(&node)?;
        self.save_new_positions_node(&node)?;
        info!("Strategy {} processed for {}", id, date);
        Ok(())
    }

    fn run_stages(&self, node: &Arc<TreeNode>, date: NaiveDateTime) -> Result<()> {
        let strategy = node.strategy();
        self.run_logic(node, date, false)?;
        self.post_execute_logic_node(node, date)?;
        if strategy.portfolio().is_some() {
            self.router.submit_orders(date, strategy.as_ref())?;
        }

        let t = date + self.config.tick_offset();
        self.pre_nav(node, t)?;
        if let Some(portfolio) = strategy.portfolio() {
            let executed = self.router.receive_execution_levels(t, &portfolio)?;
            debug!("{} orders executed for strategy {} at {}", executed, node.id(), t);
        }
        self.manage_corporate_actions_node(node, t)?;
        self.book_orders_node(node, t)?;
        self.nav(node, t)?;
        self.margin_futures_node(node, t)?;
        self.add_remove_sub_strategies_node(node, t)?;
        Ok(())
    }
}
