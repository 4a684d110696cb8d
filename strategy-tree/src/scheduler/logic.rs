use super::TreeScheduler;
use crate::error::{Result, TreeError};
use crate::node::TreeNode;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::sync::Arc;
use trading::StrategyId;

impl TreeScheduler {
    /// Runs the logic of the tree rooted at `id` for `date`.
    ///
    /// Children run concurrently and all finish before their parent. When
    /// the parent's run gives a stale child a start-of-day AUM, the subtree
    /// is cleared for the day and run once more. The residual child runs
    /// last, on its own.
    ///
    /// Fails with [`TreeError::Busy`] while the root is executing.
    pub fn execute_logic(&self, id: StrategyId, date: NaiveDateTime, force: bool) -> Result<()> {
        let node = self.require(id)?;
        let Some(_gate) = node.strategy().gate().try_enter() else {
            return Err(TreeError::Busy(id));
        };
        self.run_logic(&node, date, force)
    }

    pub(crate) fn run_logic(&self, node: &Arc<TreeNode>, date: NaiveDateTime, force: bool) -> Result<()> {
        self.logic_pass(node, date, true, force)?;

        let Some(residual) = node.residual().and_then(|id| self.node(id)) else {
            return Ok(());
        };
        let strategy = residual.strategy();
        if let Some(day) = strategy.calendar().business_day(date) {
            strategy.execute_logic(&strategy.execution_context(day), force)?;
        }
        Ok(())
    }

    fn logic_pass(
        &self,
        node: &Arc<TreeNode>,
        date: NaiveDateTime,
        repass: bool,
        force: bool,
    ) -> Result<()> {
        let strategy = node.strategy();
        if strategy.portfolio().is_none() {
            return Ok(());
        }

        let children: Vec<_> = self
            .child_nodes(node)
            .into_iter()
            .filter(|child| child.runs_logic_on(date))
            .collect();
        let stale: Vec<Arc<TreeNode>> = self
            .fork(&children, "Logic", |child| {
                // Staleness is judged on the AUM the child starts the day with.
                let aum = child.strategy().aum(date);
                self.logic_pass(child, date, false, force)?;
                Ok((aum.is_nan() || aum == 0.0).then(|| child.clone()))
            })
            .into_iter()
            .flatten()
            .collect();

        let calendar = strategy.calendar();
        let Some(day) = calendar.business_day(date) else {
            return Ok(());
        };
        if strategy.is_initialized() && !node.is_residual() {
            strategy.execute_logic(&strategy.execution_context(day), force)?;
        }

        if !repass || strategy.sod_aum(date).is_nan() {
            return Ok(());
        }
        let next_day = calendar.add_business_days(day, 1);
        let revived = stale.iter().any(|child| {
            let s = child.strategy();
            s.initial_date() <= day
                && s.final_date() >= next_day
                && !child.is_residual()
                && !s.sod_aum(date).is_nan()
        });
        if revived {
            info!("Stale children of strategy {} revived on {}, running again", node.id(), day);
            strategy.clear_memory(day);
            self.clear_orders_node(node, day, true)?;
            self.logic_pass(node, day, false, force)?;
        } else if !stale.is_empty() {
            debug!("{} stale children of strategy {} on {}", stale.len(), node.id(), day);
        }
        Ok(())
    }
}
