//! Recursive walks mirroring the per-stage hooks of strategies and
//! portfolios. Each has a public form taking a root id.

use super::TreeScheduler;
use crate::error::Result;
use crate::node::TreeNode;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::sync::Arc;
use trading::StrategyId;

impl TreeScheduler {
    pub fn post_execute_logic(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        self.post_execute_logic_node(&*self.require(id)?, date)
    }

    pub fn manage_corporate_actions(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        self.manage_corporate_actions_node(&*self.require(id)?, date)
    }

    /// Books executed orders across the tree.
    ///
    /// # Returns
    ///
    /// The number of positions that changed.
    pub fn book_orders(&self, id: StrategyId, date: NaiveDateTime) -> Result<usize> {
        self.book_orders_node(&*self.require(id)?, date)
    }

    pub fn margin_futures(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        self.margin_futures_node(&*self.require(id)?, date)
    }

    pub fn add_remove_sub_strategies(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        self.add_remove_sub_strategies_node(&*self.require(id)?, date)
    }

    pub fn update_positions(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        self.update_positions_node(&*self.require(id)?, date)
    }

    pub fn clear_memory(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        self.clear_memory_node(&*self.require(id)?, date);
        Ok(())
    }

    /// Drops the day's orders across the tree, and with `clear_memory` the
    /// AUM recorded after `date`.
    pub fn clear_orders(&self, id: StrategyId, date: NaiveDateTime, clear_memory: bool) -> Result<()> {
        self.clear_orders_node(&*self.require(id)?, date, clear_memory)
    }

    pub fn initialize(&self, id: StrategyId) -> Result<()> {
        self.initialize_node(&*self.require(id)?)
    }

    pub fn save(&self, id: StrategyId) -> Result<()> {
        self.save_node(&*self.require(id)?)
    }

    pub fn save_new_positions(&self, id: StrategyId) -> Result<()> {
        self.save_new_positions_node(&*self.require(id)?)
    }

    /// Tears down the tree rooted at `id`: strategies are removed, their
    /// nodes unregistered and their cached valuations purged.
    pub fn remove(&self, id: StrategyId) -> Result<()> {
        let node = self.require(id)?;
        self.detach_everywhere(id);
        self.remove_node(&node, None)?;
        info!("Strategy {} removed with its sub-strategies", id);
        Ok(())
    }

    /// Like [`TreeScheduler::remove`], but strategies only drop their
    /// history from `date` on.
    pub fn remove_from(&self, id: StrategyId, date: NaiveDateTime) -> Result<()> {
        let node = self.require(id)?;
        self.detach_everywhere(id);
        self.remove_node(&node, Some(date))?;
        info!("Strategy {} removed from {}", id, date);
        Ok(())
    }

    fn active_children(&self, node: &TreeNode, date: NaiveDateTime) -> Vec<Arc<TreeNode>> {
        self.child_nodes(node)
            .into_iter()
            .filter(|child| child.is_active(date))
            .collect()
    }

    pub(crate) fn post_execute_logic_node(&self, node: &TreeNode, date: NaiveDateTime) -> Result<()> {
        for child in self.active_children(node, date) {
            self.post_execute_logic_node(&child, date)?;
        }
        let strategy = node.strategy();
        if strategy.calendar().business_day(date).is_some() {
            strategy.post_execute_logic(date)?;
        }
        Ok(())
    }

    pub(crate) fn manage_corporate_actions_node(&self, node: &TreeNode, date: NaiveDateTime) -> Result<()> {
        for child in self.child_nodes(node) {
            self.manage_corporate_actions_node(&child, date)?;
        }
        if let Some(portfolio) = node.portfolio() {
            portfolio.manage_corporate_actions(date)?;
        }
        Ok(())
    }

    pub(crate) fn book_orders_node(&self, node: &TreeNode, date: NaiveDateTime) -> Result<usize> {
        let mut booked = 0;
        let strategy = node.strategy();
        if let Some(portfolio) = node.portfolio().filter(|_| strategy.is_initialized()) {
            booked += portfolio.book_orders(date)?.len();
        }
        for child in self.active_children(node, date) {
            booked += self.book_orders_node(&child, date)?;
        }
        if booked > 0 {
            debug!("Strategy {} booked {} positions on {}", node.id(), booked, date);
        }
        Ok(booked)
    }

    pub(crate) fn margin_futures_node(&self, node: &TreeNode, date: NaiveDateTime) -> Result<()> {
        for child in self.child_nodes(node) {
            self.margin_futures_node(&child, date)?;
        }
        if let Some(portfolio) = node.portfolio() {
            portfolio.margin_futures(date)?;
        }
        Ok(())
    }

    pub(crate) fn add_remove_sub_strategies_node(&self, node: &TreeNode, date: NaiveDateTime) -> Result<()> {
        for child in self
            .active_children(node, date)
            .into_iter()
            .filter(|c| c.portfolio().is_some())
        {
            self.add_remove_sub_strategies_node(&child, date)?;
        }
        let strategy = node.strategy();
        if strategy.calendar().business_day(date).is_some() {
            strategy.add_remove_sub_strategies(date)?;
        }
        Ok(())
    }

    pub(crate) fn update_positions_node(&self, node: &TreeNode, date: NaiveDateTime) -> Result<()> {
        for child in self.child_nodes(node) {
            self.update_positions_node(&child, date)?;
        }
        if let Some(portfolio) = node.portfolio() {
            portfolio.update_positions(date)?;
        }
        Ok(())
    }

    pub(crate) fn clear_memory_node(&self, node: &TreeNode, date: NaiveDateTime) {
        for child in self.child_nodes(node) {
            self.clear_memory_node(&child, date);
        }
        let strategy = node.strategy();
        if strategy.is_initialized() {
            strategy.clear_memory(date);
        }
    }

    pub(crate) fn clear_orders_node(&self, node: &TreeNode, date: NaiveDateTime, clear_memory: bool) -> Result<()> {
        for child in self.child_nodes(node) {
            self.clear_orders_node(&child, date, clear_memory)?;
        }
        let strategy = node.strategy();
        if strategy.calendar().business_day(date).is_none() || !strategy.is_initialized() {
            return Ok(());
        }
        if clear_memory {
            strategy.clear_next_aum_memory(date);
        }
        if let Some(portfolio) = node.portfolio() {
            portfolio.clear_orders(date);
        }
        Ok(())
    }

    pub(crate) fn initialize_node(&self, node: &TreeNode) -> Result<()> {
        for child in self.child_nodes(node) {
            self.initialize_node(&child)?;
        }
        node.strategy().initialize()?;
        Ok(())
    }

    pub(crate) fn save_node(&self, node: &TreeNode) -> Result<()> {
        for child in self.child_nodes(node) {
            self.save_node(&child)?;
        }
        node.strategy().save()?;
        Ok(())
    }

    pub(crate) fn save_new_positions_node(&self, node: &TreeNode) -> Result<()> {
        for child in self.child_nodes(node) {
            self.save_new_positions_node(&child)?;
        }
        if let Some(portfolio) = node.portfolio() {
            portfolio.save_new_positions()?;
        }
        Ok(())
    }

    fn remove_node(&self, node: &TreeNode, from: Option<NaiveDateTime>) -> Result<()> {
        for child in self.child_nodes(node) {
            self.remove_node(&child, from)?;
        }
        let id = node.id();
        let purged = self.nav_cache.purge(id);
        self.nodes.remove(&id);
        if let Some(portfolio) = node.portfolio() {
            if self.router.is_monitored(portfolio.id()) {
                self.router.remove_portfolio(portfolio.id())?;
            }
        }
        match from {
            Some(date) => node.strategy().remove_from(date)?,
            None => node.strategy().remove()?,
        }
        debug!("Strategy {} unregistered, {} cached valuations purged", id, purged);
        Ok(())
    }

    /// Drops edges pointing at a removed node from the parents that are
    /// still registered.
    fn detach_everywhere(&self, id: StrategyId) {
        let parents: Vec<Arc<TreeNode>> = self
            .nodes
            .iter()
            .filter(|n| n.value().has_child(id))
            .map(|n| n.value().clone())
            .collect();
        for parent in parents {
            if let Err(e) = self.remove_child(parent.id(), id) {
                debug!("Strategy {} already detached from {}: {}", id, parent.id(), e);
            }
        }
    }
}
