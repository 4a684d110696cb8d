//! The tree scheduler.
//!
//! [`TreeScheduler`] owns the strategy hierarchy as an id-indexed graph of
//! [`TreeNode`]s and sequences valuation, logic, order submission and
//! persistence over it. It shares the market router with the rest of the
//! process and registers itself as the router's [`TreeHost`].

mod clone;
mod logic;
mod process;
mod valuation;
mod walks;

use crate::cache::NavCache;
use crate::config::SchedulerConfig;
use crate::error::{Result, TreeError};
use crate::node::TreeNode;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use execution_engine::{MarketRouter, TreeHost};
use log::{debug, error, info};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use trading::{Clock, Portfolio, Strategy, StrategyId};

pub struct TreeScheduler {
    config: SchedulerConfig,
    router: Arc<MarketRouter>,
    clock: Arc<dyn Clock>,
    nodes: DashMap<StrategyId, Arc<TreeNode>>,
    nav_cache: NavCache,
    // Serializes edits of the hierarchy so cycle checks see a stable graph.
    structure: Mutex<()>,
    cloning: Mutex<()>,
}

impl TreeScheduler {
    /// Builds the scheduler and attaches it to `router` as its tree host.
    pub fn new(
        config: SchedulerConfig,
        router: Arc<MarketRouter>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            config,
            router,
            clock,
            nodes: DashMap::new(),
            nav_cache: NavCache::new(),
            structure: Mutex::new(()),
            cloning: Mutex::new(()),
        });
        let weak: Weak<TreeScheduler> = Arc::downgrade(&scheduler);
        let host: Weak<dyn TreeHost> = weak;
        scheduler.router.attach_host(host);
        info!(
            "Tree scheduler ready, tick offset {} ms",
            scheduler.config.tick_offset().num_milliseconds()
        );
        scheduler
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<MarketRouter> {
        &self.router
    }

    pub fn nav_cache(&self) -> &NavCache {
        &self.nav_cache
    }

    /// The node of `strategy`, registering it on first access. Concurrent
    /// first calls for the same id all get the same node.
    pub fn get_or_create(&self, strategy: Arc<dyn Strategy>) -> Arc<TreeNode> {
        let id = strategy.id();
        self.nodes
            .entry(id)
            .or_insert_with(|| {
                debug!("Strategy {} registered", id);
                Arc::new(TreeNode::new(strategy))
            })
            .value()
            .clone()
    }

    pub fn node(&self, id: StrategyId) -> Option<Arc<TreeNode>> {
        self.nodes.get(&id).map(|n| n.value().clone())
    }

    pub fn contains(&self, id: StrategyId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn children(&self, id: StrategyId) -> Vec<StrategyId> {
        self.node(id).map(|n| n.children()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn require(&self, id: StrategyId) -> Result<Arc<TreeNode>> {
        self.node(id).ok_or(TreeError::UnknownStrategy(id))
    }

    /// Registered child nodes of `node`, in attachment order.
    pub(crate) fn child_nodes(&self, node: &TreeNode) -> Vec<Arc<TreeNode>> {
        node.children()
            .into_iter()
            .filter_map(|id| self.node(id))
            .collect()
    }

    /// Attaches `child` under the registered strategy `parent` and
    /// initializes it.
    ///
    /// Rejected with [`TreeError::Cycle`] when `child` already contains
    /// `parent`, in which case nothing changes.
    pub fn add_child(&self, parent: StrategyId, child: Arc<dyn Strategy>) -> Result<Arc<TreeNode>> {
        let _structure = self.structure.lock().unwrap_or_else(PoisonError::into_inner);
        self.attach_child(parent, child)
    }

    /// Caller holds the structure lock.
    fn attach_child(&self, parent: StrategyId, child: Arc<dyn Strategy>) -> Result<Arc<TreeNode>> {
        let parent_node = self.require(parent)?;
        let child_id = child.id();
        if child_id == parent || self.reaches(child_id, parent) {
            return Err(TreeError::Cycle {
                parent,
                child: child_id,
            });
        }
        child.initialize()?;
        let child_node = self.get_or_create(child);
        self.attach(&parent_node, &child_node);
        Ok(child_node)
    }

    /// Detaches `child` from `parent`. The child stays registered.
    pub fn remove_child(&self, parent: StrategyId, child: StrategyId) -> Result<()> {
        let _structure = self.structure.lock().unwrap_or_else(PoisonError::into_inner);
        let parent_node = self.require(parent)?;
        if !parent_node.remove_child(child) {
            return Err(TreeError::NotAChild { parent, child });
        }
        if let Some(child_node) = self.node(child) {
            self.unlink_portfolios(&parent_node, &child_node);
        }
        debug!("Strategy {} detached from {}", child, parent);
        Ok(())
    }

    /// Designates `child` as the residual strategy of `parent`, attaching
    /// it first when needed.
    pub fn set_residual(&self, parent: StrategyId, child: Arc<dyn Strategy>) -> Result<()> {
        let child_id = child.id();
        if child.portfolio().is_none() {
            return Err(TreeError::NoPortfolio(child_id));
        }
        let _structure = self.structure.lock().unwrap_or_else(PoisonError::into_inner);
        let parent_node = self.require(parent)?;
        let child_node = if parent_node.has_child(child_id) {
            self.require(child_id)?
        } else {
            self.attach_child(parent, child)?
        };
        self.designate_residual(&parent_node, &child_node);
        info!("Strategy {} is the residual of {}", child_id, parent);
        Ok(())
    }

    /// Whether `target` is `from` or one of its descendants.
    fn reaches(&self, from: StrategyId, target: StrategyId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.node(id) {
                stack.extend(node.children());
            }
        }
        false
    }

    /// Links the edge and the portfolios under it.
    pub(crate) fn attach(&self, parent: &TreeNode, child: &TreeNode) {
        if !parent.insert_child(child.id()) {
            return;
        }
        if let (Some(pp), Some(cp)) = (parent.portfolio(), child.portfolio()) {
            cp.set_parent(Some(&pp));
            pp.add_sub_portfolio(cp.clone());
            let residual = parent
                .residual()
                .and_then(|id| self.node(id))
                .and_then(|n| n.portfolio());
            if let Some(residual) = residual {
                cp.set_residual(Some(residual));
            }
        }
        debug!("Strategy {} attached under {}", child.id(), parent.id());
    }

    pub(crate) fn designate_residual(&self, parent: &TreeNode, child: &TreeNode) {
        child.mark_residual(true);
        parent.set_residual(Some(child.id()));
        let Some(residual) = child.portfolio() else {
            return;
        };
        if let Some(pp) = parent.portfolio() {
            pp.set_residual(Some(residual.clone()));
        }
        for sibling in self.child_nodes(parent) {
            if sibling.id() == child.id() {
                continue;
            }
            if let Some(sp) = sibling.portfolio() {
                sp.set_residual(Some(residual.clone()));
            }
        }
    }

    fn unlink_portfolios(&self, parent: &TreeNode, child: &TreeNode) {
        if child.is_residual() && parent.residual().is_none() {
            child.mark_residual(false);
            if let Some(pp) = parent.portfolio() {
                pp.set_residual(None);
            }
            for sibling in self.child_nodes(parent) {
                if let Some(sp) = sibling.portfolio() {
                    sp.set_residual(None);
                }
            }
        }
        if let (Some(pp), Some(cp)) = (parent.portfolio(), child.portfolio()) {
            pp.remove_sub_portfolio(cp.id());
            cp.set_parent(None);
        }
    }

    /// Runs `work` on every node concurrently. A failing or panicking
    /// branch is logged and does not stop its siblings.
    ///
    /// # Returns
    ///
    /// The results of the branches that succeeded.
    pub(crate) fn fork<T, F>(&self, nodes: &[Arc<TreeNode>], stage: &str, work: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Arc<TreeNode>) -> Result<T> + Sync + Send,
    {
        nodes
            .par_iter()
            .filter_map(|node| isolate(stage, node.id(), || work(node)))
            .collect()
    }
}

impl fmt::Debug for TreeScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeScheduler")
            .field("nodes", &self.nodes.len())
            .field("cached_valuations", &self.nav_cache.len())
            .finish()
    }
}

impl TreeHost for TreeScheduler {
    fn book_tree(&self, strategy: StrategyId, date: NaiveDateTime) -> anyhow::Result<usize> {
        let node = self.require(strategy)?;
        Ok(self.book_orders_node(&node, date)?)
    }

    fn revalue(&self, strategy: StrategyId, date: NaiveDateTime) -> anyhow::Result<()> {
        let node = self.require(strategy)?;
        self.nav(&node, date)?;
        self.save_node(&node)?;
        self.save_new_positions_node(&node)?;
        Ok(())
    }

    fn update_positions(&self, strategy: StrategyId, date: NaiveDateTime) -> anyhow::Result<()> {
        let node = self.require(strategy)?;
        Ok(self.update_positions_node(&node, date)?)
    }
}

fn isolate<T>(stage: &str, id: StrategyId, work: impl FnOnce() -> Result<T>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!("{} of strategy {} failed: {}", stage, id, e);
            None
        }
        Err(_) => {
            error!("{} of strategy {} panicked", stage, id);
            None
        }
    }
}

/// Keeps a portfolio from persisting for as long as it lives.
pub(crate) struct SaveSuspension {
    portfolio: Arc<dyn Portfolio>,
    previous: bool,
}

impl SaveSuspension {
    pub(crate) fn new(portfolio: Arc<dyn Portfolio>) -> Self {
        let previous = portfolio.can_save();
        portfolio.set_can_save(false);
        Self {
            portfolio,
            previous,
        }
    }
}

impl Drop for SaveSuspension {
    fn drop(&mut self) {
        self.portfolio.set_can_save(self.previous);
    }
}
