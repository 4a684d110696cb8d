use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use trading::{FundingType, Portfolio, Strategy, StrategyId};

/// Scheduler-side wrapper of one strategy.
///
/// Holds the hierarchy edges as ids into the scheduler's registry; the
/// strategy itself never sees its children.
pub struct TreeNode {
    strategy: Arc<dyn Strategy>,
    children: RwLock<Vec<StrategyId>>,
    residual: RwLock<Option<StrategyId>>,
    is_residual: AtomicBool,
}

impl TreeNode {
    pub(crate) fn new(strategy: Arc<dyn Strategy>) -> Self {
        Self {
            strategy,
            children: RwLock::new(Vec::new()),
            residual: RwLock::new(None),
            is_residual: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> StrategyId {
        self.strategy.id()
    }

    pub fn strategy(&self) -> &Arc<dyn Strategy> {
        &self.strategy
    }

    pub fn portfolio(&self) -> Option<Arc<dyn Portfolio>> {
        self.strategy.portfolio()
    }

    /// Child ids in attachment order.
    pub fn children(&self) -> Vec<StrategyId> {
        self.children.read().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn has_child(&self, id: StrategyId) -> bool {
        self.children
            .read()
            .map(|c| c.contains(&id))
            .unwrap_or(false)
    }

    /// The child absorbing rounding remainders, if one is designated.
    pub fn residual(&self) -> Option<StrategyId> {
        self.residual.read().ok().and_then(|r| *r)
    }

    pub fn is_residual(&self) -> bool {
        self.is_residual.load(Ordering::Acquire)
    }

    pub(crate) fn insert_child(&self, id: StrategyId) -> bool {
        match self.children.write() {
            Ok(mut children) if !children.contains(&id) => {
                children.push(id);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove_child(&self, id: StrategyId) -> bool {
        let removed = match self.children.write() {
            Ok(mut children) => {
                let before = children.len();
                children.retain(|c| *c != id);
                children.len() != before
            }
            Err(_) => false,
        };
        if removed && self.residual() == Some(id) {
            self.set_residual(None);
        }
        removed
    }

    pub(crate) fn set_residual(&self, id: Option<StrategyId>) {
        if let Ok(mut slot) = self.residual.write() {
            *slot = id;
        }
    }

    pub(crate) fn mark_residual(&self, residual: bool) {
        self.is_residual.store(residual, Ordering::Release);
    }

    /// Whether the strategy trades on the execution date of `date`.
    pub(crate) fn runs_logic_on(&self, date: NaiveDateTime) -> bool {
        let next_day = date.checked_add_signed(Duration::days(1)).unwrap_or(date);
        self.strategy.initial_date() <= date
            && self.strategy.final_date() >= next_day
            && self.strategy.portfolio().is_some()
            && !self.is_residual()
    }

    pub(crate) fn is_active(&self, date: NaiveDateTime) -> bool {
        self.strategy.initial_date() <= date && date <= self.strategy.final_date()
    }

    /// Whether the node is valued on its own during a NAV pass on `date`.
    pub(crate) fn is_valued_on(&self, date: NaiveDateTime) -> bool {
        self.is_active(date)
            && (self.strategy.portfolio().is_some()
                || self.strategy.funding() != FundingType::TotalReturn)
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("id", &self.id())
            .field("children", &self.children())
            .field("residual", &self.residual())
            .field("is_residual", &self.is_residual())
            .finish()
    }
}
