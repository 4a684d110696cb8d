use super::TreeScheduler;
use crate::error::{Result, TreeError};
use crate::node::TreeNode;
use chrono::NaiveDateTime;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError};
use trading::{DateSearch, Portfolio, ReserveLeg, Strategy, StrategyId};

/// Copies made during one clone, keyed by original id, with the value each
/// copy starts from.
#[derive(Default)]
struct CloneState {
    clones: HashMap<StrategyId, Arc<dyn Strategy>>,
    seeds: HashMap<StrategyId, f64>,
}

impl TreeScheduler {
    /// Copies the tree rooted at `id` into an independent universe active
    /// between `initial_date` and `final_date`.
    ///
    /// Portfolios, positions, reserve legs and the residual designation are
    /// copied along. Every copy is then started on the business day before
    /// `initial_date`, from the value its original holds now.
    ///
    /// # Returns
    ///
    /// The registered root of the copy.
    pub fn clone_tree(
        &self,
        id: StrategyId,
        initial_date: NaiveDateTime,
        final_date: NaiveDateTime,
        simulated: bool,
    ) -> Result<Arc<TreeNode>> {
        let _cloning = self.cloning.lock().unwrap_or_else(PoisonError::into_inner);
        let node = self.require(id)?;
        if node.portfolio().is_none() {
            return Err(TreeError::NotCloneable(id));
        }

        let mut state = CloneState::default();
        let root = self.clone_node(&node, initial_date, final_date, simulated, &mut state)?;
        let start = root
            .strategy()
            .calendar()
            .closest_business_day(initial_date, DateSearch::Previous);
        self.startup(&root, start, &state.seeds, &mut HashSet::new())?;
        info!(
            "Strategy {} cloned into {} ({} strategies) from {}",
            id,
            root.id(),
            state.clones.len(),
            start
        );
        Ok(root)
    }

    fn clone_node(
        &self,
        node: &Arc<TreeNode>,
        initial_date: NaiveDateTime,
        final_date: NaiveDateTime,
        simulated: bool,
        state: &mut CloneState,
    ) -> Result<Arc<TreeNode>> {
        if let Some(done) = state.clones.get(&node.id()) {
            return Ok(self.get_or_create(done.clone()));
        }

        let mut copies = Vec::new();
        for child in self.child_nodes(node) {
            let copy = if child.portfolio().is_some() {
                self.clone_node(&child, initial_date, final_date, simulated, state)?
            } else if let Some(done) = state.clones.get(&child.id()) {
                self.get_or_create(done.clone())
            } else {
                let original = child.strategy();
                let copy = original.duplicate(None, initial_date, final_date, &state.clones, simulated)?;
                state.seeds.insert(copy.id(), original.first_value());
                state.clones.insert(child.id(), copy.clone());
                self.get_or_create(copy)
            };
            copies.push((copy, child.is_residual()));
        }

        let original = node.strategy();
        let portfolio = original
            .portfolio()
            .ok_or(TreeError::NotCloneable(node.id()))?;
        let portfolio_copy = portfolio.duplicate(simulated)?;
        copy_reserves(portfolio.as_ref(), portfolio_copy.as_ref(), &state.clones);

        let copy = original.duplicate(
            Some(portfolio_copy),
            initial_date,
            final_date,
            &state.clones,
            simulated,
        )?;
        state.seeds.insert(copy.id(), self.seed_value(original.as_ref()));
        state.clones.insert(node.id(), copy.clone());
        let copy_node = self.get_or_create(copy);

        for (child, residual) in copies {
            self.attach(&copy_node, &child);
            if residual {
                self.designate_residual(&copy_node, &child);
            }
        }
        debug!("Strategy {} copied as {}", node.id(), copy_node.id());
        Ok(copy_node)
    }

    /// Current value of `strategy`, falling back to its last recorded one.
    fn seed_value(&self, strategy: &dyn Strategy) -> f64 {
        let now = self.clock.now();
        let value = strategy.aum(now);
        if !value.is_nan() {
            return value;
        }
        let previous = strategy.sod_aum(now);
        if previous.is_nan() {
            0.0
        } else {
            previous
        }
    }

    fn startup(
        &self,
        node: &Arc<TreeNode>,
        date: NaiveDateTime,
        seeds: &HashMap<StrategyId, f64>,
        started: &mut HashSet<StrategyId>,
    ) -> Result<()> {
        if !started.insert(node.id()) {
            return Ok(());
        }
        for child in self.child_nodes(node) {
            self.startup(&child, date, seeds, started)?;
        }
        let strategy = node.strategy();
        let seed = seeds.get(&node.id()).copied().unwrap_or(0.0);
        strategy.startup(date, seed.abs())?;
        if seed < 0.0 {
            strategy.update_aum_order(date, seed)?;
        }
        Ok(())
    }
}

/// Carries reserve legs over, pointing legs held in cloned strategies at
/// their copies.
fn copy_reserves(
    from: &dyn Portfolio,
    to: &dyn Portfolio,
    clones: &HashMap<StrategyId, Arc<dyn Strategy>>,
) {
    let remap = |id: StrategyId| clones.get(&id).map(|c| c.id()).unwrap_or(id);
    for leg in from.reserves() {
        to.add_reserve(ReserveLeg::new(leg.currency, remap(leg.long), remap(leg.short)));
    }
}
