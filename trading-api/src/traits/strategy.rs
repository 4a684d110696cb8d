use crate::model::context::ExecutionContext;
use crate::model::gate::ExecutionGate;
use crate::model::identity::StrategyId;
use crate::model::instrument::FundingType;
use crate::traits::calendar::Calendar;
use crate::traits::portfolio::Portfolio;
use anyhow::Result;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Arc;

/// A node of the strategy hierarchy as seen by the scheduler and the router.
///
/// The scheduler owns the hierarchy; a strategy only knows its own logic,
/// valuation and ledger.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    fn name(&self) -> String;

    fn initial_date(&self) -> NaiveDateTime;

    fn final_date(&self) -> NaiveDateTime;

    fn funding(&self) -> FundingType;

    fn portfolio(&self) -> Option<Arc<dyn Portfolio>>;

    fn calendar(&self) -> Arc<dyn Calendar>;

    fn gate(&self) -> &ExecutionGate;

    fn is_initialized(&self) -> bool;

    fn is_simulating(&self) -> bool;

    fn initialize(&self) -> Result<()>;

    /// Context used when the strategy executes on its own calendar.
    fn execution_context(&self, date: NaiveDateTime) -> ExecutionContext {
        ExecutionContext::new(date, self.sod_aum(date))
    }

    fn execute_logic(&self, context: &ExecutionContext, force: bool) -> Result<()>;

    fn post_execute_logic(&self, date: NaiveDateTime) -> Result<()>;

    /// Computes and records the strategy's value at `date`.
    fn nav_calculation(&self, date: NaiveDateTime) -> Result<f64>;

    fn aum(&self, date: NaiveDateTime) -> f64;

    /// Start-of-day AUM; NaN when unknown.
    fn sod_aum(&self, date: NaiveDateTime) -> f64;

    /// Earliest recorded value, NaN when the strategy has no history.
    fn first_value(&self) -> f64;

    fn clear_memory(&self, date: NaiveDateTime);

    fn clear_next_aum_memory(&self, date: NaiveDateTime);

    fn startup(&self, date: NaiveDateTime, initial_value: f64) -> Result<()>;

    fn update_aum_order(&self, date: NaiveDateTime, value: f64) -> Result<()>;

    fn add_remove_sub_strategies(&self, date: NaiveDateTime) -> Result<()>;

    fn save(&self) -> Result<()>;

    fn remove(&self) -> Result<()>;

    fn remove_from(&self, date: NaiveDateTime) -> Result<()>;

    /// Copies the strategy for a new universe.
    ///
    /// # Arguments
    ///
    /// * `portfolio` - The already duplicated portfolio, if the strategy owns one.
    /// * `initial_date` / `final_date` - Active range of the copy.
    /// * `clones` - Copies made so far, keyed by original id.
    /// * `simulated` - Whether the copy runs in simulation mode.
    fn duplicate(
        &self,
        portfolio: Option<Arc<dyn Portfolio>>,
        initial_date: NaiveDateTime,
        final_date: NaiveDateTime,
        clones: &HashMap<StrategyId, Arc<dyn Strategy>>,
        simulated: bool,
    ) -> Result<Arc<dyn Strategy>>;
}
