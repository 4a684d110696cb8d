use crate::model::identity::{InstrumentId, OrderId, PortfolioId};
use crate::model::order::{Order, OrderType, OrderUpdate};
use crate::model::position::{Position, ReserveLeg};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Order and position ledger of one strategy.
///
/// Portfolios form a tree mirroring the strategy hierarchy. The root of that
/// tree is the master portfolio, which is the unit the router keys routing,
/// fees and cost counters on.
pub trait Portfolio: Send + Sync {
    fn id(&self) -> PortfolioId;

    fn name(&self) -> String;

    /// The root of this portfolio's tree, `self.id()` for a root.
    fn master_id(&self) -> PortfolioId;

    fn currency(&self) -> String;

    /// Marked-to-market value of the whole portfolio tree, NaN when a held
    /// instrument has no price.
    fn value(&self, date: NaiveDateTime) -> f64;

    /// Sibling portfolio absorbing rounding remainders of this portfolio's
    /// orders.
    fn residual(&self) -> Option<Arc<dyn Portfolio>>;

    fn set_residual(&self, residual: Option<Arc<dyn Portfolio>>);

    fn set_parent(&self, parent: Option<&Arc<dyn Portfolio>>);

    fn add_sub_portfolio(&self, child: Arc<dyn Portfolio>);

    fn remove_sub_portfolio(&self, id: PortfolioId);

    /// Finds a descendant portfolio by id.
    fn sub_portfolio(&self, id: PortfolioId) -> Option<Arc<dyn Portfolio>>;

    /// Orders stamped on the calendar day of `date`, including those of all
    /// sub-portfolios when `aggregated` is set.
    fn open_orders(&self, date: NaiveDateTime, aggregated: bool) -> Vec<Order>;

    /// Applies a status transition to an order anywhere in this portfolio's
    /// tree.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The order moved forward.
    /// * `Ok(false)` - The transition was not a forward move and was ignored.
    /// * `Err` - No such order.
    fn update_order(&self, id: OrderId, update: &OrderUpdate) -> Result<bool>;

    fn create_order(
        &self,
        instrument: InstrumentId,
        date: NaiveDateTime,
        unit: f64,
        order_type: OrderType,
        limit: f64,
    ) -> Result<Order>;

    /// Units held in `instrument`, across sub-portfolios when `aggregated`.
    fn position_unit(&self, instrument: InstrumentId, date: NaiveDateTime, aggregated: bool)
    -> f64;

    fn clear_orders(&self, date: NaiveDateTime);

    /// Absorbs executed orders into positions.
    fn book_orders(&self, date: NaiveDateTime) -> Result<Vec<Position>>;

    fn manage_corporate_actions(&self, date: NaiveDateTime) -> Result<()>;

    fn margin_futures(&self, date: NaiveDateTime) -> Result<()>;

    fn update_positions(&self, date: NaiveDateTime) -> Result<()>;

    fn update_reserve_position(&self, date: NaiveDateTime, value: f64, currency: &str)
    -> Result<()>;

    fn can_save(&self) -> bool;

    fn set_can_save(&self, can_save: bool);

    fn save_new_positions(&self) -> Result<()>;

    fn reserves(&self) -> Vec<ReserveLeg>;

    fn add_reserve(&self, leg: ReserveLeg);

    /// Copies the portfolio, its positions and reserve legs into a new,
    /// unlinked portfolio.
    fn duplicate(&self, simulated: bool) -> Result<Arc<dyn Portfolio>>;
}
