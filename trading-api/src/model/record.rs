use super::identity::{OrderId, PortfolioId};
use super::order::{Order, OrderStatus, OrderType, Side};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Snapshot of an order published to observers whenever its status changes.
///
/// Records are denormalized copies kept for notification only; the owning
/// ledger stays authoritative for the order itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub time: NaiveTime,
    pub order_id: OrderId,
    pub name: String,
    pub side: Side,
    pub order_type: OrderType,
    /// Absolute number of units.
    pub unit: f64,
    /// Limit price while working, fill price once executed.
    pub price: f64,
    pub status: OrderStatus,
    pub root_portfolio_id: PortfolioId,
    pub root_portfolio_name: String,
    pub parent_portfolio_id: PortfolioId,
}

impl OrderRecord {
    pub fn from_order(
        order: &Order,
        name: impl Into<String>,
        root_portfolio_id: PortfolioId,
        root_portfolio_name: impl Into<String>,
    ) -> Self {
        Self {
            time: order.date().time(),
            order_id: order.id(),
            name: name.into(),
            side: order.side(),
            order_type: order.order_type(),
            unit: order.unit().abs(),
            price: order.limit(),
            status: OrderStatus::New,
            root_portfolio_id,
            root_portfolio_name: root_portfolio_name.into(),
            parent_portfolio_id: order.portfolio_id(),
        }
    }

    pub fn mark_executed(&mut self, price: f64) {
        self.price = price;
        self.status = OrderStatus::Executed;
    }
}
