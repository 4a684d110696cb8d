//! Shared vocabulary of the execution core.
//!
//! `model` holds the plain data exchanged between the market router and the
//! strategy tree, `traits` the collaborator contracts both of them consume,
//! and `memory` an in-process implementation of those contracts used by the
//! simulations and the test suites.

pub mod memory;
pub mod model;
pub mod traits;

pub use model::cash::CashUpdateMessage;
pub use model::context::ExecutionContext;
pub use model::gate::{ExecutionGate, GateGuard};
pub use model::identity::{InstrumentId, OrderId, PortfolioId, StrategyId, WILDCARD};
pub use model::instrument::{FundingType, InstrumentInfo, InstrumentKind, RollType, SeriesField};
pub use model::order::{Order, OrderStatus, OrderType, OrderUpdate, Routing, Side};
pub use model::position::{Position, ReserveLeg};
pub use model::record::OrderRecord;
pub use traits::calendar::{Calendar, DateSearch};
pub use traits::clock::{Clock, SystemClock};
pub use traits::market_data::MarketData;
pub use traits::portfolio::Portfolio;
pub use traits::strategy::Strategy;

pub mod prelude {
    pub use crate::model::identity::{InstrumentId, PortfolioId, StrategyId};
    pub use crate::model::order::{Order, OrderStatus, OrderType};
    pub use crate::traits::calendar::Calendar;
    pub use crate::traits::market_data::MarketData;
    pub use crate::traits::portfolio::Portfolio;
    pub use crate::traits::strategy::Strategy;
}
