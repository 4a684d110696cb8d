//! Identifiers shared by strategies, portfolios and instruments.

use uuid::Uuid;

/// Identity of a strategy. Strategies are instruments too, so the value
/// space is shared with [`InstrumentId`].
pub type StrategyId = u64;

pub type PortfolioId = u64;

pub type InstrumentId = u64;

pub type OrderId = Uuid;

/// Id `0` at either level of an instruction key means "default for this
/// level".
pub const WILDCARD: u64 = 0;
