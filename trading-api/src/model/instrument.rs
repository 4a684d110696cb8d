//! Defines the data models for tradable instruments.
//!
//! Instruments are described by a tagged [`InstrumentKind`] rather than a
//! type hierarchy; anything the router needs to know about a kind is exposed
//! as a capability method on the enum.

use super::identity::InstrumentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstrumentKind {
    Equity,
    Etf,
    Fund,
    Index,
    Commodity,
    Cash,
    /// A strategy traded as an instrument of its parent.
    Strategy { portfolio: bool },
    Future { underlying: InstrumentId },
    Option { underlying: InstrumentId },
    SpreadBet { underlying: InstrumentId },
}

impl InstrumentKind {
    /// The underlying instrument of a derivative, used by the instruction
    /// cascade to fall back from a contract to its root.
    pub fn underlying(&self) -> Option<InstrumentId> {
        match self {
            InstrumentKind::Future { underlying }
            | InstrumentKind::Option { underlying }
            | InstrumentKind::SpreadBet { underlying } => Some(*underlying),
            _ => None,
        }
    }

    pub fn is_derivative(&self) -> bool {
        self.underlying().is_some()
    }

    /// Whether simulated fills of this kind pay execution fees.
    pub fn charges_execution_fees(&self) -> bool {
        !matches!(
            self,
            InstrumentKind::Cash | InstrumentKind::Option { .. }
        )
    }

    /// Strategies with their own portfolio are netted through their
    /// sub-portfolio, never through a position held by the parent.
    pub fn owns_portfolio(&self) -> bool {
        matches!(self, InstrumentKind::Strategy { portfolio: true })
    }
}

/// Static description of an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentInfo {
    id: InstrumentId,
    name: String,
    kind: InstrumentKind,
    currency: String,
    point_size: f64,
}

impl InstrumentInfo {
    pub fn new(
        id: InstrumentId,
        name: impl Into<String>,
        kind: InstrumentKind,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            currency: currency.into(),
            point_size: 1.0,
        }
    }

    pub fn with_point_size(mut self, point_size: f64) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn id(&self) -> InstrumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn point_size(&self) -> f64 {
        self.point_size
    }
}

/// How a strategy is financed, which decides whether a portfolio-less node
/// needs its own valuation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundingType {
    TotalReturn,
    #[default]
    Na,
    ExcessReturn,
}

/// Time-series field of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesField {
    Last,
    Bid,
    Ask,
    Volume,
}

/// Roll convention applied to a time-series lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollType {
    /// Only a value stamped on the requested day.
    Exact,
    /// The latest value stamped on or before the requested day.
    Last,
}
