use crate::fees::FeeSchedule;
use serde::{Deserialize, Serialize};
use trading::{InstrumentId, PortfolioId, Routing, WILDCARD};

fn blank() -> String {
    " ".to_string()
}

/// Routing and fee configuration for a (portfolio, instrument) pair.
///
/// A `0` in either key position is the default for that level. Fees are
/// absolute currency amounts when positive and rates on price when
/// negative (see [`FeeSchedule`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(default)]
    pub portfolio: PortfolioId,
    #[serde(default)]
    pub instrument: InstrumentId,
    pub client: String,
    #[serde(default = "blank")]
    pub destination: String,
    #[serde(default = "blank")]
    pub account: String,
    #[serde(default)]
    pub execution_fee: f64,
    #[serde(default)]
    pub min_fee: f64,
    #[serde(default)]
    pub max_fee: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub min_size: f64,
    #[serde(default)]
    pub min_step: f64,
}

impl Instruction {
    /// Client name that defers routing to a broader cascade level.
    pub const INHERIT: &'static str = "Inherit";

    /// Built-in client filling orders against market data.
    pub const SIMULATOR: &'static str = "Simulator";

    pub fn new(portfolio: PortfolioId, instrument: InstrumentId, client: impl Into<String>) -> Self {
        Self {
            portfolio,
            instrument,
            client: client.into(),
            destination: blank(),
            account: blank(),
            execution_fee: 0.0,
            min_fee: 0.0,
            max_fee: 0.0,
            margin: 0.0,
            min_size: 0.0,
            min_step: 0.0,
        }
    }

    /// The zero-cost sentinel returned when nothing in the table matches.
    pub fn inherit() -> Self {
        Self::new(WILDCARD, WILDCARD, Self::INHERIT)
    }

    pub fn with_route(mut self, destination: impl Into<String>, account: impl Into<String>) -> Self {
        self.destination = destination.into();
        self.account = account.into();
        self
    }

    pub fn with_fees(mut self, execution_fee: f64, min_fee: f64, max_fee: f64) -> Self {
        self.execution_fee = execution_fee;
        self.min_fee = min_fee;
        self.max_fee = max_fee;
        self
    }

    pub fn with_sizes(mut self, min_size: f64, min_step: f64) -> Self {
        self.min_size = min_size;
        self.min_step = min_step;
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn key(&self) -> (PortfolioId, InstrumentId) {
        (self.portfolio, self.instrument)
    }

    pub fn is_inherit(&self) -> bool {
        self.client == Self::INHERIT
    }

    pub fn routing(&self) -> Routing {
        Routing::new(&self.client, &self.destination, &self.account)
    }

    pub fn fees(&self) -> FeeSchedule {
        FeeSchedule::new(self.execution_fee, self.min_fee, self.max_fee)
    }
}
