use super::identity::{InstrumentId, OrderId, PortfolioId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Lifecycle of an order: `New -> Submitted -> {Executed | NotExecuted}`.
///
/// A zero-unit order may jump from `New` straight to `Executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Submitted,
    Executed,
    NotExecuted,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Executed | OrderStatus::NotExecuted)
    }

    /// Whether moving from `self` to `next` is a forward transition.
    /// Staying in the same state is not a transition.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::New, OrderStatus::New) => false,
            (OrderStatus::New, _) => true,
            (OrderStatus::Submitted, s) => s.is_terminal(),
            _ => false,
        }
    }
}

/// Broker routing assigned to an order when it is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    pub client: String,
    pub destination: String,
    pub account: String,
}

impl Routing {
    pub fn new(
        client: impl Into<String>,
        destination: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            client: client.into(),
            destination: destination.into(),
            account: account.into(),
        }
    }
}

/// An instruction to change a position, created by a portfolio ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    portfolio_id: PortfolioId,
    instrument: InstrumentId,
    date: NaiveDateTime,
    unit: f64,
    order_type: OrderType,
    limit: f64,
    client: String,
    destination: String,
    account: String,
    status: OrderStatus,
    execution_level: f64,
    execution_date: Option<NaiveDateTime>,
}

impl Order {
    pub fn new(
        portfolio_id: PortfolioId,
        instrument: InstrumentId,
        date: NaiveDateTime,
        unit: f64,
        order_type: OrderType,
        limit: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            portfolio_id,
            instrument,
            date,
            unit,
            order_type,
            limit,
            client: String::new(),
            destination: String::new(),
            account: String::new(),
            status: OrderStatus::New,
            execution_level: f64::NAN,
            execution_date: None,
        }
    }

    /// Pre-assigns a client, e.g. for orders a strategy wants routed to a
    /// specific broker regardless of the instruction table.
    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.client = routing.client;
        self.destination = routing.destination;
        self.account = routing.account;
        self
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn portfolio_id(&self) -> PortfolioId {
        self.portfolio_id
    }

    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn unit(&self) -> f64 {
        self.unit
    }

    pub fn side(&self) -> Side {
        if self.unit < 0.0 { Side::Short } else { Side::Long }
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn routing(&self) -> Routing {
        Routing::new(&self.client, &self.destination, &self.account)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn execution_level(&self) -> f64 {
        self.execution_level
    }

    pub fn execution_date(&self) -> Option<NaiveDateTime> {
        self.execution_date
    }

    /// Applies a status transition. Returns `false` and leaves the order
    /// untouched when the transition is not a forward move.
    pub fn apply(&mut self, update: &OrderUpdate) -> bool {
        if !self.status.can_advance_to(update.status) {
            return false;
        }
        self.status = update.status;
        if update.execution_level.is_finite() {
            self.execution_level = update.execution_level;
        }
        if update.execution_date.is_some() {
            self.execution_date = update.execution_date;
        }
        if let Some(routing) = &update.routing {
            self.client = routing.client.clone();
            self.destination = routing.destination.clone();
            self.account = routing.account.clone();
        }
        true
    }
}

/// A requested status transition handed to the owning ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: OrderStatus,
    pub execution_level: f64,
    pub execution_date: Option<NaiveDateTime>,
    pub routing: Option<Routing>,
}

impl OrderUpdate {
    pub fn submitted() -> Self {
        Self {
            status: OrderStatus::Submitted,
            execution_level: f64::NAN,
            execution_date: None,
            routing: None,
        }
    }

    pub fn executed(level: f64, date: NaiveDateTime) -> Self {
        Self {
            status: OrderStatus::Executed,
            execution_level: level,
            execution_date: Some(date),
            routing: None,
        }
    }

    pub fn not_executed(date: NaiveDateTime) -> Self {
        Self {
            status: OrderStatus::NotExecuted,
            execution_level: f64::NAN,
            execution_date: Some(date),
            routing: None,
        }
    }

    pub fn with_routing(mut self, routing: Routing) -> Self {
        self.routing = Some(routing);
        self
    }
}
