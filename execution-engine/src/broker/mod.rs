//! Broker client contract.
//!
//! The router never talks to a broker itself. Broker gateways register a
//! named client with the destinations they serve and a [`Broker`] callback
//! receiving every order routed to that client.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use trading::Order;

pub mod recording;

pub trait Broker: Send + Sync {
    /// Called with the finalized order once it has been marked Submitted.
    ///
    /// # Arguments
    ///
    /// * `order` - The routed order, client/destination/account resolved.
    fn submit(&self, order: &Order) -> Result<()>;
}

impl<F> Broker for F
where
    F: Fn(&Order) -> Result<()> + Send + Sync,
{
    fn submit(&self, order: &Order) -> Result<()> {
        self(order)
    }
}

/// A named broker client.
#[derive(Clone)]
pub struct ClientConnection {
    name: String,
    destinations: Vec<String>,
    broker: Option<Arc<dyn Broker>>,
}

impl ClientConnection {
    /// Placeholder destination given to clients registered without any.
    pub const EMPTY_DESTINATION: &'static str = "Empty";

    pub fn new(
        name: impl Into<String>,
        destinations: Vec<String>,
        broker: Option<Arc<dyn Broker>>,
    ) -> Self {
        let destinations = if destinations.is_empty() {
            vec![Self::EMPTY_DESTINATION.to_string()]
        } else {
            destinations
        };
        Self {
            name: name.into(),
            destinations,
            broker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    pub fn broker(&self) -> Option<Arc<dyn Broker>> {
        self.broker.clone()
    }
}

impl fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConnection")
            .field("name", &self.name)
            .field("destinations", &self.destinations)
            .field("broker", &self.broker.is_some())
            .finish()
    }
}
