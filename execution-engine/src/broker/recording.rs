use super::Broker;
use anyhow::{anyhow, Result};
use std::sync::Mutex;
use trading::Order;

/// Broker that keeps every order it receives. Paper sessions use it as a
/// sink; tests use it to observe dispatch.
#[derive(Debug, Default)]
pub struct RecordingBroker {
    orders: Mutex<Vec<Order>>,
    reject: bool,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker whose every submission fails.
    pub fn rejecting() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl Broker for RecordingBroker {
    fn submit(&self, order: &Order) -> Result<()> {
        if self.reject {
            return Err(anyhow!("order {} rejected by broker", order.id()));
        }
        self.orders
            .lock()
            .map_err(|_| anyhow!("recording broker poisoned"))?
            .push(order.clone());
        Ok(())
    }
}
