//! Order-status notification fan-out.

use anyhow::Result;
use dashmap::DashMap;
use log::error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use trading::{OrderRecord, PortfolioId};

pub type UpdateCallback = Arc<dyn Fn(&OrderRecord) -> Result<()> + Send + Sync>;

pub type SubscriptionId = u64;

type Subscribers = Vec<(SubscriptionId, UpdateCallback)>;

/// Observers of order records, per master portfolio and global.
#[derive(Default)]
pub struct Notifier {
    by_portfolio: DashMap<PortfolioId, Subscribers>,
    global: RwLock<Subscribers>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for one master portfolio, or for every record
    /// when `portfolio` is `None`.
    pub fn add_update_event(
        &self,
        portfolio: Option<PortfolioId>,
        callback: UpdateCallback,
    ) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match portfolio {
            Some(portfolio) => self
                .by_portfolio
                .entry(portfolio)
                .or_default()
                .push((id, callback)),
            None => {
                if let Ok(mut global) = self.global.write() {
                    global.push((id, callback));
                }
            }
        }
        id
    }

    /// Drops every callback registered for `portfolio`.
    pub fn remove_update_event(&self, portfolio: PortfolioId) {
        self.by_portfolio.remove(&portfolio);
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        for mut entry in self.by_portfolio.iter_mut() {
            entry.value_mut().retain(|(id, _)| *id != subscription);
        }
        if let Ok(mut global) = self.global.write() {
            global.retain(|(id, _)| *id != subscription);
        }
    }

    /// Delivers `record` to the subscribers of its root portfolio, then to
    /// the global subscribers. Returns how many callbacks succeeded.
    pub fn update_record(&self, record: &OrderRecord) -> usize {
        let mut targets: Subscribers = self
            .by_portfolio
            .get(&record.root_portfolio_id)
            .map(|s| s.value().clone())
            .unwrap_or_default();
        if let Ok(global) = self.global.read() {
            targets.extend(global.iter().cloned());
        }

        targets
            .iter()
            .filter(|(id, callback)| {
                match catch_unwind(AssertUnwindSafe(|| callback(record))) {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        error!(
                            "Subscriber {} failed on order {}: {}",
                            id, record.order_id, e
                        );
                        false
                    }
                    Err(_) => {
                        error!("Subscriber {} panicked on order {}", id, record.order_id);
                        false
                    }
                }
            })
            .count()
    }
}
