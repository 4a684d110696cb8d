use super::{isolate, MarketRouter, Monitored};
use crate::error::{Result, RouterError};
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use trading::CashUpdateMessage;

pub(super) enum Signal {
    /// New cash messages are waiting.
    Wake,
    Stop,
}

pub(super) struct Worker {
    sender: Sender<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl MarketRouter {
    /// Starts the background tick thread. Calling it again while the
    /// thread runs does nothing.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }
        let (sender, receiver) = mpsc::channel();
        let router = Arc::downgrade(self);
        let interval = self.config.tick_interval();
        let handle = thread::Builder::new()
            .name("market-router".to_string())
            .spawn(move || run(router, receiver, interval))
            .map_err(|e| RouterError::Collaborator(e.into()))?;
        *slot = Some(Worker {
            sender,
            handle: Some(handle),
        });
        info!("Market router worker started, ticking every {:?}", interval);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .map(|w| w.is_some())
            .unwrap_or(false)
    }

    /// Stops and joins the background thread. Safe to call repeatedly.
    pub fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut worker) = worker else {
            return;
        };
        let _ = worker.sender.send(Signal::Stop);
        if let Some(handle) = worker.handle.take() {
            // The last handle on the router may be dropped by the worker
            // itself; it exits on its own once the router is gone.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("Market router worker panicked");
            }
        }
        info!("Market router worker stopped");
    }

    /// Queues a cash movement for the next tick and wakes the worker.
    pub fn enqueue_cash(&self, message: CashUpdateMessage) {
        self.pending_cash
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(message);
        if let Ok(worker) = self.worker.lock() {
            if let Some(worker) = worker.as_ref() {
                let _ = worker.sender.send(Signal::Wake);
            }
        }
    }

    pub fn pending_cash(&self) -> usize {
        self.pending_cash
            .lock()
            .map(|q| q.len())
            .unwrap_or(0)
    }

    /// One full background tick: pending cash first, then live booking.
    pub fn tick(&self) -> usize {
        self.drain_cash();
        self.book_orders(self.clock.now())
    }

    /// Applies pending cash messages whose master strategy is idle.
    ///
    /// Messages for an executing strategy go back to the front of the queue
    /// in their original order, together with every later message for the
    /// same master. Messages for unmonitored portfolios are dropped.
    ///
    /// # Returns
    ///
    /// The number of messages applied.
    pub fn drain_cash(&self) -> usize {
        let batch: Vec<CashUpdateMessage> = self
            .pending_cash
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if batch.is_empty() {
            return 0;
        }

        let now = self.clock.now();
        let mut busy = HashSet::new();
        let mut deferred = Vec::new();
        let mut applied = 0;
        for message in batch {
            let master_id = message.portfolio().master_id();
            if busy.contains(&master_id) {
                deferred.push(message);
                continue;
            }
            let Some(monitored) = self.monitored(master_id) else {
                warn!(
                    "Dropping cash update for portfolio {}: master {} is not monitored",
                    message.portfolio().id(),
                    master_id
                );
                continue;
            };
            let Some(_gate) = monitored.strategy.gate().try_enter() else {
                busy.insert(master_id);
                deferred.push(message);
                continue;
            };
            let outcome = isolate(
                format!("Cash update of portfolio {}", message.portfolio().id()),
                || self.apply_cash(&monitored, &message, now),
            );
            if outcome.is_some() {
                applied += 1;
            }
        }

        if !deferred.is_empty() {
            debug!("{} cash updates deferred to the next tick", deferred.len());
            let mut queue = self
                .pending_cash
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for message in deferred.into_iter().rev() {
                queue.push_front(message);
            }
        }
        applied
    }

    fn apply_cash(
        &self,
        monitored: &Monitored,
        message: &CashUpdateMessage,
        now: NaiveDateTime,
    ) -> anyhow::Result<()> {
        match self.host() {
            Some(host) => host.update_positions(monitored.strategy.id(), now)?,
            None => monitored.portfolio.update_positions(now)?,
        }
        message
            .portfolio()
            .update_reserve_position(now, message.value(), message.currency())
    }
}

fn run(router: Weak<MarketRouter>, receiver: Receiver<Signal>, interval: Duration) {
    let mut next_tick = Instant::now() + interval;
    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(wait) {
            Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(Signal::Wake) | Err(RecvTimeoutError::Timeout) => {}
        }
        let Some(router) = router.upgrade() else {
            break;
        };
        // Wakes never push the booking deadline back.
        let full_tick = Instant::now() >= next_tick;
        isolate("Market router tick", || {
            if full_tick {
                router.tick();
            } else {
                router.drain_cash();
            }
            Ok(())
        });
        if full_tick {
            next_tick += interval;
            let now = Instant::now();
            if next_tick < now {
                next_tick = now + interval;
            }
        }
    }
    debug!("Market router worker exiting");
}
