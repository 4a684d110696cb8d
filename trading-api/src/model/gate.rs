//! Per-strategy execution gate.
//!
//! Every strategy owns one non-reentrant exclusive lock guarding its
//! logic-execution critical section, paired with the `Executing` flag other
//! components read without taking the lock. Callers never wait on the gate:
//! [`ExecutionGate::try_enter`] either hands back a guard or `None`, and a
//! busy gate means "skip and retry later".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};

#[derive(Debug, Default)]
pub struct ExecutionGate {
    lock: Mutex<()>,
    executing: AtomicBool,
}

impl ExecutionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::Acquire)
    }

    /// Acquires the gate without blocking. The `Executing` flag is raised
    /// for as long as the returned guard lives.
    pub fn try_enter(&self) -> Option<GateGuard<'_>> {
        let guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            // A panic inside a previous critical section leaves nothing
            // half-written behind the unit lock.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        self.executing.store(true, Ordering::Release);
        Some(GateGuard {
            _lock: guard,
            executing: &self.executing,
        })
    }
}

/// Holds an [`ExecutionGate`]; clears the `Executing` flag on drop.
#[derive(Debug)]
pub struct GateGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    executing: &'a AtomicBool,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.executing.store(false, Ordering::Release);
    }
}
