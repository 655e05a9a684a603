//! Waiting pool infrastructure module
//!
//! Contains the FIFO waiting pool and the lock that serializes access to it.

pub mod waiting_pool;

pub use waiting_pool::{WaitingEntry, WaitingPool};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A waiting pool behind its own exclusive lock
///
/// Each role gets one `SharedPool`. Cancels lock only their own pool;
/// admissions lock both, evaluators first.
#[derive(Debug, Default)]
pub struct SharedPool {
    inner: Mutex<WaitingPool>,
}

impl SharedPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive access to the pool
    ///
    /// Every pool mutation is a single queue operation, so a pool cannot be
    /// left half-updated by a panicking holder and a poisoned lock is reused.
    pub fn lock(&self) -> MutexGuard<'_, WaitingPool> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
