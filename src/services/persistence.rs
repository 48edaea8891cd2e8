//! Persistence service — debounced write scheduling.
//!
//! DESIGN
//! ======
//! A `Debouncer` holds at most one pending value. Each `schedule` call
//! replaces the pending value and restarts the timer, so a burst of calls
//! inside the window collapses into a single write carrying the last
//! value. The timer is a spawned tokio task; every reschedule bumps an
//! epoch so a timer that already woke up but lost the race to a newer
//! call drops out without writing.
//!
//! `flush` writes the pending value immediately and `cancel` drops it;
//! both are safe to call with nothing pending. Dropping the debouncer
//! aborts the timer without writing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Default debounce window for cache writes.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Slot<T> {
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
    epoch: u64,
}

impl<T> Slot<T> {
    /// Invalidate any running timer.
    fn reset(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.epoch = self.epoch.wrapping_add(1);
    }
}

/// Trailing-edge debouncer that hands the latest value to a sink.
pub struct Debouncer<T> {
    delay: Duration,
    slot: Arc<Mutex<Slot<T>>>,
    sink: Sink<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self { delay, slot: Arc::new(Mutex::new(Slot { pending: None, timer: None, epoch: 0 })), sink: Arc::new(sink) }
    }

    /// Replace the pending value and restart the window.
    ///
    /// Outside a tokio runtime there is no timer to run, so the value is
    /// written straight through.
    pub fn schedule(&self, value: T) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime for debounce timer; writing immediately");
            (self.sink)(value);
            return;
        };

        let mut slot = lock(&self.slot);
        slot.reset();
        slot.pending = Some(value);
        let epoch = slot.epoch;

        let shared = Arc::clone(&self.slot);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        slot.timer = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let value = {
                let mut slot = lock(&shared);
                if slot.epoch != epoch {
                    return;
                }
                slot.timer = None;
                slot.pending.take()
            };
            if let Some(value) = value {
                sink(value);
            }
        }));
    }

    /// Write the pending value now. Returns `false` if nothing was pending.
    pub fn flush(&self) -> bool {
        let value = {
            let mut slot = lock(&self.slot);
            slot.reset();
            slot.pending.take()
        };
        match value {
            Some(value) => {
                (self.sink)(value);
                true
            }
            None => false,
        }
    }

    /// Drop the pending value without writing it.
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.reset();
        slot.pending = None;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
        }
    }
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
