// SPDX-License-Identifier: MPL-2.0

//! Cooperative cancellation for the tools' worker threads.
//!
//! A [`CancelToken`] is shared by reference between a main loop and the
//! workers it spawns. Workers sleep on the token instead of the clock, so a
//! cancellation wakes them immediately.
//!
//! Terminal interrupts are turned into cancellations by an
//! [`InterruptWatcher`]: `SIGINT` is blocked in every thread with
//! [`block_interrupt`] and consumed synchronously by one dedicated thread, so
//! no code ever runs in signal-handler context.

mod interrupt;

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

pub use self::interrupt::{InterruptWatcher, block_interrupt, spawn_interrupt_watcher};

/// A one-shot cancellation flag that sleeping threads can wait on.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes every waiter. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleeps for `timeout` or until the token is cancelled.
    ///
    /// Returns whether the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.lock();
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            cancelled = self
                .cond
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *cancelled
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
