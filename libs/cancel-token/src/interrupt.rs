// SPDX-License-Identifier: MPL-2.0

use std::{
    sync::mpsc,
    thread::{Scope, ScopedJoinHandle},
};

use log::{debug, warn};
use nix::{
    errno::Errno,
    sys::{
        pthread::{Pthread, pthread_kill, pthread_self},
        signal::{SigSet, Signal},
    },
};

use crate::CancelToken;

fn interrupt_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    set
}

/// Blocks `SIGINT` in the calling thread.
///
/// Threads spawned afterwards inherit the mask, so this must run before any
/// other thread is created, including threads started by loaded libraries.
pub fn block_interrupt() -> nix::Result<()> {
    interrupt_set().thread_block()
}

/// A thread waiting for `SIGINT`.
pub struct InterruptWatcher<'scope> {
    thread: Pthread,
    handle: ScopedJoinHandle<'scope, ()>,
}

/// Spawns a thread in `scope` that waits for `SIGINT`.
///
/// On the first interrupt the thread cancels `token` and runs `on_interrupt`,
/// which is the place to unblock a main loop stuck in a blocking call. If the
/// token is already cancelled when the signal arrives, the watcher exits
/// without running `on_interrupt`.
///
/// [`block_interrupt`] must have been called beforehand.
pub fn spawn_interrupt_watcher<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    token: &'env CancelToken,
    on_interrupt: F,
) -> nix::Result<InterruptWatcher<'scope>>
where
    F: FnOnce() + Send + 'scope,
{
    let (tx, rx) = mpsc::channel();

    let handle = scope.spawn(move || {
        let set = interrupt_set();
        let blocked = set.thread_block();
        let is_blocked = blocked.is_ok();
        let _ = tx.send(blocked.map(|()| pthread_self()));
        if !is_blocked {
            return;
        }

        match set.wait() {
            Ok(signal) => debug!("received {}", signal),
            Err(errno) => {
                warn!("waiting for SIGINT failed: {}", errno);
                return;
            }
        }

        if token.is_cancelled() {
            return;
        }
        token.cancel();
        on_interrupt();
    });

    let thread = rx.recv().map_err(|_| Errno::ESRCH)??;
    Ok(InterruptWatcher { thread, handle })
}

impl InterruptWatcher<'_> {
    /// Delivers `SIGINT` to the watcher, as if typed on the terminal.
    pub fn raise(&self) -> nix::Result<()> {
        if self.handle.is_finished() {
            return Ok(());
        }
        pthread_kill(self.thread, Signal::SIGINT)
    }

    /// Stops the watcher and waits for it.
    ///
    /// Cancel the token first, otherwise the wake-up counts as an interrupt.
    pub fn shutdown(self) {
        if let Err(errno) = self.raise() {
            warn!("failed to wake the interrupt watcher: {}", errno);
        }
        if self.handle.join().is_err() {
            warn!("the interrupt watcher panicked");
        }
    }
}
