//! Wake-up signal for threads waiting on write-once cells

use parking_lot::{Condvar, Mutex};

/// Condition variable paired with its own lock
///
/// Writers update their cells first and then call [`Signal::notify`];
/// waiters re-check their condition under the lock, so no wakeup is lost.
pub(crate) struct Signal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Wake every waiter so it re-checks its condition
    pub(crate) fn notify(&self) {
        let _guard = self.lock.lock();
        self.cond.notify_all();
    }

    /// Block until `ready` returns true
    pub(crate) fn wait_until(&self, mut ready: impl FnMut() -> bool) {
        if ready() {
            return;
        }

        let mut guard = self.lock.lock();
        while !ready() {
            self.cond.wait(&mut guard);
        }
    }
}
