//! Level-triggered wake-up signal between the trigger and the frame generator.
//!
//! # Why not a channel? (for beginners)
//!
//! A channel queues every message: if the trigger fired five times while the
//! generator was busy, the generator would then produce five frames in a row
//! to catch up.  For an animation that is the wrong behaviour: only the most
//! recent "time for a new frame" matters.
//!
//! [`Signal`] is a gate instead.  Raising it twice before anybody clears it is
//! the same as raising it once, so a slow generator simply skips ticks.
//!
//! ```text
//! trigger:   raise      raise  raise        raise
//! generator:   └─ wake ──────────── clear     └─ wake ...
//!                      (two raises coalesced)
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A binary, level-triggered gate shared between threads.
#[derive(Debug, Default)]
pub struct Signal {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal and wakes every waiter.
    ///
    /// Returns `false` when the signal was already raised, i.e. this raise was
    /// coalesced into the pending one.
    pub fn raise(&self) -> bool {
        let mut raised = self.lock();
        let newly = !*raised;
        *raised = true;
        self.cond.notify_all();
        newly
    }

    /// Resets the signal to unraised.
    pub fn clear(&self) {
        *self.lock() = false;
    }

    pub fn is_raised(&self) -> bool {
        *self.lock()
    }

    /// Blocks until the signal is raised.  Does not clear it.
    pub fn wait(&self) {
        let guard = self.lock();
        let _raised = self
            .cond
            .wait_while(guard, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the signal is raised or `timeout` elapses.
    ///
    /// Returns `true` if the signal is raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (raised, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        *raised
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.raised.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
