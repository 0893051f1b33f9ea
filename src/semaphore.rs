use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A blocking counting semaphore.
///
/// Once closed, releases are ignored and no permit is ever handed out again.
/// Threads already waiting are not woken by closing.
pub(crate) struct Semaphore {
    state: Mutex<State>,
    available: Condvar,
}

struct State {
    permits: usize,
    closed: bool,
}

impl Semaphore {
    pub(crate) fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Wait indefinitely for a permit.
    pub(crate) fn acquire(&self) -> Permit<'_> {
        let mut state = self.state.lock();
        while state.permits == 0 {
            self.available.wait(&mut state);
        }
        state.permits -= 1;
        Permit { semaphore: self }
    }

    /// Take a permit if one is free right now.
    pub(crate) fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut state = self.state.lock();
        if state.permits == 0 {
            return None;
        }
        state.permits -= 1;
        Some(Permit { semaphore: self })
    }

    /// Wait up to `timeout` for a permit.
    pub(crate) fn acquire_timeout(&self, timeout: Duration) -> Option<Permit<'_>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.acquire());
        };
        let mut state = self.state.lock();
        while state.permits == 0 {
            if self
                .available
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.permits == 0
            {
                return None;
            }
        }
        state.permits -= 1;
        Some(Permit { semaphore: self })
    }

    /// Return one permit and wake one waiter.
    pub(crate) fn release(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.permits += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Stop handing out permits.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.permits = 0;
    }

    pub(crate) fn available_permits(&self) -> usize {
        self.state.lock().permits
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Semaphore")
            .field("permits", &state.permits)
            .field("closed", &state.closed)
            .finish()
    }
}

/// A held permit, returned to the semaphore on drop unless forgotten.
#[must_use]
pub(crate) struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Permit<'_> {
    /// Keep the permit taken without a guard; it must later be handed back
    /// with [`Semaphore::release`].
    pub(crate) fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
