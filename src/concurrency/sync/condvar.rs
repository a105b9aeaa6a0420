//! A condition variable paired with [`Mutex`](super::Mutex).

use super::mutex::MutexGuard;
use super::Futex;
use crate::concurrency::primitives::Ordering;
use core::fmt;

/// Lets threads sleep until another thread signals that shared state changed.
///
/// Internally a sequence counter: every notification bumps it, and a waiter
/// sleeps until the counter differs from the value it read while still
/// holding the lock. A notification that lands between releasing the lock and
/// going to sleep is therefore never lost.
pub struct Condvar {
    seq: Futex,
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

impl Condvar {
    /// Creates a condition variable with no waiters.
    pub fn new() -> Self {
        Self {
            seq: Futex::new(0),
        }
    }

    /// Releases the lock behind `guard`, sleeps until notified, and re-acquires it.
    ///
    /// Wake-ups can be spurious. Prefer [`Condvar::wait_while`], which loops
    /// over the predicate.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        // Read under the lock: any notifier must take the lock after we drop it,
        // so its increment is ordered after this load.
        let seq = self.seq.load(Ordering::Relaxed);
        let mutex = guard.mutex();
        drop(guard);

        self.seq.wait(seq);

        mutex.lock()
    }

    /// Waits for as long as `condition` returns `true`.
    ///
    /// The predicate is evaluated with the lock held, first before any wait
    /// and again after every wake-up.
    pub fn wait_while<'a, T, F>(&self, mut guard: MutexGuard<'a, T>, mut condition: F) -> MutexGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut *guard) {
            guard = self.wait(guard);
        }
        guard
    }

    /// Wakes one thread blocked on this condition variable, if any.
    pub fn notify_one(&self) {
        self.seq.fetch_add(1, Ordering::Relaxed);
        self.seq.wake_one();
    }

    /// Wakes every thread blocked on this condition variable.
    pub fn notify_all(&self) {
        self.seq.fetch_add(1, Ordering::Relaxed);
        self.seq.wake_all();
    }
}

impl fmt::Debug for Condvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condvar").finish_non_exhaustive()
    }
}
