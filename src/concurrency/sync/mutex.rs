//! A three-state futex lock.

use super::Futex;
use crate::concurrency::primitives::{spin_loop, Ordering, UnsafeCell};
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
/// Locked, and at least one thread may be sleeping on the state word.
const CONTENDED: u32 = 2;

/// Spin iterations before a contended `lock` goes to sleep. Loom gets none:
/// every spin is a scheduling point it would have to explore.
const SPIN_LIMIT: u32 = if cfg!(loom) { 0 } else { 40 };

/// A mutual exclusion lock protecting a `T`.
///
/// The uncontended path is one compare-and-swap to lock and one swap to
/// unlock. Under contention the lock word is marked `CONTENDED` and waiters
/// sleep on it until an unlock wakes one of them. There is no poisoning: a
/// panic while the guard is held simply releases the lock.
pub struct Mutex<T> {
    state: Futex,
    data: UnsafeCell<T>,
}

// SAFETY: the lock hands out at most one `&mut T` at a time, so sharing the
// mutex only requires that `T` may move between threads.
unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Creates an unlocked mutex holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            state: Futex::new(UNLOCKED),
            data: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, blocking the current thread until it is available.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, T> {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.lock_contended();
        }
        MutexGuard::new(self)
    }

    /// Acquires the lock only if nobody holds it right now.
    #[inline]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| MutexGuard::new(self))
    }

    /// Returns a mutable reference to the data; the borrow proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: `&mut self` rules out any guard.
        self.data.with_mut(|data| unsafe { &mut *data })
    }

    /// Consumes the mutex and returns the data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    #[cold]
    fn lock_contended(&self) {
        let mut state = self.spin();

        if state == UNLOCKED {
            match self
                .state
                .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(s) => state = s,
            }
        }

        loop {
            // Once this thread has slept it cannot tell whether others are
            // still sleeping, so it must take the lock as CONTENDED. Taking it
            // as LOCKED would let the next unlock skip the wake-up.
            if state != CONTENDED && self.state.swap(CONTENDED, Ordering::Acquire) == UNLOCKED {
                return;
            }

            self.state.wait(CONTENDED);
            state = self.spin();
        }
    }

    /// Spins while the lock is held without waiters, returning the last state seen.
    fn spin(&self) -> u32 {
        let mut remaining = SPIN_LIMIT;
        loop {
            let state = self.state.load(Ordering::Relaxed);
            if state != LOCKED || remaining == 0 {
                return state;
            }
            spin_loop();
            remaining -= 1;
        }
    }

    /// # Safety
    ///
    /// The caller must hold the lock.
    #[inline]
    unsafe fn unlock(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            self.state.wake_one();
        }
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");
        match self.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}

/// Exclusive access to the data of a locked [`Mutex`]. Unlocks on drop.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
    // Sharing the guard shares `&T`, so the guard is only `Sync` for `T: Sync`.
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> MutexGuard<'a, T> {
    fn new(mutex: &'a Mutex<T>) -> Self {
        Self {
            mutex,
            _marker: PhantomData,
        }
    }

    /// The mutex this guard was issued by. `Condvar::wait` uses it to relock.
    pub(crate) fn mutex(&self) -> &'a Mutex<T> {
        self.mutex
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard exists only while the lock is held.
        self.mutex.data.with(|data| unsafe { &*data })
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard exists only while the lock is held.
        self.mutex.data.with_mut(|data| unsafe { &mut *data })
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: a live guard means this thread holds the lock.
        unsafe { self.mutex.unlock() }
    }
}

impl<T: fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
