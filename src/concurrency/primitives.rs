//! Atomics, cells, and waiting hooks that switch to `loom` under `cfg(loom)`.
//!
//! Every shared-memory access in the queues goes through this module so the
//! same code can be exhaustively model-checked. Outside of loom the wrappers
//! compile down to the `core` types.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

#[cfg(not(loom))]
pub(crate) use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

#[cfg(loom)]
pub(crate) use loom::hint::spin_loop;

#[cfg(not(loom))]
pub(crate) use core::hint::spin_loop;

/// Blocks a thread until a condition over shared atomics holds.
///
/// Natively this spins with `crossbeam_utils::Backoff` and `notify` is free.
#[cfg(not(loom))]
#[derive(Debug, Default)]
pub(crate) struct Waiter;

#[cfg(not(loom))]
impl Waiter {
    pub(crate) const fn new() -> Self {
        Waiter
    }

    #[inline]
    pub(crate) fn wait_until(&self, mut ready: impl FnMut() -> bool) {
        let backoff = crossbeam_utils::Backoff::new();
        while !ready() {
            backoff.snooze();
        }
    }

    #[inline(always)]
    pub(crate) fn notify(&self) {}
}

/// Blocks a thread until a condition over shared atomics holds.
///
/// Under loom a spinning thread never lets the model finish, so waiters park
/// on a loom condition variable. Every change a waiter may be waiting for
/// must be followed by [`notify`](Self::notify).
#[cfg(loom)]
pub(crate) struct Waiter {
    lock: loom::sync::Mutex<()>,
    cond: loom::sync::Condvar,
}

#[cfg(loom)]
impl Waiter {
    pub(crate) fn new() -> Self {
        Self {
            lock: loom::sync::Mutex::new(()),
            cond: loom::sync::Condvar::new(),
        }
    }

    pub(crate) fn wait_until(&self, mut ready: impl FnMut() -> bool) {
        let mut guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        // `ready` runs under `lock`, and `notify` takes `lock` after the change
        // it announces, so a change is either seen here or followed by a wake.
        while !ready() {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    pub(crate) fn notify(&self) {
        drop(self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner));
        self.cond.notify_all();
    }
}

/// `UnsafeCell` with loom's closure-based access API.
#[cfg(loom)]
pub(crate) use loom::cell::UnsafeCell;

/// `UnsafeCell` with loom's closure-based access API.
#[cfg(not(loom))]
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct UnsafeCell<T>(core::cell::UnsafeCell<T>);

#[cfg(not(loom))]
impl<T> UnsafeCell<T> {
    #[inline(always)]
    pub(crate) const fn new(value: T) -> Self {
        Self(core::cell::UnsafeCell::new(value))
    }

    #[inline(always)]
    pub(crate) fn with<R>(&self, f: impl FnOnce(*const T) -> R) -> R {
        f(self.0.get())
    }

    #[inline(always)]
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
        f(self.0.get())
    }

    #[inline(always)]
    pub(crate) fn into_inner(self) -> T {
        self.0.into_inner()
    }
}
