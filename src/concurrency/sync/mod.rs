//! Blocking synchronization primitives and the lock-free ring buffer.
//!
//! `Mutex` and `Condvar` park threads on a 32-bit `Futex` word: a futex on
//! Linux, `WaitOnAddress` on Windows, a loom condition variable under loom,
//! and a yield loop everywhere else. Waits may return spuriously; callers
//! always re-check.

pub mod condvar;
pub mod mutex;
pub mod ring_buffer;


pub use condvar::Condvar;
pub use mutex::{Mutex, MutexGuard};
pub use ring_buffer::ConcurrentRingBuffer;

use crate::concurrency::primitives::AtomicU32;
use core::ops::Deref;

#[cfg(loom)]
use crate::concurrency::primitives::{Ordering, Waiter};

#[cfg(all(not(loom), not(any(windows, target_os = "linux"))))]
use crate::concurrency::primitives::Ordering;

#[cfg(all(windows, not(loom)))]
use core::ffi::c_void;

#[cfg(all(windows, not(loom)))]
use windows_sys::Win32::System::Threading::{WaitOnAddress, WakeByAddressAll, WakeByAddressSingle};

#[cfg(all(target_os = "linux", not(loom)))]
use libc::{SYS_futex, FUTEX_PRIVATE_FLAG, FUTEX_WAIT, FUTEX_WAKE};

#[cfg(all(target_os = "linux", not(loom)))]
#[inline]
fn futex_wait(addr: &AtomicU32, expected: u32) {
    // SAFETY: `addr` points at a live, aligned u32. FUTEX_WAIT only compares
    // the word against `expected` and sleeps; it never writes through it.
    unsafe {
        libc::syscall(
            SYS_futex,
            addr as *const AtomicU32 as *const u32,
            FUTEX_WAIT | FUTEX_PRIVATE_FLAG,
            expected,
            core::ptr::null::<libc::timespec>(),
        );
    }
}

#[cfg(all(target_os = "linux", not(loom)))]
#[inline]
fn futex_wake(addr: &AtomicU32, count: i32) {
    // SAFETY: as above; FUTEX_WAKE does not touch the word at all.
    unsafe {
        libc::syscall(
            SYS_futex,
            addr as *const AtomicU32 as *const u32,
            FUTEX_WAKE | FUTEX_PRIVATE_FLAG,
            count,
        );
    }
}

/// A 32-bit atomic word that threads can sleep on.
///
/// Derefs to the word itself. Whoever changes the word in a way a sleeper
/// cares about must call [`wake_one`](Self::wake_one) or
/// [`wake_all`](Self::wake_all) afterwards.
pub(crate) struct Futex {
    word: AtomicU32,
    #[cfg(loom)]
    waiter: Waiter,
}

impl Futex {
    pub(crate) fn new(value: u32) -> Self {
        Self {
            word: AtomicU32::new(value),
            #[cfg(loom)]
            waiter: Waiter::new(),
        }
    }

    /// Blocks while the word still holds `expected`.
    ///
    /// Returns immediately if the value has already moved on. May also return
    /// without any change having happened.
    #[inline]
    pub(crate) fn wait(&self, expected: u32) {
        #[cfg(all(target_os = "linux", not(loom)))]
        {
            futex_wait(&self.word, expected);
        }
        #[cfg(all(windows, not(loom)))]
        // SAFETY: both pointers are valid for 4 bytes for the duration of the call.
        unsafe {
            WaitOnAddress(
                &self.word as *const AtomicU32 as *const c_void,
                &expected as *const u32 as *const c_void,
                core::mem::size_of::<u32>(),
                u32::MAX,
            );
        }
        #[cfg(loom)]
        self.waiter
            .wait_until(|| self.word.load(Ordering::Acquire) != expected);
        #[cfg(all(not(loom), not(any(windows, target_os = "linux"))))]
        while self.word.load(Ordering::Acquire) == expected {
            std::thread::yield_now();
        }
    }

    /// Wakes at most one thread blocked in [`wait`](Self::wait).
    ///
    /// Under loom this wakes every sleeper; waits may return spuriously anyway.
    #[inline]
    pub(crate) fn wake_one(&self) {
        #[cfg(all(target_os = "linux", not(loom)))]
        futex_wake(&self.word, 1);
        #[cfg(all(windows, not(loom)))]
        // SAFETY: the address is valid; waking has no memory effects.
        unsafe {
            WakeByAddressSingle(&self.word as *const AtomicU32 as *const c_void);
        }
        #[cfg(loom)]
        self.waiter.notify();
    }

    /// Wakes every thread blocked in [`wait`](Self::wait).
    #[inline]
    pub(crate) fn wake_all(&self) {
        #[cfg(all(target_os = "linux", not(loom)))]
        futex_wake(&self.word, i32::MAX);
        #[cfg(all(windows, not(loom)))]
        // SAFETY: the address is valid; waking has no memory effects.
        unsafe {
            WakeByAddressAll(&self.word as *const AtomicU32 as *const c_void);
        }
        #[cfg(loom)]
        self.waiter.notify();
    }
}

impl Deref for Futex {
    type Target = AtomicU32;

    fn deref(&self) -> &AtomicU32 {
        &self.word
    }
}
