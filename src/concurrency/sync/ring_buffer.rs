//! A lock-free, bounded, multi-producer multi-consumer ring buffer.
//!
//! Uses a claim/commit protocol instead of a lock:
//!
//! 1. **Claim.** A producer takes the next write ticket with one
//!    `fetch_add`; a consumer does the same on the read counter. Any number
//!    of threads can claim in parallel.
//! 2. **Transfer.** The producer waits until the slot's previous occupant has
//!    been consumed, then writes. The consumer waits until its ticket has been
//!    committed, then moves the value out.
//! 3. **Commit.** Each side advances its commit counter from `ticket - 1` to
//!    `ticket` with a compare-and-swap, retrying until the thread holding the
//!    previous ticket has committed. Slots are filled and drained out of
//!    order, but publication always happens in ticket order.
//!
//! Tickets start at 1 and commit counters at 0, so `ticket - 1` never
//! underflows. Ticket `t` lives in slot `t & mask`; the capacity must be a
//! power of two.
//!
//! There is no full or empty outcome. Both `put` and `get` spin, yielding to
//! the scheduler, until they can proceed. That suits pipelines whose producers
//! and consumers run at roughly matched rates. It is not fair, and a thread
//! that claims a ticket and then stalls holds up every later ticket on its side.

use crate::concurrency::primitives::{AtomicUsize, Ordering, UnsafeCell, Waiter};
use crate::concurrency::CachePadded;
use crate::error::{CapacityError, CapacityErrorKind};
use crate::trace::{debug, trace};
use core::fmt;
use core::mem::MaybeUninit;

/// Slot array and its addressing mask. Read-only after construction.
struct Storage<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
}

impl<T> Storage<T> {
    #[inline(always)]
    fn slot(&self, ticket: usize) -> &UnsafeCell<MaybeUninit<T>> {
        // SAFETY: `mask` is `slots.len() - 1` and `slots.len()` is a power of
        // two, so the masked index is always in bounds.
        unsafe { self.slots.get_unchecked(ticket & self.mask) }
    }
}

/// A fixed-capacity lock-free queue using claim/commit tickets.
///
/// Every counter sits on its own cache line, and so does the slot array
/// header, so producers and consumers do not invalidate each other's lines.
///
/// # Example
///
/// ```rust
/// use blockq::ConcurrentRingBuffer;
///
/// let ring = ConcurrentRingBuffer::new(4).unwrap();
/// std::thread::scope(|s| {
///     s.spawn(|| (0..100).for_each(|i| ring.put(i)));
///     let received: Vec<_> = (0..100).map(|_| ring.get()).collect();
///     assert_eq!(received, (0..100).collect::<Vec<_>>());
/// });
/// ```
#[repr(C)]
pub struct ConcurrentRingBuffer<T> {
    /// Highest write ticket whose value is visible to consumers.
    committed: CachePadded<AtomicUsize>,
    /// Next write ticket to hand out.
    write: CachePadded<AtomicUsize>,
    /// Next read ticket to hand out.
    read: CachePadded<AtomicUsize>,
    /// Highest read ticket whose value has been moved out of its slot.
    consumed: CachePadded<AtomicUsize>,
    storage: CachePadded<Storage<T>>,
    /// Where threads wait for a counter to move. Zero-sized outside loom.
    waiter: Waiter,
}

// SAFETY: values are moved in by exactly one producer and out by exactly one
// consumer per ticket, with the commit counters ordering the two.
unsafe impl<T: Send> Send for ConcurrentRingBuffer<T> {}
unsafe impl<T: Send> Sync for ConcurrentRingBuffer<T> {}

impl<T> ConcurrentRingBuffer<T> {
    /// Creates an empty ring buffer with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns a [`CapacityError`] if `capacity` is zero or not a power of two.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError::new(capacity, CapacityErrorKind::Zero));
        }
        if !capacity.is_power_of_two() {
            return Err(CapacityError::new(capacity, CapacityErrorKind::NotPowerOfTwo));
        }

        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        debug!(capacity, "created ring buffer");

        Ok(Self {
            committed: CachePadded::new(AtomicUsize::new(0)),
            write: CachePadded::new(AtomicUsize::new(1)),
            read: CachePadded::new(AtomicUsize::new(1)),
            consumed: CachePadded::new(AtomicUsize::new(0)),
            storage: CachePadded::new(Storage {
                slots,
                mask: capacity - 1,
            }),
            waiter: Waiter::new(),
        })
    }

    /// Appends `value`, spinning while the buffer is full.
    pub fn put(&self, value: T) {
        let ticket = self.write.fetch_add(1, Ordering::Relaxed);

        // Ticket `t` reuses the slot of ticket `t - capacity`, which must
        // already have been moved out.
        if !self.has_room(ticket) {
            self.wait_for_room(ticket);
        }

        self.storage.slot(ticket).with_mut(|slot| {
            // SAFETY: the previous occupant of this slot has been consumed and
            // no other producer holds this ticket.
            unsafe { (*slot).write(value) };
        });

        self.commit(&self.committed, ticket);
    }

    /// Removes the oldest value, spinning while the buffer is empty.
    pub fn get(&self) -> T {
        let ticket = self.read.fetch_add(1, Ordering::Relaxed);

        if self.committed.load(Ordering::Acquire) < ticket {
            self.wait_for_commit(ticket);
        }

        let value = self.storage.slot(ticket).with(|slot| {
            // SAFETY: the producer holding this ticket has committed, so the
            // slot is initialised, and no other consumer holds this ticket.
            unsafe { (*slot).assume_init_read() }
        });

        self.commit(&self.consumed, ticket);
        value
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.storage.mask + 1
    }

    /// Number of committed values not yet consumed.
    ///
    /// A snapshot: concurrent puts and gets can change it immediately.
    pub fn len(&self) -> usize {
        let consumed = self.consumed.load(Ordering::Acquire);
        let committed = self.committed.load(Ordering::Acquire);
        committed.wrapping_sub(consumed)
    }

    /// Returns `true` if no committed value is waiting. A snapshot, like [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    fn has_room(&self, ticket: usize) -> bool {
        ticket.wrapping_sub(self.consumed.load(Ordering::Acquire)) <= self.capacity()
    }

    #[cold]
    fn wait_for_room(&self, ticket: usize) {
        trace!(ticket, "ring buffer full; producer spinning");
        self.waiter.wait_until(|| self.has_room(ticket));
    }

    #[cold]
    fn wait_for_commit(&self, ticket: usize) {
        trace!(ticket, "ring buffer empty; consumer spinning");
        self.waiter
            .wait_until(|| self.committed.load(Ordering::Acquire) >= ticket);
    }

    /// Advances `counter` from `ticket - 1` to `ticket`, waiting for earlier
    /// tickets to commit first.
    #[inline]
    fn commit(&self, counter: &AtomicUsize, ticket: usize) {
        let previous = ticket - 1;
        let advance = || {
            counter
                .compare_exchange(previous, ticket, Ordering::Release, Ordering::Relaxed)
                .is_ok()
        };
        if !advance() {
            self.waiter.wait_until(advance);
        }
        self.waiter.notify();
    }
}

impl<T> Drop for ConcurrentRingBuffer<T> {
    fn drop(&mut self) {
        // `&mut self` means every put and get has returned, so the committed
        // but unconsumed tickets are exactly the initialised slots.
        let consumed = self.consumed.load(Ordering::Relaxed);
        let committed = self.committed.load(Ordering::Relaxed);
        let mut ticket = consumed.wrapping_add(1);
        while ticket.wrapping_sub(1) != committed {
            self.storage.slot(ticket).with_mut(|slot| {
                // SAFETY: committed and never consumed, hence initialised.
                unsafe { (*slot).assume_init_drop() };
            });
            ticket = ticket.wrapping_add(1);
        }
    }
}

impl<T> fmt::Debug for ConcurrentRingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentRingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
