//! A bounded multi-producer multi-consumer FIFO with blocking operations.
//!
//! One [`Mutex`] guards the element count, both cursors, and the slot store.
//! Two condition variables coordinate blocking callers:
//!
//! - `not_empty` is signalled once per successful insertion and wakes a
//!   consumer parked in [`BlockingQueue::get`].
//! - `not_full` is signalled once per successful removal and wakes a producer
//!   parked in [`BlockingQueue::put`]. [`BlockingQueue::clear`] frees every
//!   slot at once and broadcasts instead.
//!
//! Every wait is a guarded wait: the predicate is re-checked under the lock
//! after each wake-up, so spurious wake-ups, broadcasts, and a third thread
//! winning the race for a freed slot are all harmless.
//!
//! Occupied slots are exactly the circular range `[read, read + count)` modulo
//! the capacity. Values leave in the order they entered; no order is promised
//! among several threads blocked at the same time.

use crate::collections::store::{ArrayStore, ListStore, SlotStore};
use crate::concurrency::sync::{Condvar, Mutex, MutexGuard};
use crate::error::{CapacityError, CapacityErrorKind, Empty, Full};
use crate::trace::{debug, trace};
use core::fmt;
use core::marker::PhantomData;

/// A blocking queue over fixed array slots.
pub type ArrayBlockingQueue<T> = BlockingQueue<T, ArrayStore<T>>;

/// A blocking queue over a linked list.
pub type LinkedBlockingQueue<T> = BlockingQueue<T, ListStore<T>>;

/// Everything the lock protects.
struct State<S> {
    store: S,
    count: usize,
    read: usize,
    write: usize,
}

impl<S> State<S> {
    /// Next position after `pos`, wrapping at `capacity`.
    #[inline(always)]
    fn advance(pos: usize, capacity: usize) -> usize {
        if pos + 1 == capacity {
            0
        } else {
            pos + 1
        }
    }

    fn enqueue<T>(&mut self, value: T, capacity: usize)
    where
        S: SlotStore<T>,
    {
        debug_assert!(self.count < capacity);
        self.store.set(self.write, value);
        self.write = Self::advance(self.write, capacity);
        self.count += 1;
    }

    fn dequeue<T>(&mut self, capacity: usize) -> Option<T>
    where
        S: SlotStore<T>,
    {
        debug_assert!(self.count > 0);
        let value = self.store.remove(self.read);
        debug_assert!(value.is_some(), "occupied slot {} was empty", self.read);
        self.read = Self::advance(self.read, capacity);
        self.count -= 1;
        value
    }
}

/// A bounded, thread-safe FIFO queue with blocking and non-blocking operations.
///
/// Capacity is fixed at construction. Insertion comes in three flavours:
/// [`offer`](Self::offer) reports a full queue with `false`,
/// [`push`](Self::push) reports it as a [`Full`] error carrying the value back,
/// and [`put`](Self::put) waits for room. Removal mirrors this with
/// [`poll`](Self::poll), [`pop`](Self::pop), and [`get`](Self::get).
///
/// Share it between threads by reference (`std::thread::scope`) or behind an
/// `Arc`.
///
/// # Example
///
/// ```rust
/// use blockq::ArrayBlockingQueue;
///
/// let queue = ArrayBlockingQueue::new(2).unwrap();
/// assert!(queue.offer(1));
/// queue.push(2).unwrap();
/// assert!(queue.push(3).is_err());
///
/// std::thread::scope(|s| {
///     s.spawn(|| queue.put(3)); // parks until a slot frees up
///     assert_eq!(queue.get(), 1);
/// });
///
/// assert_eq!(queue.poll(), Some(2));
/// assert_eq!(queue.pop(), Ok(3));
/// ```
pub struct BlockingQueue<T, S = ArrayStore<T>> {
    capacity: usize,
    state: Mutex<State<S>>,
    not_empty: Condvar,
    not_full: Condvar,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T, S: SlotStore<T>> BlockingQueue<T, S> {
    /// Creates an empty queue with room for `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns a [`CapacityError`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError::new(capacity, CapacityErrorKind::Zero));
        }
        Ok(Self::from_store(S::with_capacity(capacity)))
    }

    /// Creates a queue over a caller-supplied store.
    ///
    /// The store's `size()` becomes the capacity. It must be vacant: the queue
    /// starts with both cursors at zero and no way to account for values it
    /// did not insert.
    ///
    /// # Errors
    ///
    /// Returns a [`CapacityError`] of kind `Zero` if the store has no slots,
    /// or `Occupied` if any slot already holds a value.
    pub fn with_store(store: S) -> Result<Self, CapacityError> {
        let size = store.size();
        if size == 0 {
            return Err(CapacityError::new(0, CapacityErrorKind::Zero));
        }
        if !store.is_vacant() {
            return Err(CapacityError::new(size, CapacityErrorKind::Occupied));
        }
        Ok(Self::from_store(store))
    }

    fn from_store(store: S) -> Self {
        let capacity = store.size();
        debug!(
            capacity,
            store = core::any::type_name::<S>(),
            "created blocking queue"
        );
        Self {
            capacity,
            state: Mutex::new(State {
                store,
                count: 0,
                read: 0,
                write: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            _marker: PhantomData,
        }
    }

    /// Inserts `value` if there is room, without blocking.
    ///
    /// Returns `false` (and drops `value`) if the queue is full. Use
    /// [`push`](Self::push) to get the value back instead.
    pub fn offer(&self, value: T) -> bool {
        self.push(value).is_ok()
    }

    /// Inserts `value` if there is room, without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Full`] holding `value` if every slot is occupied.
    pub fn push(&self, value: T) -> Result<(), Full<T>> {
        let mut state = self.state.lock();
        if state.count == self.capacity {
            return Err(Full(value));
        }
        self.insert(&mut state, value);
        Ok(())
    }

    /// Inserts `value`, blocking while the queue is full.
    pub fn put(&self, value: T) {
        let capacity = self.capacity;
        let state = self.state.lock();
        if state.count == capacity {
            trace!(capacity, "put parking on a full queue");
        }
        let mut state = self.not_full.wait_while(state, |state| state.count == capacity);
        self.insert(&mut state, value);
    }

    /// Removes the oldest value, or returns `None` if the queue is empty.
    pub fn poll(&self) -> Option<T> {
        let mut state = self.state.lock();
        if state.count == 0 {
            return None;
        }
        self.remove(&mut state)
    }

    /// Removes the oldest value without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Empty`] if there is nothing to remove.
    pub fn pop(&self) -> Result<T, Empty> {
        self.poll().ok_or(Empty)
    }

    /// Removes the oldest value, blocking while the queue is empty.
    pub fn get(&self) -> T {
        let mut state = self.state.lock();
        loop {
            if state.count == 0 {
                trace!("get parking on an empty queue");
            }
            state = self.not_empty.wait_while(state, |state| state.count == 0);
            // A well-behaved store always yields a value here; if a custom
            // store loses one, keep waiting for the next.
            if let Some(value) = self.remove(&mut state) {
                return value;
            }
        }
    }

    /// Calls `f` with the oldest value without removing it.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let state = self.state.lock();
        if state.count == 0 {
            return None;
        }
        state.store.get(state.read).map(f)
    }

    /// Returns a clone of the oldest value without removing it.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.peek_with(T::clone)
    }

    /// Drops every queued value and resets the cursors.
    ///
    /// All producers blocked in [`put`](Self::put) are woken, since every slot
    /// is free afterwards.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        debug!(discarded = state.count, "clearing blocking queue");

        let mut pos = state.read;
        for _ in 0..state.count {
            drop(state.store.remove(pos));
            pos = State::<S>::advance(pos, self.capacity);
        }
        state.count = 0;
        state.read = 0;
        state.write = 0;

        self.not_full.notify_all();
    }

    /// Returns `true` if an equal value is currently queued.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let state = self.state.lock();
        state
            .store
            .any_from(state.read, state.count, &mut |queued| queued == value)
    }

    /// Number of queued values.
    pub fn len(&self) -> usize {
        self.state.lock().count
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Total number of slots, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values that can be inserted before the queue is full.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.len()
    }

    fn insert(&self, state: &mut MutexGuard<'_, State<S>>, value: T) {
        state.enqueue(value, self.capacity);
        self.not_empty.notify_one();
    }

    fn remove(&self, state: &mut MutexGuard<'_, State<S>>) -> Option<T> {
        let value = state.dequeue(self.capacity);
        self.not_full.notify_one();
        value
    }
}

impl<T, S> fmt::Debug for BlockingQueue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("BlockingQueue");
        d.field("capacity", &self.capacity);
        match self.state.try_lock() {
            Some(state) => d.field("len", &state.count),
            None => d.field("len", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn both_stores(test: impl Fn(&dyn Fn(usize) -> Box<dyn QueueUnderTest>)) {
        test(&|cap| Box::new(ArrayBlockingQueue::<u32>::new(cap).unwrap()) as Box<dyn QueueUnderTest>);
        test(&|cap| Box::new(LinkedBlockingQueue::<u32>::new(cap).unwrap()) as Box<dyn QueueUnderTest>);
    }

    /// Object-safe slice of the queue API so one test body covers both stores.
    trait QueueUnderTest {
        fn offer(&self, v: u32) -> bool;
        fn poll(&self) -> Option<u32>;
        fn peek(&self) -> Option<u32>;
        fn len(&self) -> usize;
        fn clear(&self);
        fn contains(&self, v: u32) -> bool;
    }

    impl<S: SlotStore<u32>> QueueUnderTest for BlockingQueue<u32, S> {
        fn offer(&self, v: u32) -> bool {
            BlockingQueue::offer(self, v)
        }
        fn poll(&self) -> Option<u32> {
            BlockingQueue::poll(self)
        }
        fn peek(&self) -> Option<u32> {
            BlockingQueue::peek(self)
        }
        fn len(&self) -> usize {
            BlockingQueue::len(self)
        }
        fn clear(&self) {
            BlockingQueue::clear(self)
        }
        fn contains(&self, v: u32) -> bool {
            BlockingQueue::contains(self, &v)
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ArrayBlockingQueue::<u8>::new(0).unwrap_err();
        assert_eq!(err.kind(), CapacityErrorKind::Zero);
        assert!(LinkedBlockingQueue::<u8>::new(0).is_err());
        assert!(BlockingQueue::<u8, _>::with_store(ArrayStore::with_capacity(0)).is_err());
    }

    #[test]
    fn with_store_rejects_prefilled_stores() {
        let mut list = ListStore::with_capacity(2);
        list.set(0, 99_u32);
        let err = BlockingQueue::<u32, _>::with_store(list).unwrap_err();
        assert_eq!(err.kind(), CapacityErrorKind::Occupied);
        assert_eq!(err.requested(), 2);

        let mut array = ArrayStore::with_capacity(3);
        array.set(2, 7_u32);
        let err = BlockingQueue::<u32, _>::with_store(array).unwrap_err();
        assert_eq!(err.kind(), CapacityErrorKind::Occupied);
    }

    #[test]
    fn with_store_accepts_drained_stores() {
        let mut list = ListStore::with_capacity(2);
        list.set(0, 99_u32);
        list.remove(0);
        let q = BlockingQueue::<u32, _>::with_store(list).unwrap();
        assert!(q.offer(1));
        assert_eq!(q.len(), 1);
        assert_eq!(q.poll(), Some(1));
        assert_eq!(q.poll(), None);

        let q = BlockingQueue::<u32, _>::with_store(ArrayStore::with_capacity(2)).unwrap();
        assert_eq!(q.capacity(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn fresh_queue_is_empty() {
        let q = ArrayBlockingQueue::<u8>::new(16).unwrap();
        assert_eq!(q.capacity(), 16);
        assert_eq!(q.len(), 0);
        assert_eq!(q.remaining_capacity(), 16);
        assert!(q.is_empty());
        assert_eq!(q.poll(), None);
        assert_eq!(q.pop(), Err(Empty));
        assert_eq!(q.peek(), None);
    }

    #[test]
    fn capacity_boundary() {
        both_stores(|make| {
            let q = make(16);
            for i in 0..16 {
                assert!(q.offer(i));
            }
            assert!(!q.offer(16));
            assert_eq!(q.len(), 16);
        });
    }

    #[test]
    fn push_returns_rejected_value() {
        let q = ArrayBlockingQueue::new(1).unwrap();
        q.push(String::from("first")).unwrap();
        let err = q.push(String::from("second")).unwrap_err();
        assert_eq!(err.into_inner(), "second");
        assert!(q.is_full());
    }

    #[test]
    fn fifo_through_wraparound() {
        both_stores(|make| {
            let q = make(3);
            let mut next_in = 0;
            let mut next_out = 0;
            for _ in 0..10 {
                while q.offer(next_in) {
                    next_in += 1;
                }
                assert_eq!(q.peek(), Some(next_out));
                // Drain two of three so the cursors drift around the ring.
                for _ in 0..2 {
                    assert_eq!(q.poll(), Some(next_out));
                    next_out += 1;
                }
            }
            while let Some(v) = q.poll() {
                assert_eq!(v, next_out);
                next_out += 1;
            }
            assert_eq!(next_in, next_out);
        });
    }

    #[test]
    fn peek_does_not_consume() {
        let q = ArrayBlockingQueue::new(4).unwrap();
        q.put(7);
        assert_eq!(q.peek(), Some(7));
        assert_eq!(q.peek_with(|v| v * 2), Some(14));
        assert_eq!(q.len(), 1);
        assert_eq!(q.get(), 7);
    }

    #[test]
    fn contains_only_sees_live_values() {
        both_stores(|make| {
            let q = make(4);
            for v in [1, 2, 3, 4] {
                q.offer(v);
            }
            q.poll();
            q.poll();
            q.offer(5);
            assert!(!q.contains(1));
            assert!(q.contains(3));
            assert!(q.contains(5));
            assert!(!q.contains(6));
        });
    }

    #[test]
    fn clear_resets_state() {
        both_stores(|make| {
            let q = make(4);
            for v in 0..4 {
                q.offer(v);
            }
            q.poll();
            q.clear();
            assert_eq!(q.len(), 0);
            assert_eq!(q.poll(), None);
            for v in 10..14 {
                assert!(q.offer(v));
            }
            assert_eq!(q.poll(), Some(10));
        });
    }

    #[test]
    fn clear_drops_values() {
        let q = ArrayBlockingQueue::new(4).unwrap();
        let tracker = std::sync::Arc::new(());
        for _ in 0..3 {
            q.put(tracker.clone());
        }
        assert_eq!(std::sync::Arc::strong_count(&tracker), 4);
        q.clear();
        assert_eq!(std::sync::Arc::strong_count(&tracker), 1);
    }

    #[test]
    fn get_blocks_until_put() {
        let q = ArrayBlockingQueue::new(1).unwrap();
        thread::scope(|s| {
            let consumer = s.spawn(|| q.get());
            thread::sleep(Duration::from_millis(20));
            q.put(99_u64);
            assert_eq!(consumer.join().unwrap(), 99);
        });
    }

    #[test]
    fn put_blocks_until_removal() {
        let q = ArrayBlockingQueue::new(1).unwrap();
        q.put(1);
        let inserted = AtomicUsize::new(0);
        thread::scope(|s| {
            s.spawn(|| {
                q.put(2);
                inserted.store(1, Ordering::SeqCst);
            });
            thread::sleep(Duration::from_millis(20));
            assert_eq!(inserted.load(Ordering::SeqCst), 0);
            assert_eq!(q.pop(), Ok(1));
        });
        assert_eq!(inserted.load(Ordering::SeqCst), 1);
        assert_eq!(q.poll(), Some(2));
    }

    #[test]
    fn debug_does_not_deadlock_under_lock() {
        let q = ArrayBlockingQueue::<u8>::new(2).unwrap();
        let _guard = q.state.lock();
        assert_eq!(format!("{q:?}"), "BlockingQueue { capacity: 2, len: <locked>, .. }");
    }
}
