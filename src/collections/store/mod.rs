//! Fixed-capacity slot stores backing [`BlockingQueue`](crate::collections::BlockingQueue).
//!
//! The queue owns the cursors and the element count; a store only maps a slot
//! position in `0..size()` to a value. Two stores ship with the crate:
//!
//! - [`ArrayStore`]: one `Option<T>` per slot, fully position-addressed.
//! - [`ListStore`]: a linked list that ignores positions and works on its
//!   ends. Correct only for a single-ended FIFO, see its docs.

mod array;
mod list;

pub use array::ArrayStore;
pub use list::ListStore;

/// Slot storage for a bounded queue.
///
/// Implementations never synchronize; the queue calls them with its lock held.
/// Positions passed in are always `< size()`.
pub trait SlotStore<T> {
    /// Creates an empty store with `capacity` slots. `capacity` is at least 1.
    fn with_capacity(capacity: usize) -> Self
    where
        Self: Sized;

    /// Stores `value` at `pos`, replacing whatever was there.
    fn set(&mut self, pos: usize, value: T);

    /// Borrows the value at `pos` without removing it.
    fn get(&self, pos: usize) -> Option<&T>;

    /// Takes the value out of `pos`, leaving the slot empty.
    fn remove(&mut self, pos: usize) -> Option<T>;

    /// Number of slots. Fixed for the life of the store.
    fn size(&self) -> usize;

    /// Returns `true` if no slot holds a value.
    fn is_vacant(&self) -> bool {
        (0..self.size()).all(|pos| self.get(pos).is_none())
    }

    /// Returns `true` if any of the `count` values starting at `start`, walking
    /// positions circularly, satisfies `predicate`.
    fn any_from(&self, start: usize, count: usize, predicate: &mut dyn FnMut(&T) -> bool) -> bool {
        let size = self.size();
        (0..count)
            .map(|offset| (start + offset) % size)
            .filter_map(|pos| self.get(pos))
            .any(|value| predicate(value))
    }
}
