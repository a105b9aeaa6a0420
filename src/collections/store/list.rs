use super::SlotStore;
use core::fmt;
use std::collections::LinkedList;

/// A linked-list store for single-ended FIFO use only.
///
/// Positions are ignored: `set` appends to the back, `get` and `remove` act on
/// the front. This matches a FIFO queue, whose write cursor always addresses
/// the logical tail and whose read cursor always addresses the logical head.
/// Any caller that addresses slots out of order (a deque, removal by index)
/// gets the wrong element.
pub struct ListStore<T> {
    items: LinkedList<T>,
    capacity: usize,
}

impl<T> ListStore<T> {
    /// Number of values currently linked.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if no values are linked.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> SlotStore<T> for ListStore<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: LinkedList::new(),
            capacity,
        }
    }

    #[inline]
    fn set(&mut self, _pos: usize, value: T) {
        debug_assert!(self.items.len() < self.capacity, "list store over capacity");
        self.items.push_back(value);
    }

    #[inline]
    fn get(&self, _pos: usize) -> Option<&T> {
        self.items.front()
    }

    #[inline]
    fn remove(&mut self, _pos: usize) -> Option<T> {
        self.items.pop_front()
    }

    #[inline]
    fn size(&self) -> usize {
        self.capacity
    }

    fn is_vacant(&self) -> bool {
        self.items.is_empty()
    }

    fn any_from(&self, _start: usize, count: usize, predicate: &mut dyn FnMut(&T) -> bool) -> bool {
        self.items.iter().take(count).any(|value| predicate(value))
    }
}

impl<T> fmt::Debug for ListStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListStore")
            .field("size", &self.capacity)
            .field("len", &self.items.len())
            .finish()
    }
}
