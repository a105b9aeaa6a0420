use super::SlotStore;
use core::fmt;

/// Position-addressed slots in one contiguous allocation. Every operation is O(1).
pub struct ArrayStore<T> {
    slots: Box<[Option<T>]>,
}

impl<T> ArrayStore<T> {
    /// Number of occupied slots. O(n); meant for tests and diagnostics.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl<T> SlotStore<T> for ArrayStore<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    #[inline]
    fn set(&mut self, pos: usize, value: T) {
        self.slots[pos] = Some(value);
    }

    #[inline]
    fn get(&self, pos: usize) -> Option<&T> {
        self.slots[pos].as_ref()
    }

    #[inline]
    fn remove(&mut self, pos: usize) -> Option<T> {
        self.slots[pos].take()
    }

    #[inline]
    fn size(&self) -> usize {
        self.slots.len()
    }
}

impl<T> fmt::Debug for ArrayStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayStore")
            .field("size", &self.slots.len())
            .field("occupied", &self.occupied())
            .finish()
    }
}
