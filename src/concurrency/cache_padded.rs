//! Cache-line isolation for independently updated counters.

use core::fmt;
use core::ops::{Deref, DerefMut};

/// Aligns and pads `T` to its own cache line.
///
/// 128 bytes covers both 64-byte x86 lines and the 128-byte prefetch pairs on
/// recent x86 parts and Apple Silicon. Two `CachePadded` fields never share a
/// line, so a producer hammering one counter does not invalidate the line a
/// consumer is spinning on.
#[repr(align(128))]
#[derive(Default)]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    /// Wraps `value` in its own cache line.
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwraps the padded value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> From<T> for CachePadded<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for CachePadded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePadded").field("value", &self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem;

    #[test]
    fn padded_values_occupy_whole_lines() {
        assert_eq!(mem::align_of::<CachePadded<u8>>(), 128);
        assert_eq!(mem::size_of::<CachePadded<usize>>(), 128);
        assert_eq!(mem::size_of::<[CachePadded<usize>; 2]>(), 256);
    }

    #[test]
    fn deref_reaches_inner_value() {
        let mut padded = CachePadded::new(7_u32);
        *padded += 1;
        assert_eq!(*padded, 8);
        assert_eq!(padded.into_inner(), 8);
    }
}
