//! Error types returned by queue constructors and non-blocking operations.

use core::fmt;

/// Why a requested capacity was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityErrorKind {
    /// Capacity must be at least one slot.
    Zero,
    /// The ring buffer addresses slots with a bitmask and needs a power of two.
    NotPowerOfTwo,
    /// A store handed to a queue already held values the queue could not account for.
    Occupied,
}

/// A queue could not be constructed with the requested capacity.
///
/// Construction either fully succeeds or produces this error; no partially
/// usable queue is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    requested: usize,
    kind: CapacityErrorKind,
}

impl CapacityError {
    pub(crate) const fn new(requested: usize, kind: CapacityErrorKind) -> Self {
        Self { requested, kind }
    }

    /// The capacity that was asked for.
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Which constraint the capacity violated.
    pub const fn kind(&self) -> CapacityErrorKind {
        self.kind
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CapacityErrorKind::Zero => {
                write!(f, "invalid capacity {}: a queue needs at least one slot", self.requested)
            }
            CapacityErrorKind::NotPowerOfTwo => {
                write!(f, "invalid capacity {}: must be a power of two", self.requested)
            }
            CapacityErrorKind::Occupied => {
                write!(f, "store of {} slots already holds values", self.requested)
            }
        }
    }
}

impl std::error::Error for CapacityError {}

/// A non-blocking insert found the queue saturated.
///
/// Carries the rejected value so the caller can retry, back off, or drop it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Recovers the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl: the value need not be `Debug`, and is not printed anyway.
impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is full")
    }
}

impl<T> std::error::Error for Full<T> {}

/// A non-blocking removal found the queue empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Empty;

impl fmt::Display for Empty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is empty")
    }
}

impl std::error::Error for Empty {}
