//! Concurrency building blocks: cache-line padding, a loom-switchable
//! primitives facade, a futex mutex and condition variable, and the lock-free
//! ring buffer.

pub mod cache_padded;
pub(crate) mod primitives;
pub mod sync;

pub use cache_padded::CachePadded;
