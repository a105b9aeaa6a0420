//! # `blockq` - Bounded Thread-Safe Queues
//!
//! Building blocks for producer/consumer pipelines with a fixed memory bound.
//!
//! ## Queues
//!
//! 1. **Blocking queue** (`BlockingQueue<T, S>`):
//!    - One mutex, two condition variables (`not_empty`, `not_full`)
//!    - Non-blocking `offer`/`push` and `poll`/`pop`, blocking `put`/`get`,
//!      plus `peek`, `clear`, `contains`
//!    - Slot storage is pluggable through the `SlotStore` trait:
//!      `ArrayBlockingQueue` uses fixed array slots, `LinkedBlockingQueue` a
//!      linked list
//!
//! 2. **Lock-free ring buffer** (`ConcurrentRingBuffer<T>`):
//!    - Power-of-two capacity, bitmask slot addressing
//!    - Tickets are claimed with `fetch_add` and committed in ticket order
//!      with a compare-and-swap, so producers fill slots in parallel while
//!      consumers still see values in claim order
//!    - Hot counters padded onto separate cache lines
//!    - `put`/`get` spin with backoff instead of parking
//!
//! ## Choosing
//!
//! Use the blocking queue when producers and consumers can be idle for long
//! stretches or when callers need admission control (`Full`/`Empty`). Use the
//! ring buffer when rates are roughly matched and throughput matters more than
//! fairness: its waits burn CPU and a stalled peer holds up everyone behind it.
//!
//! ## Features
//!
//! - `tracing`: emit `tracing` events on construction, `clear`, and whenever
//!   a caller has to wait.
//!
//! Build with `RUSTFLAGS="--cfg loom"` to run the model-checking tests in
//! `tests/loom_queues.rs`.
//!
//! ## Example
//!
//! ```rust
//! use blockq::{ArrayBlockingQueue, Empty};
//!
//! let queue = ArrayBlockingQueue::new(16).unwrap();
//!
//! std::thread::scope(|s| {
//!     s.spawn(|| {
//!         for i in 0..100 {
//!             queue.put(i);
//!         }
//!     });
//!     for i in 0..100 {
//!         assert_eq!(queue.get(), i);
//!     }
//! });
//!
//! assert_eq!(queue.pop(), Err(Empty));
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod concurrency;
pub mod error;
mod trace;

pub use collections::{ArrayBlockingQueue, ArrayStore, BlockingQueue, LinkedBlockingQueue, ListStore, SlotStore};
pub use concurrency::sync::{ConcurrentRingBuffer, Condvar, Mutex, MutexGuard};
pub use concurrency::CachePadded;
pub use error::{CapacityError, CapacityErrorKind, Empty, Full};

// Compile-time layout checks.
const _: () = {
    use core::mem;

    // Padding is what keeps the ring buffer's counters apart.
    assert!(mem::align_of::<CachePadded<u8>>() == 128);
    assert!(mem::size_of::<CachePadded<usize>>() == 128);

    // Error types add nothing on top of the value they carry.
    assert!(mem::size_of::<Empty>() == 0);
    assert!(mem::size_of::<Full<u64>>() == mem::size_of::<u64>());
};
