//! Bounded blocking queues and the slot stores behind them.
//!
//! - `store`: the [`SlotStore`] capability and its array and list implementations
//! - `blocking_queue`: [`BlockingQueue`], generic over its store

pub mod blocking_queue;
pub mod store;

pub use blocking_queue::{ArrayBlockingQueue, BlockingQueue, LinkedBlockingQueue};
pub use store::{ArrayStore, ListStore, SlotStore};
