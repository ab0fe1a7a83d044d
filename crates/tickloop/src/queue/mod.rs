//! Task queues
//!
//! Every hosted loop owns two independently paced queues: a delayed-task heap
//! (`DelayedQueue`) and an unbounded immediate queue (`ImmediateQueue`
//! implementors).

pub mod delayed;
pub mod immediate;

pub use delayed::{DelayedQueue, DelayedTask, Ready};
pub use immediate::{ImmediateQueue, SingleProducerQueue, TaskQueue};
