//! Tickloop: an embeddable task-scheduling runtime
//!
//! This crate provides event loops and workers that run caller-supplied tasks,
//! plus the thread-lifecycle layer that hosts them:
//! - **Queues**: a delayed-task heap with cancellation (`queue::delayed`) and
//!   lock-free immediate queues (`queue::immediate`)
//! - **Units**: `Worker` (immediate tasks only) and `EventLoop` (immediate,
//!   delayed and interval tasks)
//! - **Threads**: `LoopThread` owns one OS thread hosting a unit;
//!   `LoopThreadPool` owns N of them and routes tasks round robin
//! - **Executors**: the `Executor` trait is the per-task logic, with a few
//!   stock strategies in `executors`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tickloop::{executors::{job, FnExecutor}, EventLoopThread};
//!
//! let thread = EventLoopThread::new(FnExecutor);
//! thread.start()?;
//!
//! thread.enqueue(job(|| println!("now")));
//! let handle = thread.enqueue_interval(job(|| println!("tick")), Duration::from_millis(750));
//!
//! std::thread::sleep(Duration::from_secs(3));
//! handle.cancel();
//! thread.stop();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Construction parameters shared by threads and pools
pub mod config;

/// Error types
pub mod error;

/// The executor capability and the enqueuers handed to it
pub mod executor;

/// Stock executor strategies
pub mod executors;

/// Delayed and immediate task queues
pub mod queue;

/// Hosted units, threads and pools
pub mod runtime;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{LoopConfig, DEFAULT_TICK};
pub use error::{Error, Result};
pub use executor::{Executor, LoopEnqueuer, WorkerEnqueuer};
pub use queue::{DelayedQueue, DelayedTask, ImmediateQueue, SingleProducerQueue, TaskQueue};
pub use runtime::{
    EventLoop, EventLoopThread, EventLoopThreadPool, Hosted, LoopThread, LoopThreadPool,
    SingleProducerEventLoop, SingleProducerEventLoopThread, SingleProducerEventLoopThreadPool,
    SingleProducerWorker, SingleProducerWorkerThread, SingleProducerWorkerThreadPool, Worker,
    WorkerThread, WorkerThreadPool,
};
