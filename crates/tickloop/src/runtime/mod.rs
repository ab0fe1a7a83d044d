//! Hosting: units, threads and pools
//!
//! - `event_loop`: the `Worker` and `EventLoop` units and the `Hosted` trait
//! - `thread`: `LoopThread`, one OS thread hosting one unit
//! - `pool`: `LoopThreadPool`, N threads behind a round-robin front

pub mod event_loop;
pub mod pool;
pub mod thread;

pub use event_loop::{EventLoop, Hosted, SingleProducerEventLoop, SingleProducerWorker, Worker};
pub use pool::{
    EventLoopThreadPool, LoopThreadPool, SingleProducerEventLoopThreadPool,
    SingleProducerWorkerThreadPool, WorkerThreadPool,
};
pub use thread::{
    EventLoopThread, LoopThread, SingleProducerEventLoopThread, SingleProducerWorkerThread,
    WorkerThread,
};
