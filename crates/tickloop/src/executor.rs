//! Executor capability
//!
//! An `Executor` is the per-task logic a hosted loop invokes. It is built
//! together with the thread or pool hosting it and lives as long as that
//! host. In a pool one instance is shared by every member thread, so any
//! mutable state inside it needs its own synchronisation.

use crate::queue::{DelayedQueue, DelayedTask, ImmediateQueue};
use std::ops::Deref;
use std::time::Duration;

/// Pluggable per-task handling logic
///
/// Implement `execute` for plain handling. Override `execute_on_worker` or
/// `execute_on_loop` to receive an enqueuer that schedules follow-up work on
/// the same unit; a `Worker` calls the former, an `EventLoop` the latter.
pub trait Executor: Send + Sync + 'static {
    /// Task payload handled by this executor
    type Task: Send + 'static;

    /// Handle one task
    fn execute(&self, task: Self::Task);

    /// Handle one task on a `Worker`
    fn execute_on_worker(&self, task: Self::Task, _enqueuer: &WorkerEnqueuer<'_, Self::Task>) {
        self.execute(task);
    }

    /// Handle one task on an `EventLoop`
    fn execute_on_loop(&self, task: Self::Task, enqueuer: &LoopEnqueuer<'_, Self::Task>) {
        self.execute_on_worker(task, enqueuer);
    }
}

/// Schedules immediate follow-up work on the unit running the current task
pub struct WorkerEnqueuer<'a, T> {
    queue: &'a dyn ImmediateQueue<T>,
}

impl<'a, T> WorkerEnqueuer<'a, T> {
    pub(crate) fn new(queue: &'a dyn ImmediateQueue<T>) -> Self {
        Self { queue }
    }

    /// Enqueue `task` on the same unit
    pub fn enqueue(&self, task: T) {
        self.queue.push_local(task);
    }
}

/// Schedules immediate, delayed and interval follow-up work on the event loop
/// running the current task
pub struct LoopEnqueuer<'a, T> {
    worker: WorkerEnqueuer<'a, T>,
    delayed: &'a DelayedQueue<T>,
}

impl<'a, T> LoopEnqueuer<'a, T> {
    pub(crate) fn new(queue: &'a dyn ImmediateQueue<T>, delayed: &'a DelayedQueue<T>) -> Self {
        Self {
            worker: WorkerEnqueuer::new(queue),
            delayed,
        }
    }

    /// Run `task` once on the same loop after `delay`
    pub fn enqueue_delayed(&self, task: T, delay: Duration) -> DelayedTask {
        self.delayed.enqueue_delayed(task, delay)
    }

    /// Run `task` on the same loop every `delay` until cancelled
    pub fn enqueue_interval(&self, task: T, delay: Duration) -> DelayedTask
    where
        T: Clone,
    {
        self.delayed.enqueue_interval(task, delay)
    }
}

impl<'a, T> Deref for LoopEnqueuer<'a, T> {
    type Target = WorkerEnqueuer<'a, T>;

    fn deref(&self) -> &Self::Target {
        &self.worker
    }
}
