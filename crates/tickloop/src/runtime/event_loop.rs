//! Hosted units: `Worker` and `EventLoop`
//!
//! A unit owns its queues and drains them on whatever thread calls `run`.
//! `LoopThread` and `LoopThreadPool` call it on threads they own, but a unit
//! can just as well be driven by a caller-owned thread.

use crate::executor::{Executor, LoopEnqueuer, WorkerEnqueuer};
use crate::queue::{DelayedQueue, DelayedTask, ImmediateQueue, SingleProducerQueue, TaskQueue};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// A unit a thread can host
pub trait Hosted<E: Executor>: Default + Send + Sync + 'static {
    /// Drain queues and execute tasks until `running` is cleared
    ///
    /// Sleeps one `tick` whenever an iteration found no ready work.
    fn run(&self, running: &AtomicBool, executor: &E, tick: Duration);

    /// Approximate number of tasks not yet executed
    fn size_approx(&self) -> usize;
}

/// Immediate queue plus the count of drained-but-unexecuted tasks
struct Inbox<T, Q> {
    queue: Q,
    in_flight: AtomicUsize,
    _task: PhantomData<fn(T)>,
}

impl<T, Q: ImmediateQueue<T> + Default> Inbox<T, Q> {
    fn new() -> Self {
        Self {
            queue: Q::default(),
            in_flight: AtomicUsize::new(0),
            _task: PhantomData,
        }
    }

    /// Drain once, then execute every harvested task
    fn run_batch(&self, buffer: &mut Vec<T>, mut execute: impl FnMut(T)) -> bool {
        // Published before draining so `size_approx` does not dip to zero
        // while tasks move from the queue into the buffer
        self.in_flight
            .store(self.queue.len_approx(), Ordering::Release);
        let moved = self.queue.drain(buffer);
        self.in_flight.store(moved, Ordering::Release);
        if moved == 0 {
            return false;
        }

        for task in buffer.drain(..) {
            execute(task);
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
        }
        true
    }

    fn size_approx(&self) -> usize {
        self.queue.len_approx() + self.in_flight.load(Ordering::Acquire)
    }
}

impl<T> Inbox<T, TaskQueue<T>> {
    fn push(&self, task: T) {
        self.queue.push(task);
    }
}

impl<T> Inbox<T, SingleProducerQueue<T>> {
    /// # Safety
    ///
    /// Same contract as `SingleProducerQueue::push`.
    unsafe fn push(&self, task: T) {
        self.queue.push(task);
    }
}

/// Unit that executes immediate tasks only
pub struct Worker<T, Q = TaskQueue<T>> {
    inbox: Inbox<T, Q>,
}

/// `Worker` fed by a single producer thread
pub type SingleProducerWorker<T> = Worker<T, SingleProducerQueue<T>>;

impl<T, Q: ImmediateQueue<T> + Default> Worker<T, Q> {
    /// Create an idle worker with empty queues
    pub fn new() -> Self {
        Self {
            inbox: Inbox::new(),
        }
    }

    /// Approximate number of tasks not yet executed
    pub fn size_approx(&self) -> usize {
        self.inbox.size_approx()
    }
}

impl<T, Q: ImmediateQueue<T> + Default> Default for Worker<T, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Worker<T> {
    /// Enqueue a task from any thread
    pub fn enqueue(&self, task: T) {
        self.inbox.push(task);
    }
}

impl<T> Worker<T, SingleProducerQueue<T>> {
    /// Enqueue a task from the producer thread
    ///
    /// # Safety
    ///
    /// No two threads may call this concurrently on the same worker.
    pub unsafe fn enqueue_unchecked(&self, task: T) {
        self.inbox.push(task);
    }
}

impl<E, Q> Hosted<E> for Worker<E::Task, Q>
where
    E: Executor,
    Q: ImmediateQueue<E::Task> + Default + 'static,
{
    fn run(&self, running: &AtomicBool, executor: &E, tick: Duration) {
        let enqueuer = WorkerEnqueuer::new(&self.inbox.queue);
        let mut buffer = Vec::new();

        while running.load(Ordering::Acquire) {
            let worked = self
                .inbox
                .run_batch(&mut buffer, |task| executor.execute_on_worker(task, &enqueuer));
            if !worked {
                thread::sleep(tick);
            }
        }
    }

    fn size_approx(&self) -> usize {
        Worker::size_approx(self)
    }
}

/// Unit that executes immediate, delayed and interval tasks
///
/// Each iteration first runs one due delayed task if there is one; only when
/// none is due does it drain the immediate queue. This bounds how late a
/// delayed task can fire behind a stream of immediate work.
pub struct EventLoop<T, Q = TaskQueue<T>> {
    inbox: Inbox<T, Q>,
    delayed: DelayedQueue<T>,
}

/// `EventLoop` whose immediate queue is fed by a single producer thread
pub type SingleProducerEventLoop<T> = EventLoop<T, SingleProducerQueue<T>>;

impl<T, Q: ImmediateQueue<T> + Default> EventLoop<T, Q> {
    /// Create an idle loop with empty queues
    pub fn new() -> Self {
        Self {
            inbox: Inbox::new(),
            delayed: DelayedQueue::new(),
        }
    }

    /// Approximate number of tasks not yet executed, delayed ones included
    pub fn size_approx(&self) -> usize {
        self.inbox.size_approx() + self.delayed.len()
    }

    /// Run `task` once after `delay`; callable from any thread
    pub fn enqueue_delayed(&self, task: T, delay: Duration) -> DelayedTask {
        self.delayed.enqueue_delayed(task, delay)
    }

    /// Run `task` every `delay` until cancelled; callable from any thread
    pub fn enqueue_interval(&self, task: T, delay: Duration) -> DelayedTask
    where
        T: Clone,
    {
        self.delayed.enqueue_interval(task, delay)
    }
}

impl<T, Q: ImmediateQueue<T> + Default> Default for EventLoop<T, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventLoop<T> {
    /// Enqueue a task from any thread
    pub fn enqueue(&self, task: T) {
        self.inbox.push(task);
    }
}

impl<T> EventLoop<T, SingleProducerQueue<T>> {
    /// Enqueue an immediate task from the producer thread
    ///
    /// # Safety
    ///
    /// No two threads may call this concurrently on the same loop.
    pub unsafe fn enqueue_unchecked(&self, task: T) {
        self.inbox.push(task);
    }
}

impl<E, Q> Hosted<E> for EventLoop<E::Task, Q>
where
    E: Executor,
    Q: ImmediateQueue<E::Task> + Default + 'static,
{
    fn run(&self, running: &AtomicBool, executor: &E, tick: Duration) {
        let enqueuer = LoopEnqueuer::new(&self.inbox.queue, &self.delayed);
        let mut buffer = Vec::new();

        while running.load(Ordering::Acquire) {
            if self
                .delayed
                .run_ready(|task| executor.execute_on_loop(task, &enqueuer))
            {
                continue;
            }
            let worked = self
                .inbox
                .run_batch(&mut buffer, |task| executor.execute_on_loop(task, &enqueuer));
            if !worked {
                thread::sleep(tick);
            }
        }
    }

    fn size_approx(&self) -> usize {
        EventLoop::size_approx(self)
    }
}
