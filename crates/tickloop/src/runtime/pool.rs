//! A fixed set of loop threads sharing one executor and one running flag
//!
//! Enqueues are spread round-robin over the members. The pool owns the
//! running flag: it raises it before starting members and clears it before
//! joining them.

use crate::config::LoopConfig;
use crate::error::Result;
use crate::executor::Executor;
use crate::queue::{DelayedTask, ImmediateQueue};
use crate::runtime::event_loop::{
    EventLoop, Hosted, SingleProducerEventLoop, SingleProducerWorker, Worker,
};
use crate::runtime::thread::LoopThread;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// `N` loop threads behind one round-robin front
pub struct LoopThreadPool<E: Executor, H: Hosted<E>> {
    threads: Vec<LoopThread<E, H>>,
    executor: Arc<E>,
    running: Arc<AtomicBool>,
    /// Round-robin cursor
    next: AtomicUsize,
    /// Serializes start/stop transitions
    transition: Mutex<()>,
    config: LoopConfig,
}

/// Pool of `Worker` threads
pub type WorkerThreadPool<E> = LoopThreadPool<E, Worker<<E as Executor>::Task>>;

/// Pool of `EventLoop` threads
pub type EventLoopThreadPool<E> = LoopThreadPool<E, EventLoop<<E as Executor>::Task>>;

/// Pool of single-producer `Worker` threads
pub type SingleProducerWorkerThreadPool<E> =
    LoopThreadPool<E, SingleProducerWorker<<E as Executor>::Task>>;

/// Pool of single-producer `EventLoop` threads
pub type SingleProducerEventLoopThreadPool<E> =
    LoopThreadPool<E, SingleProducerEventLoop<<E as Executor>::Task>>;

impl<E: Executor, H: Hosted<E>> LoopThreadPool<E, H> {
    /// One thread per CPU, default config
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, LoopConfig::default())
    }

    /// `threads` members; 0 means one per CPU
    pub fn with_threads(threads: usize, executor: E) -> Self {
        Self::with_config(executor, LoopConfig::default().with_threads(threads))
    }

    /// Build a stopped pool from `config`
    pub fn with_config(executor: E, config: LoopConfig) -> Self {
        let executor = Arc::new(executor);
        let running = Arc::new(AtomicBool::new(false));
        let threads = (0..config.resolved_threads())
            .map(|index| {
                LoopThread::embedded(
                    Arc::clone(&running),
                    Arc::clone(&executor),
                    config.clone(),
                    index,
                )
            })
            .collect();

        Self {
            threads,
            executor,
            running,
            next: AtomicUsize::new(0),
            transition: Mutex::new(()),
            config,
        }
    }

    /// Start every member; no-op if already running
    ///
    /// If a member fails to spawn, members already started are stopped again
    /// and the pool is left stopped.
    pub fn start(&self) -> Result<()> {
        let _transition = self.transition.lock();
        if self.running.load(Ordering::Acquire) {
            return Ok(());
        }

        self.running.store(true, Ordering::Release);
        for (index, thread) in self.threads.iter().enumerate() {
            if let Err(err) = thread.start() {
                tracing::warn!(%err, started = index, "pool start failed, rolling back");
                self.running.store(false, Ordering::Release);
                for started in &self.threads[..index] {
                    started.stop();
                }
                return Err(err);
            }
        }

        tracing::debug!(threads = self.threads.len(), "pool started");
        Ok(())
    }

    /// Stop and join every member; no-op if not running
    pub fn stop(&self) {
        let _transition = self.transition.lock();
        if !self.running.load(Ordering::Acquire) {
            return;
        }

        self.running.store(false, Ordering::Release);
        for thread in &self.threads {
            thread.stop();
        }
        tracing::debug!(threads = self.threads.len(), "pool stopped");
    }

    /// Whether the pool is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Approximate number of tasks not yet executed, summed over members
    pub fn size_approx(&self) -> usize {
        self.threads.iter().map(LoopThread::size_approx).sum()
    }

    /// Number of member threads
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Shared executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Configuration the pool was built with
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Pending tasks per member, in member order
    pub fn member_sizes(&self) -> Vec<usize> {
        self.threads.iter().map(LoopThread::size_approx).collect()
    }

    /// Next member, advancing the shared cursor
    fn next_thread(&self) -> &LoopThread<E, H> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        &self.threads[index % self.threads.len()]
    }

    /// Next member, advancing the cursor without contention
    fn next_thread_mut(&mut self) -> &LoopThread<E, H> {
        let next = self.next.get_mut();
        let index = *next;
        *next = index.wrapping_add(1);
        &self.threads[index % self.threads.len()]
    }

    /// Next member for a caller that is the only producer
    fn next_thread_unsynchronized(&self) -> &LoopThread<E, H> {
        let index = self.next.load(Ordering::Relaxed);
        self.next.store(index.wrapping_add(1), Ordering::Relaxed);
        &self.threads[index % self.threads.len()]
    }
}

impl<E: Executor> LoopThreadPool<E, Worker<E::Task>> {
    /// Enqueue a task on the next member; callable from any thread
    pub fn enqueue(&self, task: E::Task) {
        self.next_thread().enqueue(task);
    }
}

impl<E: Executor> LoopThreadPool<E, EventLoop<E::Task>> {
    /// Enqueue a task on the next member; callable from any thread
    pub fn enqueue(&self, task: E::Task) {
        self.next_thread().enqueue(task);
    }
}

impl<E: Executor> LoopThreadPool<E, SingleProducerWorker<E::Task>> {
    /// Enqueue a task on the next member; `&mut self` makes the caller the
    /// only producer
    pub fn enqueue_mut(&mut self, task: E::Task) {
        let thread = self.next_thread_mut();
        // SAFETY: members are only reachable through the pool, and the
        // exclusive borrow rules out any concurrent producer.
        unsafe { thread.enqueue_unchecked(task) }
    }

    /// Enqueue a task on the next member through a shared reference
    ///
    /// # Safety
    ///
    /// No two threads may call `enqueue_unchecked` concurrently on the same
    /// pool.
    pub unsafe fn enqueue_unchecked(&self, task: E::Task) {
        self.next_thread_unsynchronized().enqueue_unchecked(task);
    }
}

impl<E: Executor> LoopThreadPool<E, SingleProducerEventLoop<E::Task>> {
    /// Enqueue a task on the next member; `&mut self` makes the caller the
    /// only producer
    pub fn enqueue_mut(&mut self, task: E::Task) {
        let thread = self.next_thread_mut();
        // SAFETY: members are only reachable through the pool, and the
        // exclusive borrow rules out any concurrent producer.
        unsafe { thread.enqueue_unchecked(task) }
    }

    /// Enqueue a task on the next member through a shared reference
    ///
    /// # Safety
    ///
    /// No two threads may call `enqueue_unchecked` concurrently on the same
    /// pool.
    pub unsafe fn enqueue_unchecked(&self, task: E::Task) {
        self.next_thread_unsynchronized().enqueue_unchecked(task);
    }
}

impl<E, Q> LoopThreadPool<E, EventLoop<E::Task, Q>>
where
    E: Executor,
    Q: ImmediateQueue<E::Task> + Default + 'static,
{
    /// Run `task` once after `delay` on the next member
    pub fn enqueue_delayed(&self, task: E::Task, delay: Duration) -> DelayedTask {
        self.next_thread().enqueue_delayed(task, delay)
    }

    /// Run `task` every `delay` on the next member until cancelled
    pub fn enqueue_interval(&self, task: E::Task, delay: Duration) -> DelayedTask
    where
        E::Task: Clone,
    {
        self.next_thread().enqueue_interval(task, delay)
    }
}

impl<E: Executor, H: Hosted<E>> Drop for LoopThreadPool<E, H> {
    fn drop(&mut self) {
        self.stop();
    }
}
