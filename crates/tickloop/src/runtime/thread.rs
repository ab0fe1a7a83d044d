//! A single OS thread hosting one unit
//!
//! `start()` and `stop()` may be called concurrently from any number of
//! threads. Each transition runs while holding the join-handle lock, so at
//! most one transition is in flight and late callers wait for it, then see a
//! no-op. `start()` only returns once the hosted loop is live, and `stop()`
//! only returns once the hosted thread has exited.

use crate::config::LoopConfig;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::queue::{DelayedTask, ImmediateQueue};
use crate::runtime::event_loop::{
    EventLoop, Hosted, SingleProducerEventLoop, SingleProducerWorker, Worker,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Who owns the running flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    /// The thread owns its flag and executor
    Standalone,
    /// A pool owns the shared flag and executor; the pool raises and clears
    /// the flag, the member only spawns and joins
    Embedded,
}

/// One OS thread hosting a `Worker` or `EventLoop`
pub struct LoopThread<E: Executor, H: Hosted<E>> {
    unit: Arc<H>,
    executor: Arc<E>,
    running: Arc<AtomicBool>,
    ownership: Ownership,
    config: LoopConfig,
    /// Member index, used in the thread name
    index: usize,
    /// Transition lock; holds the hosted thread while it is attached
    thread: Mutex<Option<JoinHandle<()>>>,
}

/// Thread hosting a `Worker`
pub type WorkerThread<E> = LoopThread<E, Worker<<E as Executor>::Task>>;

/// Thread hosting an `EventLoop`
pub type EventLoopThread<E> = LoopThread<E, EventLoop<<E as Executor>::Task>>;

/// Thread hosting a `Worker` fed by a single producer
pub type SingleProducerWorkerThread<E> = LoopThread<E, SingleProducerWorker<<E as Executor>::Task>>;

/// Thread hosting an `EventLoop` whose immediate queue is fed by a single producer
pub type SingleProducerEventLoopThread<E> =
    LoopThread<E, SingleProducerEventLoop<<E as Executor>::Task>>;

impl<E: Executor, H: Hosted<E>> LoopThread<E, H> {
    /// Create a stopped thread owning `executor`, with the default config
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, LoopConfig::default())
    }

    /// Create a stopped thread owning `executor`
    pub fn with_config(executor: E, config: LoopConfig) -> Self {
        Self::build(
            Arc::new(executor),
            Arc::new(AtomicBool::new(false)),
            Ownership::Standalone,
            config,
            0,
        )
    }

    /// Create a pool member sharing the pool's flag and executor
    pub(crate) fn embedded(
        running: Arc<AtomicBool>,
        executor: Arc<E>,
        config: LoopConfig,
        index: usize,
    ) -> Self {
        Self::build(executor, running, Ownership::Embedded, config, index)
    }

    fn build(
        executor: Arc<E>,
        running: Arc<AtomicBool>,
        ownership: Ownership,
        config: LoopConfig,
        index: usize,
    ) -> Self {
        Self {
            unit: Arc::new(H::default()),
            executor,
            running,
            ownership,
            config,
            index,
            thread: Mutex::new(None),
        }
    }

    /// Spawn the hosted thread unless it is already running
    ///
    /// Returns once the hosted loop is live. The only failure is the OS
    /// refusing to create the thread; the lifecycle is left stopped and may
    /// be started again.
    pub fn start(&self) -> Result<()> {
        let mut slot = self.thread.lock();

        // Standalone threads acknowledge through the shared flag itself;
        // pool members use a private flag because the pool already raised it
        let ack = match self.ownership {
            Ownership::Standalone => {
                if self.running.load(Ordering::Acquire) {
                    return Ok(());
                }
                Arc::clone(&self.running)
            }
            Ownership::Embedded => {
                if slot.is_some() {
                    return Ok(());
                }
                Arc::new(AtomicBool::new(false))
            }
        };

        let name = self.config.thread_name_for(self.index);
        let handle = {
            let ack = Arc::clone(&ack);
            let unit = Arc::clone(&self.unit);
            let executor = Arc::clone(&self.executor);
            let running = Arc::clone(&self.running);
            let tick = self.config.tick;

            thread::Builder::new()
                .name(name.clone())
                .spawn(move || {
                    ack.store(true, Ordering::Release);
                    tracing::trace!("hosted loop entered");
                    unit.run(&running, &executor, tick);
                    tracing::trace!("hosted loop exited");
                })
                .map_err(|source| Error::Spawn {
                    name: name.clone(),
                    source,
                })?
        };

        while !ack.load(Ordering::Acquire) {
            thread::yield_now();
        }
        *slot = Some(handle);

        tracing::debug!(thread = %name, "loop thread started");
        Ok(())
    }

    /// Stop the hosted loop and join its thread
    ///
    /// No-op if nothing is running. After it returns no further task runs on
    /// this thread.
    pub fn stop(&self) {
        let mut slot = self.thread.lock();
        if self.ownership == Ownership::Standalone {
            self.running.store(false, Ordering::Release);
        }

        // Joinability cannot change under us: every transition holds `slot`
        if let Some(handle) = slot.take() {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            match handle.join() {
                Ok(()) => tracing::debug!(thread = %name, "loop thread stopped"),
                Err(_) => tracing::error!(thread = %name, "loop thread panicked"),
            }
        }
    }

    /// Whether the hosted loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Approximate number of tasks not yet executed; advisory only
    pub fn size_approx(&self) -> usize {
        self.unit.size_approx()
    }

    /// The executor shared with the hosted thread
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Configuration this thread was built with
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }
}

impl<E: Executor> LoopThread<E, Worker<E::Task>> {
    /// Enqueue a task from any thread
    pub fn enqueue(&self, task: E::Task) {
        self.unit.enqueue(task);
    }
}

impl<E: Executor> LoopThread<E, EventLoop<E::Task>> {
    /// Enqueue a task from any thread
    pub fn enqueue(&self, task: E::Task) {
        self.unit.enqueue(task);
    }
}

impl<E: Executor> LoopThread<E, SingleProducerWorker<E::Task>> {
    /// Enqueue a task; `&mut self` makes the caller the only producer
    pub fn enqueue_mut(&mut self, task: E::Task) {
        // SAFETY: the producer end is only reachable through this wrapper,
        // and `&mut self` rules out any concurrent caller.
        unsafe { self.unit.enqueue_unchecked(task) }
    }

    /// Enqueue a task through a shared reference
    ///
    /// # Safety
    ///
    /// No two threads may call `enqueue_unchecked` concurrently on the same
    /// thread wrapper.
    pub unsafe fn enqueue_unchecked(&self, task: E::Task) {
        self.unit.enqueue_unchecked(task);
    }
}

impl<E: Executor> LoopThread<E, SingleProducerEventLoop<E::Task>> {
    /// Enqueue a task; `&mut self` makes the caller the only producer
    pub fn enqueue_mut(&mut self, task: E::Task) {
        // SAFETY: the producer end is only reachable through this wrapper,
        // and `&mut self` rules out any concurrent caller.
        unsafe { self.unit.enqueue_unchecked(task) }
    }

    /// Enqueue a task through a shared reference
    ///
    /// # Safety
    ///
    /// No two threads may call `enqueue_unchecked` concurrently on the same
    /// thread wrapper.
    pub unsafe fn enqueue_unchecked(&self, task: E::Task) {
        self.unit.enqueue_unchecked(task);
    }
}

impl<E, Q> LoopThread<E, EventLoop<E::Task, Q>>
where
    E: Executor,
    Q: ImmediateQueue<E::Task> + Default + 'static,
{
    /// Run `task` once after `delay`; callable from any thread
    pub fn enqueue_delayed(&self, task: E::Task, delay: Duration) -> DelayedTask {
        self.unit.enqueue_delayed(task, delay)
    }

    /// Run `task` every `delay` until cancelled; callable from any thread
    pub fn enqueue_interval(&self, task: E::Task, delay: Duration) -> DelayedTask
    where
        E::Task: Clone,
    {
        self.unit.enqueue_interval(task, delay)
    }
}

impl<E: Executor, H: Hosted<E>> Drop for LoopThread<E, H> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::{job, FnExecutor};
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn counter_job(counter: &Arc<AtomicUsize>) -> crate::executors::Job {
        let counter = counter.clone();
        job(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
    }

    fn wait_for(condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_thread_creation() {
        let thread: EventLoopThread<FnExecutor> = LoopThread::new(FnExecutor);
        assert!(!thread.is_running());
        assert_eq!(thread.size_approx(), 0);
        assert_eq!(thread.config().thread_name, "tickloop");
    }

    #[test]
    fn test_thread_does_not_run_before_start() {
        let thread: EventLoopThread<FnExecutor> = LoopThread::new(FnExecutor);
        let counter = Arc::new(AtomicUsize::new(0));
        thread.enqueue(counter_job(&counter));

        thread::sleep(Duration::from_millis(10));

        assert_eq!(counter.load(Ordering::Relaxed), 0);
        assert_eq!(thread.size_approx(), 1);
    }

    #[test]
    fn test_thread_start_stop() {
        let thread: WorkerThread<FnExecutor> = LoopThread::new(FnExecutor);

        thread.start().unwrap();
        assert!(thread.is_running());

        thread.stop();
        assert!(!thread.is_running());

        // Restartable
        thread.start().unwrap();
        assert!(thread.is_running());
        thread.stop();
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let thread: WorkerThread<FnExecutor> = LoopThread::new(FnExecutor);
        thread.stop();
        thread.stop();
        assert!(!thread.is_running());
    }

    #[test]
    fn test_thread_runs_on_named_thread() {
        let thread: WorkerThread<FnExecutor> =
            LoopThread::with_config(FnExecutor, LoopConfig::new().with_thread_name("unit"));
        let name = Arc::new(Mutex::new(None));
        let sink = name.clone();
        thread.enqueue(job(move || {
            *sink.lock() = thread::current().name().map(str::to_owned);
        }));

        thread.start().unwrap();
        wait_for(|| name.lock().is_some());
        thread.stop();

        assert_eq!(name.lock().as_deref(), Some("unit-0"));
    }

    #[test]
    fn test_stop_waits_for_thread_exit() {
        let thread: WorkerThread<FnExecutor> = LoopThread::new(FnExecutor);
        let counter = Arc::new(AtomicUsize::new(0));
        thread.start().unwrap();
        thread.stop();

        thread.enqueue(counter_job(&counter));
        thread::sleep(Duration::from_millis(10));

        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_single_producer_enqueue_mut() {
        let mut thread: SingleProducerWorkerThread<FnExecutor> = LoopThread::new(FnExecutor);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            thread.enqueue_mut(counter_job(&counter));
        }

        thread.start().unwrap();
        wait_for(|| counter.load(Ordering::Relaxed) == 100);
        thread.stop();

        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn test_drop_joins_running_thread() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let thread: EventLoopThread<FnExecutor> = LoopThread::new(FnExecutor);
            thread.start().unwrap();
            thread.enqueue_interval(counter_job(&counter), Duration::from_millis(1));
            thread::sleep(Duration::from_millis(10));
        }

        let after_drop = counter.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(counter.load(Ordering::Relaxed), after_drop);
    }

    #[test]
    fn test_panicking_task_is_reported_on_stop() {
        let thread: WorkerThread<FnExecutor> = LoopThread::new(FnExecutor);
        thread.start().unwrap();
        thread.enqueue(job(|| panic!("task failure")));
        thread::sleep(Duration::from_millis(20));

        // Flag still set: the loop died without a stop request
        assert!(thread.is_running());
        thread.stop();
        assert!(!thread.is_running());
    }
}
