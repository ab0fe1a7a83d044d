//! `tickloop-demo reenqueue`

use crate::commands::thread_label;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tickloop::{
    EventLoopThread, EventLoopThreadPool, Executor, LoopConfig, LoopEnqueuer, LoopThread,
    LoopThreadPool,
};

/// Seeds at or below `threshold` schedule a delayed follow-up `offset + seed`
pub struct Reenqueue {
    threshold: u32,
    offset: u32,
    delay: Duration,
    processed: AtomicUsize,
    quiet: bool,
}

impl Reenqueue {
    pub fn new(threshold: u32, delay: Duration) -> Self {
        Self {
            threshold,
            offset: threshold.saturating_mul(3),
            delay,
            processed: AtomicUsize::new(0),
            quiet: false,
        }
    }

    /// Number of tasks executed so far
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }
}

impl Executor for Reenqueue {
    type Task = u32;

    fn execute(&self, task: u32) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if !self.quiet {
            println!("Processing {} on thread {}", task, thread_label());
        }
    }

    fn execute_on_loop(&self, task: u32, enqueuer: &LoopEnqueuer<'_, u32>) {
        if task <= self.threshold {
            enqueuer.enqueue_delayed(self.offset + task, self.delay);
        }
        self.execute(task);
    }
}

/// Seed `tasks` immediates on one loop thread and let it run for `duration`
pub fn run_on_thread(
    config: LoopConfig,
    executor: Reenqueue,
    tasks: u32,
    duration: Duration,
) -> anyhow::Result<EventLoopThread<Reenqueue>> {
    let event_loop: EventLoopThread<Reenqueue> = LoopThread::with_config(executor, config);
    event_loop.start()?;
    for task in 1..=tasks {
        event_loop.enqueue(task);
    }
    thread::sleep(duration);
    event_loop.stop();
    Ok(event_loop)
}

/// Same scenario spread over a pool, plus one delayed seed
pub fn run_on_pool(
    config: LoopConfig,
    executor: Reenqueue,
    tasks: u32,
    duration: Duration,
) -> anyhow::Result<EventLoopThreadPool<Reenqueue>> {
    let delay = executor.delay;
    let offset = executor.offset;
    let pool: EventLoopThreadPool<Reenqueue> = LoopThreadPool::with_config(executor, config);
    pool.start()?;
    pool.enqueue_delayed(offset, delay);
    for task in 1..=tasks {
        pool.enqueue(task);
    }
    thread::sleep(duration);
    pool.stop();
    Ok(pool)
}

pub fn execute(
    config: LoopConfig,
    tasks: u32,
    delay_ms: u64,
    duration_ms: u64,
) -> anyhow::Result<()> {
    let delay = Duration::from_millis(delay_ms);
    let duration = Duration::from_millis(duration_ms);

    println!("Thread:");
    let event_loop = run_on_thread(config.clone(), Reenqueue::new(tasks, delay), tasks, duration)?;
    println!("processed {}", event_loop.executor().processed());

    println!("Pool:");
    let pool = run_on_pool(config, Reenqueue::new(tasks, delay), tasks, duration)?;
    println!(
        "processed {} on {} threads",
        pool.executor().processed(),
        pool.thread_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(threshold: u32, delay: Duration) -> Reenqueue {
        Reenqueue {
            quiet: true,
            ..Reenqueue::new(threshold, delay)
        }
    }

    #[test]
    fn test_thread_runs_seeds_and_follow_ups() {
        let event_loop = run_on_thread(
            LoopConfig::default(),
            quiet(20, Duration::from_millis(10)),
            20,
            Duration::from_millis(200),
        )
        .unwrap();

        assert_eq!(event_loop.executor().processed(), 40);
        assert_eq!(event_loop.size_approx(), 0);
    }

    #[test]
    fn test_pool_runs_seeds_follow_ups_and_delayed_seed() {
        let pool = run_on_pool(
            LoopConfig::default().with_threads(2),
            quiet(20, Duration::from_millis(10)),
            20,
            Duration::from_millis(200),
        )
        .unwrap();

        assert_eq!(pool.executor().processed(), 41);
        assert_eq!(pool.size_approx(), 0);
    }
}
