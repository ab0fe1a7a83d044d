//! `tickloop-demo objects`

use crate::commands::thread_label;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tickloop::executors::ObjectExecutor;
use tickloop::{EventLoop, LoopConfig, LoopThreadPool};

/// A task payload that cannot be copied or cloned
#[derive(Debug)]
pub struct Parcel {
    pub id: u32,
}

/// Enqueue `count` parcels plus one delayed parcel; returns how many ran
pub fn run(
    config: LoopConfig,
    count: u32,
    duration: Duration,
    quiet: bool,
) -> anyhow::Result<usize> {
    let processed = Arc::new(AtomicUsize::new(0));
    let executor = {
        let processed = processed.clone();
        ObjectExecutor::new(move |parcel: Parcel| {
            processed.fetch_add(1, Ordering::Relaxed);
            if !quiet {
                println!("Processing {} on thread {}", parcel.id, thread_label());
            }
        })
    };

    let pool = LoopThreadPool::<_, EventLoop<Parcel>>::with_config(executor, config);
    pool.start()?;
    let delay = Duration::from_millis(300).min(duration / 2);
    pool.enqueue_delayed(Parcel { id: count * 3 }, delay);
    for id in 1..=count {
        pool.enqueue(Parcel { id });
    }
    thread::sleep(duration);
    pool.stop();

    Ok(processed.load(Ordering::Relaxed))
}

pub fn execute(config: LoopConfig, count: u32, duration_ms: u64) -> anyhow::Result<()> {
    let processed = run(config, count, Duration::from_millis(duration_ms), false)?;
    println!("processed {processed}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_parcel_processed_once() {
        let processed = run(
            LoopConfig::default().with_threads(3),
            50,
            Duration::from_millis(200),
            true,
        )
        .unwrap();
        assert_eq!(processed, 51);
    }
}
