//! Shared helpers for the integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tickloop::executors::{job, Job};

/// Route `tracing` output through the test harness; `RUST_LOG` filters it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll `size` until it reports zero or five seconds pass
pub fn wait_until_drained(size: impl Fn() -> usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while size() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
}

/// Poll `condition` until it holds or five seconds pass
pub fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

/// Job that bumps `counter` once per execution
pub fn counting_job(counter: &Arc<AtomicUsize>) -> Job {
    let counter = counter.clone();
    job(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    })
}

/// Job that records the instant of every execution
pub fn timestamp_job(stamps: &Arc<Mutex<Vec<Instant>>>) -> Job {
    let stamps = stamps.clone();
    job(move || stamps.lock().push(Instant::now()))
}
