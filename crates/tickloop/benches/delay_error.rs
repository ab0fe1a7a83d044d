use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tickloop::executors::{job, FnExecutor};
use tickloop::{EventLoopThread, LoopThread};

/// Measures how late a delayed task fires relative to its requested delay
fn bench_delay_error(c: &mut Criterion) {
    let mut group = c.benchmark_group("delay_error");
    group.sample_size(20);

    let thread: EventLoopThread<FnExecutor> = LoopThread::new(FnExecutor);
    if thread.start().is_err() {
        return;
    }

    for millis in [1u64, 5, 10] {
        let delay = Duration::from_millis(millis);
        group.bench_with_input(BenchmarkId::new("lateness", millis), &delay, |b, &delay| {
            b.iter_custom(|iters| {
                let mut lateness = Duration::ZERO;
                for _ in 0..iters {
                    let fired = Arc::new(Mutex::new(None));
                    let sink = fired.clone();
                    let enqueued = Instant::now();
                    thread.enqueue_delayed(job(move || *sink.lock() = Some(Instant::now())), delay);

                    let at = loop {
                        if let Some(at) = *fired.lock() {
                            break at;
                        }
                        std::thread::yield_now();
                    };
                    lateness += (at - enqueued).saturating_sub(delay);
                }
                lateness
            });
        });
    }

    group.finish();
    thread.stop();
}

criterion_group!(benches, bench_delay_error);
criterion_main!(benches);
