use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tickloop::{Executor, LoopThreadPool, SingleProducerWorker, Worker};

/// Counts tasks; the payload itself is ignored
#[derive(Default)]
struct Tally {
    executed: AtomicUsize,
}

impl Executor for Tally {
    type Task = u64;

    fn execute(&self, task: u64) {
        black_box(task);
        self.executed.fetch_add(1, Ordering::Relaxed);
    }
}

const TASKS: u64 = 100_000;

fn wait_for_all(executor: &Tally, target: usize) {
    while executor.executed.load(Ordering::Relaxed) < target {
        thread::yield_now();
    }
}

fn bench_multi_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_producer");
    group.throughput(Throughput::Elements(TASKS));

    for threads in [1usize, 2, 4] {
        let pool = LoopThreadPool::<Tally, Worker<u64>>::with_threads(threads, Tally::default());
        if pool.start().is_err() {
            continue;
        }

        group.bench_with_input(BenchmarkId::new("workers", threads), &threads, |b, _| {
            b.iter(|| {
                let target = pool.executor().executed.load(Ordering::Relaxed) + TASKS as usize;
                for task in 0..TASKS {
                    pool.enqueue(task);
                }
                wait_for_all(pool.executor(), target);
            });
        });
        pool.stop();
    }

    group.finish();
}

fn bench_single_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_producer");
    group.throughput(Throughput::Elements(TASKS));

    for threads in [1usize, 2, 4] {
        let mut pool =
            LoopThreadPool::<Tally, SingleProducerWorker<u64>>::with_threads(threads, Tally::default());
        if pool.start().is_err() {
            continue;
        }

        group.bench_with_input(BenchmarkId::new("workers", threads), &threads, |b, _| {
            b.iter(|| {
                let target = pool.executor().executed.load(Ordering::Relaxed) + TASKS as usize;
                for task in 0..TASKS {
                    pool.enqueue_mut(task);
                }
                wait_for_all(pool.executor(), target);
            });
        });
        pool.stop();
    }

    group.finish();
}

criterion_group!(benches, bench_multi_producer, bench_single_producer);
criterion_main!(benches);
