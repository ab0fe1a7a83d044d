//! Delayed and interval task heap
//!
//! Entries are ordered by fire instant only. Equal instants compare equal, so
//! their relative order is whatever the heap produces.

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// State shared by a queue entry and every clone of its handle
struct HandleState {
    cancelled: AtomicBool,
    interval: bool,
    delay: Duration,
}

/// Caller-side handle of a delayed or interval task
///
/// Returned by `enqueue_delayed` / `enqueue_interval`. Cloning is cheap; all
/// clones refer to the same scheduled task.
#[derive(Clone)]
pub struct DelayedTask {
    state: Arc<HandleState>,
}

impl DelayedTask {
    fn new(delay: Duration, interval: bool) -> Self {
        Self {
            state: Arc::new(HandleState {
                cancelled: AtomicBool::new(false),
                interval,
                delay,
            }),
        }
    }

    /// Cancel the task, returning whether it was already cancelled
    ///
    /// Safe from any thread at any time, including from inside the task's own
    /// execution. A cancelled task never runs again.
    pub fn cancel(&self) -> bool {
        self.state.cancelled.swap(true, AtomicOrdering::AcqRel)
    }

    /// Whether `cancel()` has been called
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(AtomicOrdering::Acquire)
    }

    /// Whether the task re-arms itself after each firing
    pub fn is_interval(&self) -> bool {
        self.state.interval
    }

    /// Delay (or period, for intervals) the task was scheduled with
    pub fn delay(&self) -> Duration {
        self.state.delay
    }
}

impl fmt::Debug for DelayedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedTask")
            .field("delay", &self.state.delay)
            .field("interval", &self.state.interval)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

enum Payload<T> {
    Once(T),
    /// Each firing runs a duplicate; the stored task is kept for re-arming
    Repeat { task: T, duplicate: fn(&T) -> T },
}

/// Entry in the heap
struct Entry<T> {
    fire_at: Instant,
    payload: Payload<T>,
    handle: DelayedTask,
}

// Reverse ordering for min-heap (earliest fire time first)
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.fire_at.cmp(&self.fire_at)
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at
    }
}

impl<T> Eq for Entry<T> {}

/// A due entry taken off the heap by `DelayedQueue::pop`
///
/// Counts as pending in `DelayedQueue::len` until it is run or dropped.
pub struct Ready<'a, T> {
    queue: &'a DelayedQueue<T>,
    entry: Option<Entry<T>>,
}

impl<'a, T> Ready<'a, T> {
    /// Handle of the popped task
    pub fn handle(&self) -> &DelayedTask {
        &self.entry().handle
    }

    /// Instant the entry was due
    pub fn fire_at(&self) -> Instant {
        self.entry().fire_at
    }

    fn entry(&self) -> &Entry<T> {
        match &self.entry {
            Some(entry) => entry,
            None => unreachable!("entry is only taken by run()"),
        }
    }

    /// Execute the task unless cancelled, then re-arm it if it is an interval
    /// that is still not cancelled
    pub fn run(mut self, execute: impl FnOnce(T)) {
        let Some(Entry {
            payload, handle, ..
        }) = self.entry.take()
        else {
            return;
        };

        match payload {
            Payload::Once(task) => {
                if !handle.is_cancelled() {
                    execute(task);
                }
            }
            Payload::Repeat { task, duplicate } => {
                if !handle.is_cancelled() {
                    execute(duplicate(&task));
                }
                // Re-checked: the task may have cancelled itself while running
                if !handle.is_cancelled() {
                    let fire_at = Instant::now() + handle.delay();
                    self.queue.insert(Entry {
                        fire_at,
                        payload: Payload::Repeat { task, duplicate },
                        handle,
                    });
                }
            }
        }
    }
}

impl<T> Drop for Ready<'_, T> {
    fn drop(&mut self) {
        self.queue.running.fetch_sub(1, AtomicOrdering::AcqRel);
    }
}

/// Thread-safe priority queue of pending delayed and interval tasks
///
/// Enqueueing may happen from any thread; popping is meant for the single
/// thread that owns the loop.
pub struct DelayedQueue<T> {
    heap: Mutex<BinaryHeap<Entry<T>>>,
    /// Entries popped but not yet run or dropped
    running: AtomicUsize,
}

impl<T> DelayedQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            running: AtomicUsize::new(0),
        }
    }

    /// Schedule `task` to run once after `delay`
    pub fn enqueue_delayed(&self, task: T, delay: Duration) -> DelayedTask {
        let handle = DelayedTask::new(delay, false);
        self.insert(Entry {
            fire_at: Instant::now() + delay,
            payload: Payload::Once(task),
            handle: handle.clone(),
        });
        handle
    }

    /// Schedule `task` to run every `delay` until cancelled
    ///
    /// The first firing happens after one `delay`. The next firing is armed
    /// only once the previous execution finished.
    pub fn enqueue_interval(&self, task: T, delay: Duration) -> DelayedTask
    where
        T: Clone,
    {
        let handle = DelayedTask::new(delay, true);
        self.insert(Entry {
            fire_at: Instant::now() + delay,
            payload: Payload::Repeat {
                task,
                duplicate: T::clone,
            },
            handle: handle.clone(),
        });
        handle
    }

    fn insert(&self, entry: Entry<T>) {
        self.heap.lock().push(entry);
    }

    /// Take the earliest entry if it is due
    ///
    /// Returns `None` if the queue is empty or the earliest entry is still in
    /// the future. Never blocks beyond the heap lock.
    pub fn pop(&self) -> Option<Ready<'_, T>> {
        let mut heap = self.heap.lock();
        if heap.peek()?.fire_at > Instant::now() {
            return None;
        }
        let entry = heap.pop()?;
        // Counted under the lock so `len` never misses an entry in hand
        self.running.fetch_add(1, AtomicOrdering::AcqRel);
        Some(Ready {
            queue: self,
            entry: Some(entry),
        })
    }

    /// Pop one due entry and run it through `execute`
    ///
    /// Returns whether an entry was due (even if it turned out cancelled).
    /// The heap lock is released before `execute` is called, so the task may
    /// schedule more delayed work.
    pub fn run_ready(&self, execute: impl FnOnce(T)) -> bool {
        match self.pop() {
            Some(ready) => {
                ready.run(execute);
                true
            }
            None => false,
        }
    }

    /// Number of pending entries
    ///
    /// Includes cancelled entries not yet popped and entries currently being
    /// executed.
    pub fn len(&self) -> usize {
        let heap = self.heap.lock();
        heap.len() + self.running.load(AtomicOrdering::Acquire)
    }

    /// Whether no entries are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for DelayedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::thread;

    fn drain_due(queue: &DelayedQueue<u32>) -> Vec<u32> {
        let seen = RefCell::new(Vec::new());
        while queue.run_ready(|task| seen.borrow_mut().push(task)) {}
        seen.into_inner()
    }

    #[test]
    fn test_queue_creation() {
        let queue: DelayedQueue<u32> = DelayedQueue::new();
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_pop_returns_none_before_due() {
        let queue = DelayedQueue::new();
        queue.enqueue_delayed(1u32, Duration::from_secs(60));

        assert!(queue.pop().is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_zero_delay_is_due_immediately() {
        let queue = DelayedQueue::new();
        queue.enqueue_delayed(7u32, Duration::ZERO);

        assert_eq!(drain_due(&queue), vec![7]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pops_in_fire_time_order() {
        let queue = DelayedQueue::new();
        for ms in [50u32, 10, 40, 20, 30] {
            queue.enqueue_delayed(ms, Duration::from_millis(ms as u64));
        }

        thread::sleep(Duration::from_millis(60));

        assert_eq!(drain_due(&queue), vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let queue = DelayedQueue::new();
        let handle = queue.enqueue_delayed(1u32, Duration::ZERO);

        assert!(!handle.is_cancelled());
        assert!(!handle.cancel());
        assert!(handle.cancel());
        assert!(handle.is_cancelled());

        // Clones observe the same state
        let clone = handle.clone();
        assert!(clone.cancel());
    }

    #[test]
    fn test_cancelled_task_is_popped_but_not_executed() {
        let queue = DelayedQueue::new();
        let handle = queue.enqueue_delayed(1u32, Duration::ZERO);
        handle.cancel();

        let mut executed = false;
        assert!(queue.run_ready(|_| executed = true));
        assert!(!executed);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_interval_is_rearmed() {
        let queue = DelayedQueue::new();
        let handle = queue.enqueue_interval(3u32, Duration::ZERO);
        assert!(handle.is_interval());

        let mut runs = 0;
        for _ in 0..5 {
            assert!(queue.run_ready(|task| {
                assert_eq!(task, 3);
                runs += 1;
            }));
        }

        assert_eq!(runs, 5);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_interval_rearm_advances_fire_time() {
        let queue = DelayedQueue::new();
        queue.enqueue_interval(0u32, Duration::from_millis(2));

        thread::sleep(Duration::from_millis(3));
        let first = queue.pop().unwrap();
        let first_fire = first.fire_at();
        first.run(|_| {});

        thread::sleep(Duration::from_millis(3));
        let second = queue.pop().unwrap();
        assert!(second.fire_at() >= first_fire + Duration::from_millis(2));
    }

    #[test]
    fn test_interval_cancelled_during_execution_is_not_rearmed() {
        let queue = DelayedQueue::new();
        let handle = queue.enqueue_interval(0u32, Duration::ZERO);

        let mut runs = 0;
        queue.run_ready(|_| {
            runs += 1;
            handle.cancel();
        });

        assert_eq!(runs, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_task_may_enqueue_while_running() {
        let queue = DelayedQueue::new();
        queue.enqueue_delayed(1u32, Duration::ZERO);

        // The heap lock must not be held while the task runs
        queue.run_ready(|task| {
            queue.enqueue_delayed(task + 1, Duration::ZERO);
        });

        assert_eq!(drain_due(&queue), vec![2]);
    }

    #[test]
    fn test_concurrent_enqueue() {
        let queue = Arc::new(DelayedQueue::new());
        let producers: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..500u32 {
                        queue.enqueue_delayed(i, Duration::ZERO);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(queue.len(), 4000);
        assert_eq!(drain_due(&queue).len(), 4000);
    }
}
